//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::retrieval::DEFAULT_MAX_RESULTS;
use crate::seed::DEFAULT_SEED_COLLECTION;

/// docsearch: semantic document search exposed as MCP tools.
///
/// Serves a persistent, collection-partitioned document store to agents
/// over MCP, and offers direct and client-side commands against it.
#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the document store database file.
    ///
    /// Defaults to `.docsearch/docsearch.db` in the current directory.
    #[arg(short, long, env = "DOCSEARCH_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP tool server.
    #[command(subcommand)]
    Serve(ServeCommands),

    /// Search a collection directly.
    #[command(after_help = r#"Examples:
  docsearch search "how do bees communicate"            # Search the "default" collection
  docsearch search "protocol" -c documents -n 3        # Top 3 from "documents"
  docsearch --format json search "pizza" | jq '.results[].id'
"#)]
    Search {
        /// Search query text.
        query: String,

        /// Collection to search.
        #[arg(short, long, default_value = crate::retrieval::DEFAULT_SEARCH_COLLECTION)]
        collection: String,

        /// Maximum number of results (1-100).
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },

    /// List collections with document counts.
    List,

    /// Add a document.
    #[command(after_help = r#"Examples:
  docsearch add doc1 "The Model Context Protocol connects agents and tools"
  docsearch add notes --file notes.md -c personal -m author=me -m year=2024
"#)]
    Add {
        /// Document id, unique within the collection.
        id: String,

        /// Document text.
        #[arg(required_unless_present = "file")]
        content: Option<String>,

        /// Read the document text from a file.
        #[arg(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,

        /// Collection to add to.
        #[arg(short, long, default_value = crate::retrieval::DEFAULT_WRITE_COLLECTION)]
        collection: String,

        /// Metadata entry as `key=value` (repeatable).
        #[arg(short, long = "meta", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
    },

    /// Show one document in full.
    Get {
        /// Document id.
        id: String,

        /// Collection holding the document.
        #[arg(short, long, default_value = crate::retrieval::DEFAULT_WRITE_COLLECTION)]
        collection: String,
    },

    /// Delete one document.
    Delete {
        /// Document id.
        id: String,

        /// Collection holding the document.
        #[arg(short, long, default_value = crate::retrieval::DEFAULT_WRITE_COLLECTION)]
        collection: String,
    },

    /// Load the built-in sample corpus.
    Seed {
        /// Collection to seed.
        #[arg(short, long, default_value = DEFAULT_SEED_COLLECTION)]
        collection: String,
    },

    /// Call a tool server through the session bridge.
    ///
    /// Spawns `docsearch serve stdio` (or `DOCSEARCH_SERVER_COMMAND`, or
    /// connects to `DOCSEARCH_SERVER_URL`) and prints the structured reply.
    #[command(subcommand)]
    Client(ClientCommands),
}

/// MCP server transports.
#[derive(Subcommand, Debug)]
pub enum ServeCommands {
    /// Serve over stdio.
    ///
    /// Reads JSON-RPC messages from stdin, writes responses to stdout.
    #[command(after_help = r#"Examples:
  docsearch serve stdio
  docsearch --db-path ./store.db serve stdio
"#)]
    Stdio,

    /// Serve over streamable HTTP at `/mcp`.
    #[cfg(feature = "http")]
    #[command(after_help = r#"Examples:
  docsearch serve http                          # Listen on 127.0.0.1:8000
  docsearch serve http --host 0.0.0.0 --port 9000
"#)]
    Http {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on.
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
}

/// Client-side wrapper calls.
#[derive(Subcommand, Debug)]
pub enum ClientCommands {
    /// Call `search_documents`.
    Search {
        /// Search query text.
        query: String,

        /// Maximum number of results.
        #[arg(short = 'n', long)]
        n_results: Option<usize>,

        /// Collection to search (defaults to "documents").
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Call `list_collections`.
    List,

    /// Call `add_document`.
    Add {
        /// Document id.
        document_name: String,

        /// Document text.
        content: String,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}

/// Parses a `key=value` pair.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

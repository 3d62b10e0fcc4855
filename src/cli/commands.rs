//! CLI command implementations.
//!
//! Every command returns its rendered output; `main` writes it to stdout.

use std::fmt::Write as FmtWrite;
use std::path::Path;

use crate::bridge::{BridgeConfig, ToolResponse, ToolSession};
use crate::cli::output::{OutputFormat, line};
use crate::cli::parser::{ClientCommands, Cli, Commands, ServeCommands};
use crate::core::{Metadata, MetadataValue};
use crate::embedding::{Embedder, create_embedder};
use crate::error::{CommandError, Result};
use crate::retrieval::{self, DocumentLookup, SearchOutcome, WriteOutcome};
use crate::seed::{self, SUGGESTED_QUERIES};
use crate::storage::{SqliteStorage, Storage};

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let db_path = cli.get_db_path();

    match &cli.command {
        Commands::Serve(cmd) => cmd_serve(cmd, &db_path),
        Commands::Search {
            query,
            collection,
            max_results,
        } => cmd_search(
            &open_store(&db_path)?,
            query,
            collection,
            *max_results,
            format,
        ),
        Commands::List => cmd_list(&open_store(&db_path)?, format),
        Commands::Add {
            id,
            content,
            file,
            collection,
            meta,
        } => {
            let content = match (content, file) {
                (Some(content), _) => content.clone(),
                (None, Some(path)) => read_content(path)?,
                (None, None) => {
                    return Err(CommandError::InvalidArgument(
                        "either content or --file is required".to_string(),
                    )
                    .into());
                }
            };
            cmd_add(
                &mut open_store(&db_path)?,
                collection,
                id,
                &content,
                parse_metadata(meta),
                format,
            )
        }
        Commands::Get { id, collection } => {
            cmd_get(&open_store(&db_path)?, collection, id, format)
        }
        Commands::Delete { id, collection } => {
            cmd_delete(&mut open_store(&db_path)?, collection, id, format)
        }
        Commands::Seed { collection } => cmd_seed(&mut open_store(&db_path)?, collection, format),
        Commands::Client(cmd) => cmd_client(cmd, &db_path, format),
    }
}

/// Opens the store at `db_path`, creating the file and schema if needed.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the
/// embedder cannot be loaded, or the database cannot be opened.
pub fn open_store(db_path: &Path) -> Result<SqliteStorage> {
    open_store_with(db_path, create_embedder()?)
}

fn open_store_with(db_path: &Path, embedder: Box<dyn Embedder>) -> Result<SqliteStorage> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| CommandError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let mut storage = SqliteStorage::open(db_path, embedder)?;
    storage.init()?;
    Ok(storage)
}

fn read_content(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        CommandError::Io {
            path: path.display().to_string(),
            source,
        }
        .into()
    })
}

/// Converts `key=value` pairs into metadata.
///
/// Values that parse as JSON scalars keep their type (`year=2024` is an
/// integer, `draft=true` a boolean); everything else is a string.
fn parse_metadata(pairs: &[(String, String)]) -> Metadata {
    pairs
        .iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(raw)
                .ok()
                .and_then(|json| MetadataValue::from_json(&json))
                .unwrap_or_else(|| MetadataValue::from(raw.as_str()));
            (key.clone(), value)
        })
        .collect()
}

fn write_result(outcome: &WriteOutcome, format: OutputFormat) -> Result<String> {
    match (outcome, format) {
        (WriteOutcome::Error { error_message }, _) => {
            Err(CommandError::ExecutionFailed(error_message.clone()).into())
        }
        (WriteOutcome::Success { .. }, OutputFormat::Json) => Ok(format.to_json(outcome)),
        (WriteOutcome::Success { message }, OutputFormat::Text) => Ok(line(message.as_str())),
    }
}

// ==================== Server ====================

fn cmd_serve(cmd: &ServeCommands, db_path: &Path) -> Result<String> {
    use crate::mcp::{DocSearchMcpServer, serve_stdio};

    let server = DocSearchMcpServer::new(open_store(db_path)?);

    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    rt.block_on(async {
        match cmd {
            ServeCommands::Stdio => serve_stdio(server).await,
            #[cfg(feature = "http")]
            ServeCommands::Http { host, port } => crate::mcp::serve_http(server, host, *port).await,
        }
    })
    .map_err(|e| CommandError::ExecutionFailed(format!("MCP server error: {e}")))?;

    Ok(String::new())
}

// ==================== Direct store access ====================

fn cmd_search<S: Storage + ?Sized>(
    storage: &S,
    query: &str,
    collection: &str,
    max_results: usize,
    format: OutputFormat,
) -> Result<String> {
    let outcome = retrieval::search(storage, query, collection, max_results);

    if let SearchOutcome::Failed { message } = &outcome {
        return Err(CommandError::ExecutionFailed(message.clone()).into());
    }
    match format {
        OutputFormat::Text => Ok(line(outcome.to_string())),
        OutputFormat::Json => Ok(format.to_json(&outcome)),
    }
}

fn cmd_list<S: Storage + ?Sized>(storage: &S, format: OutputFormat) -> Result<String> {
    let listing = retrieval::list_collections(storage);

    if let retrieval::CollectionListing::Failed { message } = &listing {
        return Err(CommandError::ExecutionFailed(message.clone()).into());
    }
    match format {
        OutputFormat::Text => Ok(line(listing.to_string())),
        OutputFormat::Json => Ok(format.to_json(&listing)),
    }
}

fn cmd_add<S: Storage + ?Sized>(
    storage: &mut S,
    collection: &str,
    id: &str,
    content: &str,
    metadata: Metadata,
    format: OutputFormat,
) -> Result<String> {
    let outcome = retrieval::add_document(storage, collection, id, content, metadata);
    write_result(&outcome, format)
}

fn cmd_get<S: Storage + ?Sized>(
    storage: &S,
    collection: &str,
    id: &str,
    format: OutputFormat,
) -> Result<String> {
    let lookup = retrieval::get_document(storage, collection, id);

    match (&lookup, format) {
        (DocumentLookup::Error { error_message }, _) => {
            Err(CommandError::ExecutionFailed(error_message.clone()).into())
        }
        (DocumentLookup::Success { .. }, OutputFormat::Json) => Ok(format.to_json(&lookup)),
        (DocumentLookup::Success { .. }, OutputFormat::Text) => Ok(line(lookup.to_string())),
    }
}

fn cmd_delete<S: Storage + ?Sized>(
    storage: &mut S,
    collection: &str,
    id: &str,
    format: OutputFormat,
) -> Result<String> {
    let outcome = retrieval::delete_document(storage, collection, id);
    write_result(&outcome, format)
}

fn cmd_seed<S: Storage + ?Sized>(
    storage: &mut S,
    collection: &str,
    format: OutputFormat,
) -> Result<String> {
    let outcome = seed::seed(storage, collection);

    match (&outcome, format) {
        (WriteOutcome::Success { message }, OutputFormat::Text) => {
            let mut output = line(message.as_str());
            output.push_str("\nTry searching for:\n");
            for query in SUGGESTED_QUERIES {
                let _ = writeln!(output, "  - {query}");
            }
            Ok(output)
        }
        _ => write_result(&outcome, format),
    }
}

// ==================== Bridge client ====================

fn cmd_client(cmd: &ClientCommands, db_path: &Path, format: OutputFormat) -> Result<String> {
    let config = BridgeConfig::builder().db_path(db_path).from_env().build();
    let session = ToolSession::new(config)?;

    let (response, field) = match cmd {
        ClientCommands::Search {
            query,
            n_results,
            collection,
        } => (
            session.search_documents(query, *n_results, collection.as_deref()),
            "results",
        ),
        ClientCommands::List => (session.list_collections(), "collections"),
        ClientCommands::Add {
            document_name,
            content,
        } => (session.add_document(document_name, content), "message"),
    };
    session.cleanup();

    render_response(&response, field, format)
}

fn render_response(response: &ToolResponse, field: &str, format: OutputFormat) -> Result<String> {
    if !response.is_success() {
        let message = response.error_message().unwrap_or("tool call failed");
        return Err(CommandError::ExecutionFailed(message.to_string()).into());
    }
    match format {
        OutputFormat::Json => Ok(format.to_json(response)),
        OutputFormat::Text => Ok(response.text(field).map(line).unwrap_or_default()),
    }
}

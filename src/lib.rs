//! # docsearch
//!
//! Semantic document search over a persistent, collection-partitioned
//! vector store, exposed to AI agents as MCP tools.
//!
//! ## Components
//!
//! - [`storage`]: `SQLite` document store with embedding-based queries
//! - [`retrieval`]: search, listing and write operations with report formatting
//! - [`mcp`]: the MCP tool server (stdio and streamable HTTP)
//! - [`bridge`]: blocking client session that agent code calls as plain functions
//! - [`seed`]: a small sample corpus
//!
//! ## Example
//!
//! ```no_run
//! use docsearch::bridge::{BridgeConfig, ToolSession};
//!
//! let session = ToolSession::new(BridgeConfig::from_env())?;
//! let response = session.search_documents("how do bees communicate", Some(3), None);
//! println!("{}", response.text("results").unwrap_or_default());
//! session.cleanup();
//! # Ok::<(), docsearch::error::BridgeError>(())
//! ```

pub mod bridge;
pub mod cli;
pub mod core;
pub mod embedding;
pub mod error;
pub mod mcp;
pub mod retrieval;
pub mod seed;
pub mod storage;

pub use bridge::{BridgeConfig, ToolResponse, ToolSession};
pub use core::{CollectionSummary, Document, Metadata, MetadataValue, SearchResult};
pub use embedding::{Embedder, HashEmbedder, create_embedder};
pub use error::{BridgeError, Error, Result, StorageError};
pub use mcp::DocSearchMcpServer;
pub use retrieval::{CollectionListing, DocumentLookup, SearchOutcome, WriteOutcome};
pub use storage::{SqliteStorage, Storage};

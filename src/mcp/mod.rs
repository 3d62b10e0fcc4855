//! MCP (Model Context Protocol) server for docsearch.
//!
//! Exposes the retrieval engine as MCP tools, plus a static help resource at
//! [`HELP_URI`].
//!
//! # Architecture
//!
//! ```text
//! MCP Client (agent or ToolSession)
//!   ↓ search_documents(query, collection, max_results)
//! DocSearchMcpServer
//!   ↓ spawn_blocking + store mutex (one call at a time)
//! retrieval::search()
//!   ↓ Storage::query()
//! SearchOutcome → text report → MCP Client
//! ```

mod help;
pub mod params;
pub mod server;
pub mod transport;

pub use help::{HELP_TEXT, HELP_URI};
pub use params::{AddDocumentParams, BatchDocument, BatchParams, DocumentRefParams, SearchParams};
pub use server::{DocSearchMcpServer, SharedStorage};
#[cfg(feature = "http")]
pub use transport::{HTTP_ENDPOINT, http_router, serve_http};
pub use transport::serve_stdio;

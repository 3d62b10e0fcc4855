//! Session bridge: blocking client access to the tool server.
//!
//! Agent code gets plain function calls returning [`ToolResponse`] mappings;
//! [`ToolSession`] hides the connection lifecycle and the async transport.
//!
//! # Architecture
//!
//! ```text
//! AgentTools::execute(ToolCall)        (static name → handler table)
//!   ↓
//! ToolSession::search_documents()      (blocking wrapper)
//!   ↓ invoke() on the session runtime
//! acquire(): connect once, verify tools
//!   ↓
//! ToolClient::call ── Connector ── child process │ in-process duplex │ HTTP
//! ```

pub mod config;
pub mod connector;
pub mod response;
pub mod session;
pub mod tools;

pub use config::{BridgeConfig, BridgeConfigBuilder, ServerTarget};
#[cfg(feature = "http")]
pub use connector::HttpConnector;
pub use connector::{
    ChildProcessConnector, Connector, DuplexConnector, RmcpToolClient, ToolClient, ToolOutput,
    connector_for,
};
pub use response::{Status, ToolResponse};
pub use session::{REQUIRED_TOOLS, ToolSession};
pub use tools::{AgentTools, ToolCall, ToolDefinition, ToolResult};

//! Connections from the bridge to a tool server.
//!
//! A [`Connector`] opens one connection and hands back a [`ToolClient`].
//! The session owns at most one client at a time; the connectors here only
//! know how to reach a server, not when.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::CallToolRequestParams;
use rmcp::service::{RunningService, ServiceError};
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value};

use super::config::{BridgeConfig, ServerTarget};
use crate::error::BridgeError;
use crate::mcp::{DocSearchMcpServer, SharedStorage};

/// Buffer size of the in-process duplex pipe.
const DUPLEX_BUFFER: usize = 64 * 1024;

/// Result of one remote tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text content blocks joined by newlines.
    pub text: String,
    /// Whether the server flagged the call as failed.
    pub is_error: bool,
    /// Structured content, if the server sent any.
    pub structured: Option<Value>,
}

/// An open connection to a tool server.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Names of the tools the server exposes.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if the request cannot be delivered.
    async fn list_tools(&self) -> Result<Vec<String>, BridgeError>;

    /// Calls a tool.
    ///
    /// A tool that runs and reports failure yields `Ok` with
    /// [`ToolOutput::is_error`] set.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if the connection fails, or
    /// [`BridgeError::Remote`] if the server rejects the request.
    async fn call(&self, name: &str, arguments: Map<String, Value>)
    -> Result<ToolOutput, BridgeError>;

    /// Releases the connection. Safe to call more than once.
    async fn close(&self);
}

/// Opens connections to a tool server.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes a new connection.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if the server cannot be reached.
    async fn connect(&self) -> Result<Arc<dyn ToolClient>, BridgeError>;
}

/// Builds the connector selected by `config`.
///
/// # Errors
///
/// Returns [`BridgeError::Transport`] if the target needs a transport that
/// was not compiled in.
pub fn connector_for(config: &BridgeConfig) -> Result<Arc<dyn Connector>, BridgeError> {
    match &config.target {
        ServerTarget::Command { program, args } => Ok(Arc::new(ChildProcessConnector {
            program: program.clone(),
            args: args.clone(),
            db_path: config.db_path.clone(),
        })),
        #[cfg(feature = "http")]
        ServerTarget::Url(url) => Ok(Arc::new(HttpConnector::new(url.clone()))),
        #[cfg(not(feature = "http"))]
        ServerTarget::Url(url) => Err(BridgeError::Transport(format!(
            "cannot reach {url}: built without the `http` feature"
        ))),
    }
}

/// [`ToolClient`] over an rmcp client session.
pub struct RmcpToolClient {
    service: RunningService<RoleClient, ()>,
}

impl RmcpToolClient {
    /// Wraps an initialized rmcp client.
    #[must_use]
    pub const fn new(service: RunningService<RoleClient, ()>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolClient for RmcpToolClient {
    async fn list_tools(&self) -> Result<Vec<String>, BridgeError> {
        let tools = self
            .service
            .list_all_tools()
            .await
            .map_err(|e| BridgeError::Transport(format!("failed to list tools: {e}")))?;
        Ok(tools.into_iter().map(|t| t.name.to_string()).collect())
    }

    async fn call(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutput, BridgeError> {
        let result = self
            .service
            .call_tool(CallToolRequestParams {
                name: name.to_string().into(),
                arguments: Some(arguments),
                task: None,
                meta: None,
            })
            .await
            .map_err(|e| match e {
                ServiceError::McpError(error) => BridgeError::Remote {
                    tool: name.to_string(),
                    message: error.message.to_string(),
                },
                other => BridgeError::Transport(other.to_string()),
            })?;

        let text = result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.as_str()))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput {
            text,
            is_error: result.is_error.unwrap_or(false),
            structured: result.structured_content,
        })
    }

    async fn close(&self) {
        self.service.cancellation_token().cancel();
    }
}

/// Spawns the server as a child process speaking MCP over stdio.
#[derive(Debug, Clone)]
pub struct ChildProcessConnector {
    program: Option<PathBuf>,
    args: Vec<String>,
    db_path: Option<PathBuf>,
}

impl ChildProcessConnector {
    /// Runs `program` with `args`; `None` runs the current executable.
    #[must_use]
    pub const fn new(program: Option<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            db_path: None,
        }
    }

    fn command(&self) -> Result<tokio::process::Command, BridgeError> {
        let program = match &self.program {
            Some(program) => program.clone(),
            None => std::env::current_exe().map_err(|e| {
                BridgeError::Transport(format!("cannot locate server executable: {e}"))
            })?,
        };
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(&self.args).stderr(Stdio::inherit());
        if let Some(path) = &self.db_path {
            cmd.env("DOCSEARCH_DB_PATH", path);
        }
        Ok(cmd)
    }
}

#[async_trait]
impl Connector for ChildProcessConnector {
    async fn connect(&self) -> Result<Arc<dyn ToolClient>, BridgeError> {
        let cmd = self.command()?;
        tracing::debug!(program = ?cmd.as_std().get_program(), "spawning tool server");
        let transport = TokioChildProcess::new(cmd)
            .map_err(|e| BridgeError::Transport(format!("failed to spawn server: {e}")))?;
        let service = ().serve(transport).await.map_err(|e| {
            BridgeError::Transport(format!("failed to initialize session: {e}"))
        })?;
        Ok(Arc::new(RmcpToolClient::new(service)))
    }
}

/// Runs a server in-process over a duplex pipe.
///
/// Every connection gets its own server instance over the shared store.
#[derive(Clone)]
pub struct DuplexConnector {
    storage: SharedStorage,
}

impl DuplexConnector {
    /// Serves `storage` to each new connection.
    #[must_use]
    pub const fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(&self) -> Result<Arc<dyn ToolClient>, BridgeError> {
        let (server_io, client_io) = tokio::io::duplex(DUPLEX_BUFFER);
        let server = DocSearchMcpServer::with_shared(Arc::clone(&self.storage));
        tokio::spawn(async move {
            match server.serve(server_io).await {
                Ok(running) => {
                    let _ = running.waiting().await;
                }
                Err(e) => tracing::warn!(error = %e, "in-process server failed to start"),
            }
        });
        let service = ().serve(client_io).await.map_err(|e| {
            BridgeError::Transport(format!("failed to initialize session: {e}"))
        })?;
        Ok(Arc::new(RmcpToolClient::new(service)))
    }
}

/// Connects to a streamable HTTP endpoint.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpConnector {
    url: String,
}

#[cfg(feature = "http")]
impl HttpConnector {
    /// Connects to `url`, e.g. `http://127.0.0.1:8000/mcp`.
    #[must_use]
    pub const fn new(url: String) -> Self {
        Self { url }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self) -> Result<Arc<dyn ToolClient>, BridgeError> {
        use rmcp::transport::StreamableHttpClientTransport;

        tracing::debug!(url = %self.url, "connecting to tool server");
        let transport = StreamableHttpClientTransport::from_uri(self.url.as_str());
        let service = ().serve(transport).await.map_err(|e| {
            BridgeError::Transport(format!("failed to connect to {}: {e}", self.url))
        })?;
        Ok(Arc::new(RmcpToolClient::new(service)))
    }
}

//! Blocking session over an asynchronous tool-server connection.
//!
//! A [`ToolSession`] owns a dedicated tokio runtime and at most one open
//! connection. Every public method blocks the calling thread; the async work
//! runs on the session's own runtime, so callers may be plain threads or
//! tasks inside another tokio runtime.
//!
//! ```text
//! caller thread ──invoke()──► spawn on session runtime ──► acquire() ──► ToolClient::call
//!       ▲                                                   (mutex-held connect)
//!       └──────────── std::sync::mpsc completion ◄──────────────────────┘
//! ```
//!
//! The connection slot is guarded by an async mutex that stays locked while
//! a connection is being opened, so concurrent first calls open exactly one
//! connection and every waiter receives the same handle.

use std::future::Future;
use std::sync::{Arc, mpsc};

use serde_json::{Map, Value, json};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tokio::sync::Mutex;

use super::config::BridgeConfig;
use super::connector::{Connector, ToolClient, ToolOutput, connector_for};
use super::response::ToolResponse;
use crate::error::BridgeError;

/// Tools the wrapper functions depend on; checked on every new connection.
pub const REQUIRED_TOOLS: [&str; 3] = ["search_documents", "list_collections", "add_document"];

/// Worker threads of the session runtime.
const RUNTIME_WORKERS: usize = 2;

type Slot = Arc<Mutex<Option<Arc<dyn ToolClient>>>>;

/// A lazily connected, blocking session with a tool server.
///
/// Starts disconnected. The first call connects; later calls reuse the
/// connection until [`ToolSession::teardown`] or a transport failure. Safe to
/// share across threads.
///
/// Callers must not run `teardown` concurrently with an outstanding
/// [`ToolSession::invoke`]; an in-flight call is never interrupted.
pub struct ToolSession {
    runtime: Option<Runtime>,
    connector: Arc<dyn Connector>,
    slot: Slot,
    config: BridgeConfig,
}

impl ToolSession {
    /// Creates a session using the connector selected by `config`.
    ///
    /// Does not connect.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start or the configured
    /// transport is unavailable.
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let connector = connector_for(&config)?;
        Self::with_connector(config, connector)
    }

    /// Creates a session over a custom connector.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Runtime`] if the runtime cannot start.
    pub fn with_connector(
        config: BridgeConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, BridgeError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(RUNTIME_WORKERS)
            .thread_name("docsearch-bridge")
            .enable_all()
            .build()
            .map_err(|e| BridgeError::Runtime(format!("failed to start runtime: {e}")))?;

        Ok(Self {
            runtime: Some(runtime),
            connector,
            slot: Arc::new(Mutex::new(None)),
            config,
        })
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Connects if disconnected; otherwise does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if the server cannot be reached, or
    /// [`BridgeError::MissingTool`] if it lacks a tool in [`REQUIRED_TOOLS`],
    /// or [`BridgeError::Timeout`] if connecting exceeds the configured limit.
    /// The session stays disconnected on error.
    pub fn ensure_connected(&self) -> Result<(), BridgeError> {
        let slot = Arc::clone(&self.slot);
        let connector = Arc::clone(&self.connector);
        let timeout = self.config.timeout;
        self.block_on(async move {
            let attempt = acquire(&slot, connector.as_ref());
            match timeout {
                Some(limit) => tokio::time::timeout(limit, attempt)
                    .await
                    .map_err(|_| BridgeError::Timeout(limit))?
                    .map(|_| ()),
                None => attempt.await.map(|_| ()),
            }
        })
    }

    /// Returns `true` while a connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let slot = Arc::clone(&self.slot);
        self.block_on(async move { Ok(slot.lock().await.is_some()) })
            .unwrap_or(false)
    }

    /// Calls a remote tool, connecting first if needed.
    ///
    /// Blocks until the call completes or the configured timeout elapses.
    /// No retries are made.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Transport`]: connection failed; the session is now disconnected.
    /// - [`BridgeError::Remote`]: the server rejected the call or the tool reported failure.
    /// - [`BridgeError::Timeout`]: connecting plus the call exceeded the configured
    ///   limit. A timeout during connect leaves the session disconnected.
    pub fn invoke(
        &self,
        tool: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutput, BridgeError> {
        let slot = Arc::clone(&self.slot);
        let connector = Arc::clone(&self.connector);
        let timeout = self.config.timeout;
        let tool = tool.to_string();

        self.block_on(async move {
            let attempt = call_tool(&slot, connector.as_ref(), tool, arguments);
            match timeout {
                Some(limit) => tokio::time::timeout(limit, attempt)
                    .await
                    .map_err(|_| BridgeError::Timeout(limit))?,
                None => attempt.await,
            }
        })
    }

    /// Closes the connection if one is open.
    ///
    /// Idempotent and never fails; safe before any connection was made.
    pub fn teardown(&self) {
        let slot = Arc::clone(&self.slot);
        let result = self.block_on(async move {
            let client = slot.lock().await.take();
            if let Some(client) = client {
                client.close().await;
                tracing::info!("tool server connection closed");
            }
            Ok(())
        });
        if let Err(e) = result {
            tracing::debug!(error = %e, "teardown skipped");
        }
    }

    /// Releases the shared connection. Same as [`ToolSession::teardown`].
    pub fn cleanup(&self) {
        self.teardown();
    }

    /// Searches a collection.
    ///
    /// Returns `{status, message, results}` where `results` is the server's
    /// formatted report.
    #[must_use]
    pub fn search_documents(
        &self,
        query: &str,
        n_results: Option<usize>,
        collection: Option<&str>,
    ) -> ToolResponse {
        let arguments = object(json!({
            "query": query,
            "collection": collection.unwrap_or(&self.config.default_collection),
            "max_results": n_results.unwrap_or(self.config.default_results),
        }));
        match self.invoke("search_documents", arguments) {
            Ok(output) => ToolResponse::success()
                .with("message", format!("Search completed for query: '{query}'"))
                .with("results", output.text),
            Err(e) => ToolResponse::error(format!("Failed to search documents: {e}")),
        }
    }

    /// Lists collections. Returns `{status, collections}`.
    #[must_use]
    pub fn list_collections(&self) -> ToolResponse {
        match self.invoke("list_collections", Map::new()) {
            Ok(output) => ToolResponse::success().with("collections", output.text),
            Err(e) => ToolResponse::error(format!("Failed to list collections: {e}")),
        }
    }

    /// Adds a document to the default collection.
    ///
    /// Returns the server's `{status, message | error_message}` payload.
    #[must_use]
    pub fn add_document(&self, document_name: &str, content: &str) -> ToolResponse {
        let arguments = object(json!({
            "document_name": document_name,
            "content": content,
            "collection": self.config.default_collection,
        }));
        let parsed = self.invoke("add_document", arguments).and_then(|output| {
            serde_json::from_str::<ToolResponse>(&output.text)
                .map_err(|e| BridgeError::Protocol(format!("unexpected add_document reply: {e}")))
        });
        parsed.unwrap_or_else(|e| ToolResponse::error(format!("Failed to add document: {e}")))
    }

    /// Runs `future` on the session runtime and blocks until it finishes.
    fn block_on<F, T>(&self, future: F) -> Result<T, BridgeError>
    where
        F: Future<Output = Result<T, BridgeError>> + Send + 'static,
        T: Send + 'static,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| BridgeError::Runtime("session runtime is shut down".to_string()))?;

        let (tx, rx) = mpsc::sync_channel(1);
        runtime.spawn(async move {
            let _ = tx.send(future.await);
        });

        let wait = move || {
            rx.recv().map_err(|_| {
                BridgeError::Runtime("bridge task ended without a result".to_string())
            })
        };

        // Inside a multi-threaded runtime, let it move other tasks off this
        // worker while we wait. A current-thread runtime cannot, and simply
        // stalls until the session runtime replies.
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(wait)?
            }
            _ => wait()?,
        }
    }
}

impl Drop for ToolSession {
    fn drop(&mut self) {
        self.teardown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Returns the open client, connecting under the slot lock if needed.
async fn acquire(
    slot: &Mutex<Option<Arc<dyn ToolClient>>>,
    connector: &dyn Connector,
) -> Result<Arc<dyn ToolClient>, BridgeError> {
    let mut guard = slot.lock().await;
    if let Some(client) = guard.as_ref() {
        return Ok(Arc::clone(client));
    }

    let client = connector.connect().await?;
    if let Err(e) = verify_tools(client.as_ref()).await {
        client.close().await;
        return Err(e);
    }

    tracing::info!("connected to tool server");
    *guard = Some(Arc::clone(&client));
    Ok(client)
}

/// Connects if needed, then calls `tool`.
///
/// Dropping this future mid-connect leaves the slot empty; the client is only
/// stored once it has been verified.
async fn call_tool(
    slot: &Mutex<Option<Arc<dyn ToolClient>>>,
    connector: &dyn Connector,
    tool: String,
    arguments: Map<String, Value>,
) -> Result<ToolOutput, BridgeError> {
    let client = acquire(slot, connector).await?;
    tracing::debug!(tool = %tool, "invoking remote tool");

    match client.call(&tool, arguments).await {
        Ok(output) if output.is_error => Err(BridgeError::Remote {
            tool,
            message: output.text,
        }),
        Ok(output) => Ok(output),
        Err(e) => {
            if e.is_transport() {
                tracing::warn!(tool = %tool, error = %e, "connection lost; resetting session");
                release(slot, &client).await;
            }
            Err(e)
        }
    }
}

/// Clears the slot if it still holds `client`, then closes `client`.
async fn release(slot: &Mutex<Option<Arc<dyn ToolClient>>>, client: &Arc<dyn ToolClient>) {
    {
        let mut guard = slot.lock().await;
        if guard.as_ref().is_some_and(|current| Arc::ptr_eq(current, client)) {
            *guard = None;
        }
    }
    client.close().await;
}

async fn verify_tools(client: &dyn ToolClient) -> Result<(), BridgeError> {
    let available = client.list_tools().await?;
    for name in REQUIRED_TOOLS {
        if !available.iter().any(|t| t == name) {
            return Err(BridgeError::MissingTool {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

//! Ways to put a [`DocSearchMcpServer`] on the wire.
//!
//! Stdio carries exactly one client for the life of the process. Streamable
//! HTTP accepts many: each MCP session gets a fresh server value, and all of
//! them read and write the one store the process opened.

use rmcp::ServiceExt;
use rmcp::transport::io::stdio;

use super::server::DocSearchMcpServer;
#[cfg(feature = "http")]
use super::server::SharedStorage;

/// Path the HTTP transport is mounted at.
#[cfg(feature = "http")]
pub const HTTP_ENDPOINT: &str = "/mcp";

/// Serves a single client on stdin/stdout until it hangs up.
///
/// Stdout carries protocol frames only; logs go to stderr.
///
/// # Errors
///
/// Returns an error if the MCP handshake fails or the session ends abnormally.
pub async fn serve_stdio(server: DocSearchMcpServer) -> anyhow::Result<()> {
    tracing::info!("serving MCP over stdio");
    let session = server.serve(stdio()).await?;
    let reason = session.waiting().await?;
    tracing::info!(?reason, "stdio session ended");
    Ok(())
}

/// Builds the HTTP router for `storage`.
///
/// Sessions opened through the router each get their own
/// [`DocSearchMcpServer`] over `storage`. Cancelling `shutdown` closes every
/// open session.
#[cfg(feature = "http")]
pub fn http_router(
    storage: SharedStorage,
    shutdown: &tokio_util::sync::CancellationToken,
) -> axum::Router {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    };
    use std::sync::Arc;

    let per_session = move || {
        tracing::debug!("opening MCP session");
        Ok::<_, std::io::Error>(DocSearchMcpServer::with_shared(Arc::clone(&storage)))
    };
    let sessions = StreamableHttpService::new(
        per_session,
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: shutdown.child_token(),
            ..Default::default()
        },
    );
    axum::Router::new().nest_service(HTTP_ENDPOINT, sessions)
}

/// Serves streamable HTTP on `host:port` until Ctrl-C.
///
/// Every session shares the store behind `server`.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the listener fails.
#[cfg(feature = "http")]
pub async fn serve_http(server: DocSearchMcpServer, host: &str, port: u16) -> anyhow::Result<()> {
    let shutdown = tokio_util::sync::CancellationToken::new();
    let router = http_router(server.storage(), &shutdown);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, endpoint = HTTP_ENDPOINT, "serving MCP over HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("interrupt received, closing HTTP sessions");
            shutdown.cancel();
        })
        .await?;
    Ok(())
}

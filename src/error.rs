//! Error types for docsearch.
//!
//! Each layer has its own error enum; [`Error`] unifies them for the CLI
//! and the library entry points. Errors are converted to user-facing
//! results at the nearest boundary (engine outcome, tool payload, or
//! [`crate::bridge::ToolResponse`]) and never cross a component as a panic.

use std::time::Duration;

use thiserror::Error;

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Document store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Embedding model failure.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Session bridge failure.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying `SQLite` failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The schema has not been created yet.
    #[error("document store not initialized")]
    NotInitialized,

    /// The named collection does not exist.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Collection name that was requested.
        name: String,
    },

    /// A document with this id already exists in the collection.
    #[error("document '{id}' already exists in collection '{collection}'")]
    DuplicateId {
        /// Collection the write targeted.
        collection: String,
        /// Colliding document id.
        id: String,
    },

    /// A stored embedding does not match the embedder's dimension.
    #[error("embedding dimension mismatch: expected {expected}, found {actual}")]
    DimensionMismatch {
        /// Dimension produced by the active embedder.
        expected: usize,
        /// Dimension found in storage.
        actual: usize,
    },

    /// Metadata could not be encoded or decoded.
    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Embedding failed while writing or querying.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// A lock guarding the store was poisoned by a panicking holder.
    #[error("document store lock poisoned")]
    Poisoned,
}

/// Errors raised while computing embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The embedding model could not be loaded.
    #[error("failed to initialize embedding model: {0}")]
    ModelInit(String),

    /// Inference failed for a batch of texts.
    #[error("embedding failed: {0}")]
    Inference(String),

    /// The configured embedder name is unknown or not compiled in.
    #[error("unsupported embedder '{name}'")]
    Unsupported {
        /// Requested embedder name.
        name: String,
    },
}

/// Errors raised by the session bridge.
///
/// Errors for which [`BridgeError::is_transport`] holds invalidate the shared
/// connection; every other variant leaves the session connected.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The server could not be reached or the connection was lost.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server ran the tool and reported a failure.
    #[error("tool '{tool}' failed: {message}")]
    Remote {
        /// Tool that failed.
        tool: String,
        /// Error text returned by the server.
        message: String,
    },

    /// The call did not complete within the configured limit.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The server's response could not be interpreted.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server does not expose a tool the bridge wraps.
    #[error("server does not expose tool '{name}'")]
    MissingTool {
        /// Missing tool name.
        name: String,
    },

    /// The bridge's background runtime failed or was shut down.
    #[error("bridge runtime error: {0}")]
    Runtime(String),
}

impl BridgeError {
    /// Returns `true` if this error means the connection is unusable.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::MissingTool { .. })
    }
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Generic command failure with a message.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Invalid argument supplied on the command line.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

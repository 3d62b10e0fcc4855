//! Session bridge configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the server command line.
pub const SERVER_COMMAND_ENV: &str = "DOCSEARCH_SERVER_COMMAND";
/// Environment variable holding the server URL (selects HTTP).
pub const SERVER_URL_ENV: &str = "DOCSEARCH_SERVER_URL";
/// Environment variable holding the per-call timeout in seconds.
pub const TIMEOUT_ENV: &str = "DOCSEARCH_TIMEOUT_SECS";

/// Default collection for the client-side wrappers.
const DEFAULT_COLLECTION: &str = "documents";
/// Default result count for the client-side wrappers.
const DEFAULT_RESULTS: usize = 5;

/// How the bridge reaches the tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTarget {
    /// Spawn a child process speaking MCP over stdio.
    ///
    /// `program: None` runs the current executable.
    Command {
        /// Program to run.
        program: Option<PathBuf>,
        /// Arguments passed to the program.
        args: Vec<String>,
    },
    /// Connect to a streamable HTTP endpoint.
    Url(String),
}

impl Default for ServerTarget {
    fn default() -> Self {
        Self::Command {
            program: None,
            args: vec!["serve".to_string(), "stdio".to_string()],
        }
    }
}

/// Configuration for a [`ToolSession`](super::ToolSession).
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Where the tool server lives.
    pub target: ServerTarget,
    /// Store location handed to a spawned server via `DOCSEARCH_DB_PATH`.
    pub db_path: Option<PathBuf>,
    /// Per-call limit; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Collection used when a wrapper call names none.
    pub default_collection: String,
    /// Result count used when a search names none.
    pub default_results: usize,
}

impl BridgeConfig {
    /// Creates a new builder for `BridgeConfig`.
    #[must_use]
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    target: Option<ServerTarget>,
    db_path: Option<PathBuf>,
    timeout: Option<Duration>,
    default_collection: Option<String>,
    default_results: Option<usize>,
}

impl BridgeConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from `lookup`, which maps variable names to values.
    ///
    /// A URL takes precedence over a command when both are present. Values
    /// that fail to parse are ignored.
    #[must_use]
    pub fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.target.is_none() {
            self.target = lookup(SERVER_URL_ENV)
                .filter(|url| !url.trim().is_empty())
                .map(ServerTarget::Url)
                .or_else(|| lookup(SERVER_COMMAND_ENV).and_then(|line| parse_command(&line)));
        }
        if self.timeout.is_none() {
            self.timeout = lookup(TIMEOUT_ENV)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|secs| *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        }
        self
    }

    /// Spawns `program` with `args` as the server.
    #[must_use]
    pub fn command(mut self, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        self.target = Some(ServerTarget::Command {
            program: Some(program.into()),
            args,
        });
        self
    }

    /// Connects to the server at `url`.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.target = Some(ServerTarget::Url(url.into()));
        self
    }

    /// Sets the store location passed to a spawned server.
    #[must_use]
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the default collection for wrapper calls.
    #[must_use]
    pub fn default_collection(mut self, name: impl Into<String>) -> Self {
        self.default_collection = Some(name.into());
        self
    }

    /// Sets the default result count for searches.
    #[must_use]
    pub const fn default_results(mut self, n: usize) -> Self {
        self.default_results = Some(n);
        self
    }

    /// Builds the [`BridgeConfig`].
    #[must_use]
    pub fn build(self) -> BridgeConfig {
        BridgeConfig {
            target: self.target.unwrap_or_default(),
            db_path: self.db_path,
            timeout: self.timeout,
            default_collection: self
                .default_collection
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            default_results: self.default_results.unwrap_or(DEFAULT_RESULTS),
        }
    }
}

/// Splits a command line on whitespace into program and arguments.
fn parse_command(line: &str) -> Option<ServerTarget> {
    let mut parts = line.split_whitespace();
    let program = parts.next()?;
    Some(ServerTarget::Command {
        program: Some(PathBuf::from(program)),
        args: parts.map(str::to_string).collect(),
    })
}

//! docsearch command-line entry point.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use docsearch::cli::{Cli, execute};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter; `RUST_LOG` is the fallback.
const LOG_ENV: &str = "DOCSEARCH_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                let _ = io::stdout().lock().write_all(output.as_bytes());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = writeln!(io::stderr(), "Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries command output and the stdio MCP stream.
fn init_tracing(verbose: bool) {
    let default = if verbose { "docsearch=debug" } else { "docsearch=warn" };
    let filter = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(|_| EnvFilter::new(default), EnvFilter::new);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

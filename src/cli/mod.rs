//! CLI layer for docsearch.
//!
//! Provides the command-line interface using clap: the MCP server, direct
//! store commands, the sample seeder, and bridge client calls.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{execute, open_store};
pub use output::OutputFormat;
pub use parser::{ClientCommands, Cli, Commands, ServeCommands};

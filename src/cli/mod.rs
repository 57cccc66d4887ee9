//! CLI layer for the legal research engine.
//!
//! Provides the command-line interface using clap, with `ingest`,
//! `query`, and `chat` subcommands wired onto the library's components.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};

//! Binary entry point for the legal research engine.
//!
//! Wires the CLI's `ingest`, `query`, and `chat` subcommands onto the
//! library's ingestion, retrieval, and chat components.

use clap::Parser;
use legal_research_engine::cli::output::{format_error, OutputFormat};
use legal_research_engine::cli::{execute, Cli};
use legal_research_engine::config::Config;
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    Config::init_tracing();
    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.format);

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                if let Err(e) = write!(io::stdout(), "{output}")
                    && e.kind() != io::ErrorKind::BrokenPipe
                {
                    eprintln!("Error writing to stdout: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let error_output = format_error(&e, format);
            match format {
                OutputFormat::Json => println!("{error_output}"),
                OutputFormat::Text => eprintln!("Error: {error_output}"),
            }
            ExitCode::FAILURE
        }
    }
}

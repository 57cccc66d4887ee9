//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Legal research engine: ingest a case corpus, query it, or hold a
/// grounded chat session over it.
#[derive(Parser, Debug)]
#[command(name = "legal-research")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the vector index file.
    #[arg(long, env = "VECTOR_INDEX_PATH")]
    pub index_path: Option<PathBuf>,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Which of the three Similarity Engine modes a query should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryMode {
    /// Mode A: deduped, one best hit per case.
    Cases,
    /// Mode B: raw top-k chunks, duplicates allowed.
    Chunks,
    /// Mode C: per-case grouped bundles.
    Grouped,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a directory of source PDFs into the vector index.
    Ingest {
        /// Directory containing `.pdf` files to ingest.
        #[arg(long)]
        pdf_dir: Option<PathBuf>,

        /// Maximum chunk body size in characters.
        #[arg(long, default_value_t = crate::chunking::DEFAULT_MAX_CHUNK_SIZE)]
        max_chunk_size: usize,
    },

    /// Run a similarity query against the index.
    Query {
        /// Free-text query.
        text: String,

        /// Retrieval mode.
        #[arg(long, value_enum, default_value_t = QueryMode::Cases)]
        mode: QueryMode,

        /// Number of cases (modes `cases`/`grouped`) or chunks (mode `chunks`) to return.
        #[arg(short, long, default_value = "10")]
        k: usize,

        /// Max chunks kept per case (mode `grouped` only).
        #[arg(long, default_value = "5")]
        max_chunks_per_case: usize,
    },

    /// Run a single grounded question through retrieval, the LLM, and
    /// the hallucination detector, with no session state kept.
    Analyze {
        /// Free-text legal question.
        text: String,

        /// Identifier of the user submitting the question.
        #[arg(long, default_value = "cli-user")]
        user_id: String,

        /// Number of precedent cases to ground the analysis on.
        #[arg(short, long, default_value = "10")]
        k: usize,
    },

    /// Open an interactive chat session anchored to a case, reading
    /// messages from stdin (one per line) until EOF or `/exit`.
    Chat {
        /// File containing the originating case's full text.
        case_file: PathBuf,

        /// Human-readable case title.
        #[arg(long, default_value = "")]
        case_title: String,

        /// Identifier of the user opening the session.
        #[arg(long, default_value = "cli-user")]
        user_id: String,

        /// Re-run retrieval on every turn instead of reusing the
        /// session's originating context.
        #[arg(long)]
        use_rag: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }
}

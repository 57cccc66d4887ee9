//! CLI command implementations: wires the library's components
//! together into runnable ingest/query/chat flows.

use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::AnalysisEngine;
use crate::chat::ChatEngine;
use crate::cli::output::{format_analysis_response, format_chat_response, format_hits, format_grouped, format_ingestion_report, OutputFormat};
use crate::cli::parser::{Cli, Commands, QueryMode};
use crate::config::Config;
use crate::embedding::{create_embedder, Embedder};
use crate::error::Result;
use crate::ingestion::ingest_directory;
use crate::llm::create_client;
use crate::objectstore::{LocalFsObjectStore, ObjectStore};
use crate::search::{DefaultRetriever, Retriever, SimilarityEngine};
use crate::security::SecurityEnforcer;
use crate::storage::{SqliteVectorIndex, VectorIndex};

/// Executes the parsed CLI invocation, returning the text to print on
/// success.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config = Config::from_env();
    let index_path = cli
        .index_path
        .clone()
        .unwrap_or_else(|| config.vector_index_dir.join("index.sqlite3"));

    match &cli.command {
        Commands::Ingest { pdf_dir, max_chunk_size } => {
            cmd_ingest(&config, pdf_dir.clone(), &index_path, *max_chunk_size, format)
        }
        Commands::Query { text, mode, k, max_chunks_per_case } => {
            cmd_query(&config, &index_path, text, *mode, *k, *max_chunks_per_case, format)
        }
        Commands::Analyze { text, user_id, k } => {
            cmd_analyze(&config, &index_path, text, user_id, *k, format)
        }
        Commands::Chat { case_file, case_title, user_id, use_rag } => {
            cmd_chat(&config, &index_path, case_file, case_title, user_id, *use_rag, format)
        }
    }
}

fn cmd_analyze(
    config: &Config,
    index_path: &Path,
    text: &str,
    user_id: &str,
    k: usize,
    format: OutputFormat,
) -> Result<String> {
    let retriever = open_retriever(config, index_path)?;
    let llm = create_client();
    let security = SecurityEnforcer::new(config.clone())?;
    let engine = AnalysisEngine::new(retriever, llm, security, config)?;

    let now = crate::timestamp::now_unix_seconds();
    match engine.analyze(text, user_id, "cli", k, now) {
        Ok(outcome) => Ok(format_analysis_response(&outcome, format)),
        Err(crate::analysis::AnalysisError::ValidationFailed { violations }) => {
            Ok(format!("Input rejected: {}", violations.join("; ")))
        }
        Err(crate::analysis::AnalysisError::Internal(message)) => {
            Err(crate::error::Error::Config { message })
        }
    }
}

fn cmd_ingest(
    config: &Config,
    pdf_dir: Option<PathBuf>,
    index_path: &Path,
    max_chunk_size: usize,
    format: OutputFormat,
) -> Result<String> {
    let pdf_dir = pdf_dir.unwrap_or_else(|| config.pdf_source_dir.clone());
    let object_store = Arc::new(LocalFsObjectStore::new(
        config.vector_index_dir.join("objects"),
        config.object_store_bucket.clone(),
    ));
    let embedder: Arc<dyn Embedder> = create_embedder()?.into();

    let report = ingest_directory(&pdf_dir, index_path, object_store, embedder, max_chunk_size)?;
    Ok(format_ingestion_report(&report, format))
}

fn cmd_query(
    config: &Config,
    index_path: &Path,
    text: &str,
    mode: QueryMode,
    k: usize,
    max_chunks_per_case: usize,
    format: OutputFormat,
) -> Result<String> {
    let similarity = open_similarity_engine(config, index_path)?;
    match mode {
        QueryMode::Cases => {
            let hits = similarity.deduped_cases(text, k)?;
            Ok(format_hits(&hits, format))
        }
        QueryMode::Chunks => {
            let hits = similarity.raw_chunks(text, k)?;
            Ok(format_hits(&hits, format))
        }
        QueryMode::Grouped => {
            let groups = similarity.grouped(text, k, max_chunks_per_case)?;
            Ok(format_grouped(&groups, format))
        }
    }
}

fn cmd_chat(
    config: &Config,
    index_path: &Path,
    case_file: &Path,
    case_title: &str,
    user_id: &str,
    use_rag: bool,
    format: OutputFormat,
) -> Result<String> {
    let case_text = std::fs::read_to_string(case_file).map_err(|e| {
        crate::error::Error::Config {
            message: format!("could not read case file {}: {e}", case_file.display()),
        }
    })?;

    let retriever = open_retriever(config, index_path)?;
    let object_store = Arc::new(LocalFsObjectStore::new(
        config.vector_index_dir.join("objects"),
        config.object_store_bucket.clone(),
    ));
    let llm = create_client();
    let security = SecurityEnforcer::new(config.clone())?;
    let engine = ChatEngine::new(retriever, object_store, llm, security, config)?;

    let now = crate::timestamp::now_unix_seconds();
    let session_id = engine.start_session(user_id, &case_text, case_title, now)?;

    let mut out = String::new();
    out.push_str(&format!("Session {session_id} started. Type a message, or /exit to quit.\n"));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|e| crate::error::Error::Config { message: e.to_string() })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/exit" {
            break;
        }

        let now = crate::timestamp::now_unix_seconds();
        match engine.send_message(&session_id, user_id, "cli", line, use_rag, now) {
            Ok(response) => {
                let rendered = format_chat_response(&response, format);
                println!("{rendered}");
                let _ = io::stdout().flush();
            }
            Err(e) => {
                eprintln!("turn rejected: {e:?}");
            }
        }
    }

    engine.delete_session(&session_id, crate::timestamp::now_unix_seconds())?;
    out.push_str("Session ended.\n");
    Ok(out)
}

fn open_retriever(config: &Config, index_path: &Path) -> Result<Arc<dyn Retriever>> {
    let embedder: Arc<dyn Embedder> = create_embedder()?.into();
    let index: Arc<dyn VectorIndex> = Arc::new(SqliteVectorIndex::open(index_path)?);
    let _ = config;
    Ok(Arc::new(DefaultRetriever::with_index(embedder, index)))
}

fn open_similarity_engine(config: &Config, index_path: &Path) -> Result<SimilarityEngine> {
    let retriever = open_retriever(config, index_path)?;
    Ok(SimilarityEngine::new(retriever))
}

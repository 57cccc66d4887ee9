//! Ingestion pipeline: orchestrates PDF parsing through chunking,
//! embedding, and persistence, parallel across source PDFs via
//! `rayon`, writing into a fresh index and swapping it into place
//! atomically.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::chunking::chunk_legal_text;
use crate::domain::Chunk;
use crate::embedding::Embedder;
use crate::error::{Error, IngestionError, Result, StorageError};
use crate::objectstore::ObjectStore;
use crate::pdf::parse_pdf;
use crate::storage::{SqliteVectorIndex, VectorIndex};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    pub documents_processed: usize,
    pub chunks_indexed: usize,
    pub warnings: Vec<String>,
}

/// Runs the full ingestion pipeline over every `.pdf` file directly
/// under `pdf_dir`, building a fresh index and atomically swapping it
/// into `dest_index_path`.
pub fn ingest_directory(
    pdf_dir: &Path,
    dest_index_path: &Path,
    object_store: Arc<dyn ObjectStore>,
    embedder: Arc<dyn Embedder>,
    max_chunk_size: usize,
) -> Result<IngestionReport> {
    let paths = list_pdfs(pdf_dir)?;

    let per_file: Vec<Result<(Vec<Chunk>, Vec<String>)>> = paths
        .par_iter()
        .map(|path| ingest_one(path, object_store.as_ref(), embedder.as_ref(), max_chunk_size))
        .collect();

    let mut all_chunks = Vec::new();
    let mut warnings = Vec::new();
    let mut documents_processed = 0usize;

    // A failure on a single PDF is skipped, not fatal to the run; the
    // ingestion summary lists failures as warnings.
    for (path, result) in paths.iter().zip(per_file) {
        match result {
            Ok((chunks, file_warnings)) => {
                documents_processed += 1;
                warnings.extend(file_warnings);
                all_chunks.extend(chunks);
            }
            Err(err) => {
                warnings.push(format!("{}: {err}", path.display()));
            }
        }
    }

    let temp_path = dest_index_path.with_extension("tmp-build");
    if temp_path.exists() {
        std::fs::remove_file(&temp_path).map_err(|e| StorageError::SwapFailed(e.to_string()))?;
    }
    let fresh_index = SqliteVectorIndex::open(&temp_path)?;
    fresh_index.insert_chunks_batch(&all_chunks)?;
    drop(fresh_index);

    std::fs::rename(&temp_path, dest_index_path)
        .map_err(|e| StorageError::SwapFailed(e.to_string()))?;

    Ok(IngestionReport {
        documents_processed,
        chunks_indexed: all_chunks.len(),
        warnings,
    })
}

fn list_pdfs(pdf_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(pdf_dir)
        .map_err(|e| Error::Ingestion(IngestionError::SourceDirectory(e.to_string())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Ingestion(IngestionError::SourceDirectory(e.to_string())))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf")) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Parses, chunks, assigns page numbers, and embeds one PDF's chunks.
fn ingest_one(
    path: &Path,
    object_store: &dyn ObjectStore,
    embedder: &dyn Embedder,
    max_chunk_size: usize,
) -> Result<(Vec<Chunk>, Vec<String>)> {
    let parsed = parse_pdf(path)?;
    let source_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.pdf")
        .to_string();

    let document_url = object_store
        .upload(path, &source_file)
        .map(|url| url.to_s3())
        .unwrap_or_else(|_| format!("file://{}", path.display()));

    let pieces = chunk_legal_text(&parsed.full_text, max_chunk_size);
    let total_pages = parsed.per_page_texts.len().max(1) as u32;

    let mut chunks = Vec::with_capacity(pieces.len());
    let mut warnings = Vec::new();
    let mut bodies = Vec::with_capacity(pieces.len());

    for (ordinal, piece) in pieces.iter().enumerate() {
        let page_number = assign_page_number(&piece.body, &parsed.per_page_texts).unwrap_or_else(|| {
            warnings.push(format!(
                "{source_file}: chunk {ordinal} page not found by prefix match, defaulting to page 1"
            ));
            1
        });

        chunks.push(Chunk::new(
            parsed.metadata.citation.clone(),
            parsed.metadata.case_title.clone(),
            parsed.metadata.case_number.clone(),
            piece.header.clone(),
            ordinal,
            piece.body.clone(),
            page_number,
            total_pages,
            document_url.clone(),
            source_file.clone(),
        ));
        bodies.push(piece.body.as_str());
    }

    if !bodies.is_empty() {
        let embeddings = embedder.embed_batch(&bodies)?;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }
    }

    Ok((chunks, warnings))
}

/// Locates the page whose text contains the first 100 characters of
/// `chunk_body`. Returns `None` if no page matches.
fn assign_page_number(chunk_body: &str, per_page_texts: &[String]) -> Option<u32> {
    let prefix_end = chunk_body
        .char_indices()
        .nth(100)
        .map_or(chunk_body.len(), |(i, _)| i);
    let prefix = &chunk_body[..prefix_end];
    if prefix.trim().is_empty() {
        return None;
    }

    per_page_texts
        .iter()
        .position(|page_text| page_text.contains(prefix))
        .map(|idx| (idx + 1) as u32)
}

//! `fastembed`-backed semantic embedder (all-MiniLM-L6-v2), gated
//! behind the `fastembed-embeddings` feature.

use std::sync::{Mutex, OnceLock};

use crate::embedding::{DEFAULT_DIMENSIONS, Embedder};
use crate::error::{Error, IngestionError};
use crate::error::Result;

static EMBEDDING_MODEL: OnceLock<Mutex<fastembed::TextEmbedding>> = OnceLock::new();

/// Real semantic embedder over the all-MiniLM-L6-v2 model, lazily
/// loaded on first use to preserve cold-start time.
pub struct FastEmbedEmbedder {
    model_name: &'static str,
}

impl FastEmbedEmbedder {
    /// Model load itself is deferred to the first `embed` call.
    pub fn new() -> Result<Self> {
        Ok(Self {
            model_name: "all-MiniLM-L6-v2",
        })
    }

    fn get_model() -> Result<&'static Mutex<fastembed::TextEmbedding>> {
        if let Some(model) = EMBEDDING_MODEL.get() {
            return Ok(model);
        }

        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);
        let model = fastembed::TextEmbedding::try_new(options).map_err(|e| {
            Error::Ingestion(IngestionError::EmbeddingUnavailable(format!(
                "failed to load embedding model: {e}"
            )))
        })?;

        let _ = EMBEDDING_MODEL.set(Mutex::new(model));
        EMBEDDING_MODEL.get().ok_or_else(|| {
            Error::Ingestion(IngestionError::EmbeddingUnavailable(
                "embedding model initialization race".to_string(),
            ))
        })
    }

    #[must_use]
    pub const fn model_name(&self) -> &'static str {
        self.model_name
    }
}

impl Embedder for FastEmbedEmbedder {
    fn dimensions(&self) -> usize {
        DEFAULT_DIMENSIONS
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_batch(&[text])?.into_iter().next().unwrap_or_default())
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let model = Self::get_model()?;
        let mut model = model.lock().map_err(|e| {
            Error::Ingestion(IngestionError::EmbeddingUnavailable(format!(
                "failed to lock embedding model: {e}"
            )))
        })?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|e| {
                Error::Ingestion(IngestionError::EmbeddingUnavailable(format!(
                    "embedding generation failed: {e}"
                )))
            })
    }
}

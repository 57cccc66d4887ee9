//! Retriever and similarity engine: top-k vector search over the
//! persisted chunk index, and three case-aware retrieval modes built
//! on top of it.

mod similarity;

pub use similarity::{RetrievalMode, SimilarityEngine};

use std::sync::Arc;

use crate::domain::RetrievalHit;
use crate::embedding::Embedder;
use crate::error::{Error, RetrievalError, Result, StorageError};
use crate::storage::VectorIndex;

/// Top-k search over the vector index, embedding the query with the
/// same function used at ingest time. The retriever is the only place
/// index internals are read; downstream components see only
/// `RetrievalHit`s.
pub trait Retriever: Send + Sync {
    /// Embeds `query_text` and returns the top-`k` hits, ascending by
    /// distance. Fails with `IndexNotReady` if no index is loaded.
    fn retrieve(&self, query_text: &str, k: usize) -> Result<Vec<RetrievalHit>>;

    /// Equivalent to `retrieve`; named separately to make explicit
    /// that raw distances are part of the contract (every
    /// `RetrievalHit` always carries one).
    fn retrieve_with_scores(&self, query_text: &str, k: usize) -> Result<Vec<RetrievalHit>> {
        self.retrieve(query_text, k)
    }
}

/// Default `Retriever`: an embedder plus an optionally-loaded vector
/// index. `IndexNotReady` is returned until `load_index` is called.
pub struct DefaultRetriever {
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl DefaultRetriever {
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index: None,
        }
    }

    #[must_use]
    pub fn with_index(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index: Some(index),
        }
    }

    /// Loads (or replaces) the backing vector index.
    pub fn load_index(&mut self, index: Arc<dyn VectorIndex>) {
        self.index = Some(index);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }
}

impl Retriever for DefaultRetriever {
    fn retrieve(&self, query_text: &str, k: usize) -> Result<Vec<RetrievalHit>> {
        let index = self.index.as_ref().ok_or_else(|| {
            Error::Storage(StorageError::IndexNotReady {
                reason: "vector index not loaded".to_string(),
            })
        })?;

        let query_vector = self
            .embedder
            .embed(query_text)
            .map_err(|e| Error::Retrieval(RetrievalError::EmbeddingUnavailable(e.to_string())))?;

        let hits = index.search(&query_vector, k)?;
        Ok(hits
            .into_iter()
            .map(|(chunk, distance)| RetrievalHit {
                chunk,
                distance,
                query: query_text.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::FallbackEmbedder;
    use crate::storage::SqliteVectorIndex;

    fn sample_chunk(content: &str, ordinal: usize, citation: &str) -> crate::domain::Chunk {
        crate::domain::Chunk::new(
            citation.to_string(),
            "A v. B".to_string(),
            "CA 1".to_string(),
            "Facts".to_string(),
            ordinal,
            content.to_string(),
            1,
            3,
            "s3://bucket/a.pdf".to_string(),
            "a.pdf".to_string(),
        )
    }

    #[test]
    fn test_retrieve_fails_when_index_not_loaded() {
        let embedder = Arc::new(FallbackEmbedder::new(16));
        let retriever = DefaultRetriever::new(embedder);
        let result = retriever.retrieve("theft conviction", 5);
        assert!(matches!(
            result,
            Err(Error::Storage(StorageError::IndexNotReady { .. }))
        ));
    }

    #[test]
    fn test_retrieve_returns_hits_once_index_loaded() {
        let embedder = Arc::new(FallbackEmbedder::new(32));
        let index = Arc::new(SqliteVectorIndex::in_memory().unwrap());

        let mut chunk = sample_chunk("the appellant was convicted of theft", 0, "cite-1");
        chunk.embedding = embedder.embed(&chunk.content).unwrap();
        index.insert_chunk(&chunk).unwrap();

        let retriever = DefaultRetriever::with_index(embedder, index);
        let hits = retriever.retrieve("theft conviction", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.citation, "cite-1");
    }
}

//! Retrieval-hit types produced by the retriever and consumed by the
//! similarity engine.

use serde::{Deserialize, Serialize};

use super::{CaseKey, Chunk};

/// A Chunk plus a distance score from a specific query. Lower score
/// means closer. Scores are only comparable within the same query
/// .
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Distance score (non-negative, lower = closer).
    pub distance: f32,
    /// The query text that produced this hit.
    pub query: String,
}

impl RetrievalHit {
    /// Convenience accessor for the hit's case grouping key.
    #[must_use]
    pub fn case_key(&self) -> CaseKey {
        self.chunk.case_key()
    }
}

/// A case-key, its best (lowest) score among member hits, and an
/// ordered list of that case's hits (Mode C of the Similarity Engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedCaseHit {
    /// The case grouping key.
    pub case_key: CaseKey,
    /// Best (lowest) distance among this case's hits.
    pub best_distance: f32,
    /// Member hits, ascending by distance, size-bounded by
    /// `max_chunks_per_case`.
    pub hits: Vec<RetrievalHit>,
}

//! Similarity engine: three retrieval modes over the retriever —
//! deduped cases, raw chunks, and per-case grouped bundles.

use std::sync::Arc;

use crate::domain::{CaseKey, GroupedCaseHit, RetrievalHit};
use crate::error::Result;

use super::Retriever;

/// Which of the three modes `SimilarityEngine` should run.
#[derive(Debug, Clone)]
pub enum RetrievalMode {
    /// Mode A: `k` unique cases, keeping each case's closest hit.
    DedupedCases { k: usize },
    /// Mode B: top-`k` raw chunk hits, duplicates across cases allowed.
    RawChunks { k: usize },
    /// Mode C: `k_cases` groups, each holding up to `max_chunks_per_case`
    /// hits, sorted by the group's best distance.
    Grouped {
        k_cases: usize,
        max_chunks_per_case: usize,
    },
}

/// Runs one of the three retrieval modes over a `Retriever`. Owns only
/// an `Arc<dyn Retriever>` — never the reverse (the retriever must stay
/// ignorant of similarity-engine concerns).
pub struct SimilarityEngine {
    retriever: Arc<dyn Retriever>,
}

impl SimilarityEngine {
    #[must_use]
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }

    /// Mode A — deduped cases (default). Returns
    /// `min(k, distinct_cases_available)` entries, ascending by
    /// best distance.
    pub fn deduped_cases(&self, query_text: &str, k: usize) -> Result<Vec<RetrievalHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let candidates = self.retriever.retrieve(query_text, k.saturating_mul(3))?;

        let mut order: Vec<CaseKey> = Vec::new();
        let mut best: std::collections::HashMap<CaseKey, RetrievalHit> =
            std::collections::HashMap::new();

        for hit in candidates {
            let key = hit.case_key();
            match best.get(&key) {
                None => {
                    order.push(key.clone());
                    best.insert(key, hit);
                }
                Some(existing) if hit.distance < existing.distance => {
                    best.insert(key, hit);
                }
                Some(_) => {}
            }
            if order.len() >= k {
                break;
            }
        }

        let mut result: Vec<RetrievalHit> = order
            .into_iter()
            .take(k)
            .filter_map(|key| best.remove(&key))
            .collect();
        sort_hits(&mut result);
        Ok(result)
    }

    /// Mode B — raw chunks. Returns the retriever's top-k unchanged.
    pub fn raw_chunks(&self, query_text: &str, k: usize) -> Result<Vec<RetrievalHit>> {
        self.retriever.retrieve(query_text, k)
    }

    /// Mode C — grouped. Returns up to `k_cases` groups, each truncated
    /// to `max_chunks_per_case` hits, sorted by each group's best hit.
    pub fn grouped(
        &self,
        query_text: &str,
        k_cases: usize,
        max_chunks_per_case: usize,
    ) -> Result<Vec<GroupedCaseHit>> {
        if k_cases == 0 || max_chunks_per_case == 0 {
            return Ok(Vec::new());
        }

        let want = k_cases.saturating_mul(max_chunks_per_case).saturating_mul(3);
        let candidates = self.retriever.retrieve(query_text, want)?;

        let mut groups: std::collections::HashMap<CaseKey, Vec<RetrievalHit>> =
            std::collections::HashMap::new();
        for hit in candidates {
            groups.entry(hit.case_key()).or_default().push(hit);
        }

        let mut grouped: Vec<GroupedCaseHit> = groups
            .into_iter()
            .map(|(case_key, mut hits)| {
                sort_hits(&mut hits);
                hits.truncate(max_chunks_per_case);
                let best_distance = hits.first().map(|h| h.distance).unwrap_or(f32::INFINITY);
                GroupedCaseHit {
                    case_key,
                    best_distance,
                    hits,
                }
            })
            .collect();

        grouped.sort_by(|a, b| {
            a.best_distance
                .partial_cmp(&b.best_distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.case_key.as_str().cmp(b.case_key.as_str()))
        });
        grouped.truncate(k_cases);
        Ok(grouped)
    }
}

/// Sorts hits ascending by distance, breaking ties by `chunk_ordinal`
/// then by case key.
fn sort_hits(hits: &mut [RetrievalHit]) {
    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.chunk_ordinal.cmp(&b.chunk.chunk_ordinal))
            .then_with(|| a.case_key().as_str().cmp(b.case_key().as_str()))
    });
}

//! Case: a derived grouping of Chunks sharing a citation (or title+number).

use serde::{Deserialize, Serialize};

use super::Chunk;

/// Grouping key for a Case: citation when present, else title+number.
///
/// Kept as an opaque newtype so callers never construct one incorrectly
/// by hand — `Chunk::case_key` and `CaseKey::from_parts` are the only
/// entry points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseKey(String);

impl CaseKey {
    /// Builds the key from a chunk's raw citation/title/number fields.
    #[must_use]
    pub fn from_parts(citation: &str, title: &str, number: &str) -> Self {
        if !citation.trim().is_empty() {
            Self(format!("citation:{citation}"))
        } else {
            Self(format!("title_number:{title}|{number}"))
        }
    }

    /// Returns the raw key string (stable, used for tie-break ordering).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A judgment document reconstructed by grouping Chunks with equal
/// case-key. Never physically stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    /// The grouping key.
    pub key: CaseKey,
    /// Citation string, if present on any member chunk.
    pub citation: String,
    /// Case title.
    pub title: String,
    /// Case number.
    pub case_number: String,
    /// Canonical document URL.
    pub document_url: String,
    /// Member chunks, in `chunk_ordinal` order.
    pub chunks: Vec<Chunk>,
}

impl Case {
    /// Groups a flat list of chunks into cases by case key, preserving
    /// `chunk_ordinal` order within each case.
    #[must_use]
    pub fn group(chunks: Vec<Chunk>) -> Vec<Self> {
        use std::collections::BTreeMap;

        let mut by_key: BTreeMap<CaseKey, Vec<Chunk>> = BTreeMap::new();
        for chunk in chunks {
            by_key.entry(chunk.case_key()).or_default().push(chunk);
        }

        by_key
            .into_iter()
            .map(|(key, mut members)| {
                members.sort_by_key(|c| c.chunk_ordinal);
                let first = &members[0];
                Self {
                    key,
                    citation: first.citation.clone(),
                    title: first.case_title.clone(),
                    case_number: first.case_number.clone(),
                    document_url: first.document_url.clone(),
                    chunks: members,
                }
            })
            .collect()
    }
}

//! Chunk: the atom of indexing and retrieval.
//!
//! A Chunk is a bounded-size, header-attributed textual unit of a Case.
//! See the module invariants below.

use serde::{Deserialize, Serialize};

/// A retrievable unit of judgment text with citation-grade metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Storage-assigned identifier; `None` before the chunk is persisted.
    pub id: Option<i64>,
    /// Case citation string, when the source PDF carries one (e.g.
    /// `[2025] 9 S.C.R. 585`). Empty if not extracted.
    pub citation: String,
    /// Case title (`<Party> v. <Party>`), empty if not extracted.
    pub case_title: String,
    /// Case number (e.g. `Civil Appeal No. 1234 of 2024`), empty if not
    /// extracted.
    pub case_number: String,
    /// Section header this chunk was attributed to (e.g. "Held", "Facts").
    pub section: String,
    /// Sequential position of this chunk within its source case
    /// (0-based, traversal order).
    pub chunk_ordinal: usize,
    /// Chunk text body. Never empty.
    pub content: String,
    /// 1-indexed page on which this chunk's text begins.
    pub page_number: u32,
    /// Total pages in the source document.
    pub total_pages: u32,
    /// Canonical stable URL of the source document (`s3://...`).
    pub document_url: String,
    /// Source file name the chunk was ingested from.
    pub source_file: String,
    /// Embedding vector; empty until the ingestion pipeline embeds it.
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Creates a new, not-yet-persisted chunk.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        citation: String,
        case_title: String,
        case_number: String,
        section: String,
        chunk_ordinal: usize,
        content: String,
        page_number: u32,
        total_pages: u32,
        document_url: String,
        source_file: String,
    ) -> Self {
        Self {
            id: None,
            citation,
            case_title,
            case_number,
            section,
            chunk_ordinal,
            content,
            page_number,
            total_pages,
            document_url,
            source_file,
            embedding: Vec::new(),
        }
    }

    /// Computes the grouping key for the case this chunk belongs to:
    /// the citation if non-empty, else title+number.
    #[must_use]
    pub fn case_key(&self) -> super::CaseKey {
        super::CaseKey::from_parts(&self.citation, &self.case_title, &self.case_number)
    }

    /// True if the chunk satisfies the §3 structural invariants
    /// (non-empty body, resolvable url, page number in range).
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.content.trim().is_empty()
            && !self.document_url.is_empty()
            && self.page_number >= 1
            && self.page_number <= self.total_pages.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk() -> Chunk {
        Chunk::new(
            "[2025] 9 S.C.R. 585".to_string(),
            "State v. Singh".to_string(),
            "Criminal Appeal No. 45 of 2024".to_string(),
            "Held".to_string(),
            2,
            "The appeal is allowed.".to_string(),
            3,
            10,
            "s3://bucket/state-v-singh.pdf".to_string(),
            "state-v-singh.pdf".to_string(),
        )
    }

    #[test]
    fn test_new_chunk_has_no_id() {
        let chunk = sample_chunk();
        assert!(chunk.id.is_none());
        assert!(chunk.embedding.is_empty());
    }

    #[test]
    fn test_case_key_prefers_citation() {
        let chunk = sample_chunk();
        assert_eq!(
            chunk.case_key(),
            CaseKeyTestHelper::citation("[2025] 9 S.C.R. 585")
        );
    }

    #[test]
    fn test_well_formed_rejects_empty_body() {
        let mut chunk = sample_chunk();
        chunk.content = "   ".to_string();
        assert!(!chunk.is_well_formed());
    }

    #[test]
    fn test_well_formed_rejects_out_of_range_page() {
        let mut chunk = sample_chunk();
        chunk.page_number = 99;
        assert!(!chunk.is_well_formed());
    }

    #[test]
    fn test_well_formed_accepts_valid_chunk() {
        assert!(sample_chunk().is_well_formed());
    }

    /// Test-only helper so case-key assertions read naturally without
    /// reaching into `CaseKey`'s private constructor choices.
    struct CaseKeyTestHelper;
    impl CaseKeyTestHelper {
        fn citation(s: &str) -> super::super::CaseKey {
            super::super::CaseKey::from_parts(s, "", "")
        }
    }
}

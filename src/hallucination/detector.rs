//! Hallucination detector: extracts legal references from LLM output
//! and validates each against closed statute/article ranges or, for
//! case citations, fuzzy containment in the retrieval corpus.

use std::sync::LazyLock;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{Reference, ReferenceType, Verdict};
use crate::error::Result;
use crate::search::Retriever;

use super::tables::{
    constitution_range_description, is_valid_constitution_article, is_valid_statute_section,
    valid_range_description,
};

static STATUTE_SECTION_OF_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Section\s+(\d+[A-Z]?)\s+(?:of\s+)?(IPC|CrPC|CPC|IT\s?Act|Evidence\s?Act)")
        .unwrap()
});
static CODE_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(IPC|CrPC|CPC|IT\s?Act|Evidence\s?Act)\s+Section\s+(\d+[A-Z]?)\b").unwrap()
});
static ABBREVIATED_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bs\.\s*(\d+[A-Z]?)\s+(IPC|CrPC|CPC|IT\s?Act|Evidence\s?Act)\b").unwrap()
});
static ARTICLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Article\s+(\d+[A-Z]?)(?:\s+of\s+(?:the\s+)?Constitution)?").unwrap()
});
static SCR_CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d{4}\]\s+\d+\s+S\.?C\.?R\.?\s+\d+").unwrap());
static INSC_CITATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\s+INSC\s+\d+\b").unwrap());
static SCC_CITATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\s+SCC\s+\d+\b").unwrap());

fn normalize_code(raw: &str) -> String {
    let compact = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    compact.to_ascii_uppercase()
}

/// Extracts every statute, article, and case-citation reference from
/// `text`, with `verdict = Unknown` pending validation.
#[must_use]
pub fn extract_references(text: &str) -> Vec<Reference> {
    let mut refs = Vec::new();

    for caps in STATUTE_SECTION_OF_CODE.captures_iter(text) {
        push_statute(&mut refs, &caps[0], &caps[1], &caps[2]);
    }
    for caps in CODE_SECTION.captures_iter(text) {
        push_statute(&mut refs, &caps[0], &caps[2], &caps[1]);
    }
    for caps in ABBREVIATED_SECTION.captures_iter(text) {
        push_statute(&mut refs, &caps[0], &caps[1], &caps[2]);
    }
    for caps in ARTICLE_RE.captures_iter(text) {
        refs.push(Reference {
            reference_type: ReferenceType::Article,
            raw_text: caps[0].to_string(),
            parsed_key: caps[1].to_uppercase(),
            verdict: Verdict::Unknown,
            confidence: 0.0,
            reason: String::new(),
        });
    }
    for re in [&*SCR_CITATION_RE, &*INSC_CITATION_RE, &*SCC_CITATION_RE] {
        for m in re.find_iter(text) {
            refs.push(Reference {
                reference_type: ReferenceType::Case,
                raw_text: m.as_str().to_string(),
                parsed_key: m.as_str().to_string(),
                verdict: Verdict::Unknown,
                confidence: 0.0,
                reason: String::new(),
            });
        }
    }

    refs
}

fn push_statute(refs: &mut Vec<Reference>, raw: &str, section: &str, code: &str) {
    refs.push(Reference {
        reference_type: ReferenceType::Statute,
        raw_text: raw.to_string(),
        parsed_key: format!("{}:{}", normalize_code(code), section.to_uppercase()),
        verdict: Verdict::Unknown,
        confidence: 0.0,
        reason: String::new(),
    });
}

/// Validates one reference in place against the closed statute/article
/// tables, or (for case citations) the retrieval corpus.
pub fn validate_reference(reference: &mut Reference, retriever: &dyn Retriever) -> Result<()> {
    match reference.reference_type {
        ReferenceType::Statute => {
            let (code, section) = reference
                .parsed_key
                .split_once(':')
                .unwrap_or((reference.parsed_key.as_str(), ""));
            match is_valid_statute_section(code, section) {
                Some(true) => {
                    reference.verdict = Verdict::Valid;
                    reference.confidence = 0.9;
                    reference.reason = format!("section {section} within valid range for {code}");
                }
                Some(false) => {
                    reference.verdict = Verdict::SuspectedFake;
                    reference.confidence = 0.95;
                    reference.reason = format!(
                        "section {section} outside valid range {} for {code}",
                        valid_range_description(code)
                    );
                }
                None => {
                    reference.verdict = Verdict::Unknown;
                    reference.confidence = 0.0;
                    reference.reason = format!("unsupported statute code: {code}");
                }
            }
        }
        ReferenceType::Article => match is_valid_constitution_article(&reference.parsed_key) {
            Some(true) => {
                reference.verdict = Verdict::Valid;
                reference.confidence = 0.9;
                reference.reason = "article within valid range".to_string();
            }
            Some(false) => {
                reference.verdict = Verdict::SuspectedFake;
                reference.confidence = 0.95;
                reference.reason = format!(
                    "article outside valid range {}",
                    constitution_range_description()
                );
            }
            None => {
                reference.verdict = Verdict::Unknown;
                reference.confidence = 0.0;
                reference.reason = "could not parse article number".to_string();
            }
        },
        ReferenceType::Case => {
            let hits = retriever.retrieve(&reference.raw_text, 20)?;
            let found = hits
                .iter()
                .any(|hit| hit.chunk.citation.contains(reference.raw_text.as_str()));
            if found {
                reference.verdict = Verdict::Valid;
                reference.confidence = 0.9;
                reference.reason = "citation found in vector store".to_string();
            } else {
                reference.verdict = Verdict::SuspectedFake;
                reference.confidence = 0.8;
                reference.reason = "citation not found in vector store".to_string();
            }
        }
    }
    Ok(())
}

/// Aggregate result of running the detector over one piece of LLM
/// output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HallucinationReport {
    pub has_hallucinations: bool,
    pub num_references: usize,
    pub num_suspected: usize,
    pub references: Vec<Reference>,
    pub suspected_fake_refs: Vec<Reference>,
    pub confidence_score: f32,
    pub summary: String,
}

/// Extracts and validates every reference in `text`.
pub fn check(text: &str, retriever: &dyn Retriever) -> Result<HallucinationReport> {
    let mut references = extract_references(text);
    for reference in &mut references {
        validate_reference(reference, retriever)?;
    }

    let suspected_fake_refs: Vec<Reference> = references
        .iter()
        .filter(|r| r.is_suspected_fake())
        .cloned()
        .collect();

    let confidence_score = if suspected_fake_refs.is_empty() {
        1.0
    } else {
        references
            .iter()
            .map(|r| r.confidence)
            .fold(0.0f32, f32::max)
    };

    let summary = if suspected_fake_refs.is_empty() {
        format!("{} reference(s) checked, none suspected fake", references.len())
    } else {
        format!(
            "{} of {} reference(s) suspected fabricated",
            suspected_fake_refs.len(),
            references.len()
        )
    };

    Ok(HallucinationReport {
        has_hallucinations: !suspected_fake_refs.is_empty(),
        num_references: references.len(),
        num_suspected: suspected_fake_refs.len(),
        references,
        suspected_fake_refs,
        confidence_score,
        summary,
    })
}

/// A fallback retriever that never returns a hit, for use when the
/// caller has no case-citation corpus to check against.
pub struct NullRetriever;

impl Retriever for NullRetriever {
    fn retrieve(&self, _query_text: &str, _k: usize) -> Result<Vec<crate::domain::RetrievalHit>> {
        Ok(Vec::new())
    }
}

/// Convenience constructor building an `Arc<dyn Retriever>` wrapping
/// `NullRetriever`.
#[must_use]
pub fn null_retriever() -> Arc<dyn Retriever> {
    Arc::new(NullRetriever)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_statute_section_of_form() {
        let refs = extract_references("The accused was charged under Section 302 of IPC.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].reference_type, ReferenceType::Statute);
        assert_eq!(refs[0].parsed_key, "IPC:302");
    }

    #[test]
    fn test_extract_code_section_form() {
        let refs = extract_references("This falls under IPC Section 420.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].parsed_key, "IPC:420");
    }

    #[test]
    fn test_extract_abbreviated_form() {
        let refs = extract_references("See s. 34 IPC for common intention.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].parsed_key, "IPC:34");
    }

    #[test]
    fn test_extract_article() {
        let refs = extract_references("This engages Article 21 of the Constitution.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].reference_type, ReferenceType::Article);
        assert_eq!(refs[0].parsed_key, "21");
    }

    #[test]
    fn test_extract_case_citation() {
        let refs = extract_references("As held in [2025] 9 S.C.R. 585, the appeal succeeds.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].reference_type, ReferenceType::Case);
    }

    #[test]
    fn test_validate_out_of_range_statute_is_suspected_fake() {
        let mut reference = Reference {
            reference_type: ReferenceType::Statute,
            raw_text: "Section 999 of IPC".to_string(),
            parsed_key: "IPC:999".to_string(),
            verdict: Verdict::Unknown,
            confidence: 0.0,
            reason: String::new(),
        };
        validate_reference(&mut reference, &NullRetriever).unwrap();
        assert_eq!(reference.verdict, Verdict::SuspectedFake);
        assert!((reference.confidence - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_in_range_statute_is_valid() {
        let mut reference = Reference {
            reference_type: ReferenceType::Statute,
            raw_text: "Section 302 of IPC".to_string(),
            parsed_key: "IPC:302".to_string(),
            verdict: Verdict::Unknown,
            confidence: 0.0,
            reason: String::new(),
        };
        validate_reference(&mut reference, &NullRetriever).unwrap();
        assert_eq!(reference.verdict, Verdict::Valid);
    }

    #[test]
    fn test_check_reports_no_hallucinations_for_clean_text() {
        let report = check("This case concerns Article 21 and Section 302 of IPC.", &NullRetriever).unwrap();
        assert!(!report.has_hallucinations);
        assert_eq!(report.confidence_score, 1.0);
    }

    #[test]
    fn test_check_reports_suspected_fake_reference() {
        let report = check("This cites the fictitious Section 999 of IPC.", &NullRetriever).unwrap();
        assert!(report.has_hallucinations);
        assert_eq!(report.num_suspected, 1);
        assert!(report.confidence_score > 0.9);
    }
}

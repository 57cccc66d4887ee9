//! Hallucination audit log record and its writer.

use serde::{Deserialize, Serialize};

use crate::domain::Reference;
use crate::error::Result;
use crate::security::audit::AuditLog;

/// One suspected-fake reference as recorded in the hallucination log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspectedFakeRef {
    #[serde(rename = "type")]
    pub reference_type: String,
    pub text: String,
    pub reason: String,
    pub confidence: f32,
    pub matched_statute: Option<String>,
    pub validated_against_index: Option<bool>,
}

impl From<&Reference> for SuspectedFakeRef {
    fn from(reference: &Reference) -> Self {
        let is_case = reference.reference_type == crate::domain::ReferenceType::Case;
        Self {
            reference_type: format!("{:?}", reference.reference_type).to_lowercase(),
            text: reference.raw_text.clone(),
            reason: reference.reason.clone(),
            confidence: reference.confidence,
            matched_statute: (!is_case).then(|| reference.parsed_key.clone()),
            validated_against_index: is_case.then_some(false),
        }
    }
}

/// Hallucination audit log record. `output_text` is truncated to 500
/// characters before being written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HallucinationAuditRecord {
    pub timestamp: i64,
    pub user_id: String,
    pub suspected_hallucination: bool,
    pub input_query: String,
    pub output_text: String,
    pub suspected_fake_refs: Vec<SuspectedFakeRef>,
    pub confidence_score: f32,
    pub num_suspected: usize,
}

const MAX_OUTPUT_TEXT_LEN: usize = 500;

impl HallucinationAuditRecord {
    #[must_use]
    pub fn new(
        timestamp: i64,
        user_id: &str,
        input_query: &str,
        output_text: &str,
        report: &super::detector::HallucinationReport,
    ) -> Self {
        Self {
            timestamp,
            user_id: user_id.to_string(),
            suspected_hallucination: report.has_hallucinations,
            input_query: input_query.to_string(),
            output_text: truncate(output_text, MAX_OUTPUT_TEXT_LEN),
            suspected_fake_refs: report.suspected_fake_refs.iter().map(SuspectedFakeRef::from).collect(),
            confidence_score: report.confidence_score,
            num_suspected: report.num_suspected,
        }
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut boundary = max_len;
    while boundary > 0 && !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    text[..boundary].to_string()
}

/// Writes a `HallucinationAuditRecord` to the append-only hallucination log.
pub struct HallucinationAuditLog {
    log: AuditLog,
}

impl HallucinationAuditLog {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        Ok(Self {
            log: AuditLog::open(path)?,
        })
    }

    pub fn append(&self, record: &HallucinationAuditRecord) -> Result<()> {
        self.log.append(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_leaves_short_text_unchanged() {
        assert_eq!(truncate("short", 500), "short");
    }

    #[test]
    fn test_truncate_shortens_long_text() {
        let long = "a".repeat(1000);
        assert_eq!(truncate(&long, 500).len(), 500);
    }
}

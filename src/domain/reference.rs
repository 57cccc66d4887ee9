//! Reference: a legal citation extracted from LLM output and validated
//! by the hallucination detector.

use serde::{Deserialize, Serialize};

/// The kind of legal reference extracted from LLM output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// A statute section (e.g. "Section 302 IPC").
    Statute,
    /// A constitutional article (e.g. "Article 21").
    Article,
    /// A case citation (e.g. "[2025] 9 S.C.R. 585").
    Case,
}

/// Validation verdict for a Reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Reference validated against the statute table or the corpus.
    Valid,
    /// Reference could not be validated; likely hallucinated.
    SuspectedFake,
    /// Validation could not be determined (e.g. unsupported statute code).
    Unknown,
}

/// A legal reference extracted from LLM output, with its validation
/// verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    /// The kind of reference.
    pub reference_type: ReferenceType,
    /// The raw matched text (e.g. "Section 999 of IPC").
    pub raw_text: String,
    /// Parsed numeric key (section/article number) or citation key.
    pub parsed_key: String,
    /// Validation verdict.
    pub verdict: Verdict,
    /// Confidence in the verdict, in `[0, 1]`.
    pub confidence: f32,
    /// Human-readable reason for the verdict.
    pub reason: String,
}

impl Reference {
    /// True if this reference is a suspected fabrication.
    #[must_use]
    pub fn is_suspected_fake(&self) -> bool {
        self.verdict == Verdict::SuspectedFake
    }
}

//! PII redactor: detects six PII kinds, replaces each with a stable
//! hash-derived placeholder, and filters legal/organizational false
//! positives.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// One detected span of PII.
#[derive(Debug, Clone)]
pub struct Detection {
    pub kind: String,
    pub original_hash: String,
    pub ordinal: usize,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

/// Result of `redact`.
#[derive(Debug, Clone)]
pub struct RedactionResult {
    pub redacted_text: String,
    pub detections: Vec<Detection>,
    /// Overall confidence: the minimum per-detection confidence, or 1.0
    /// when nothing was redacted.
    pub confidence: f32,
}

/// Phrases and structural headers that suppress a PII match when found
/// as (or immediately around) the candidate value.
const DENYLIST: &[&str] = &[
    "Supreme Court",
    "High Court",
    "State of",
    "Union of",
    "Government of",
    "Ministry of",
    "Petitioner",
    "Respondent",
    "Appellant",
    "v.",
    "vs.",
    "Limited",
    "Ltd",
    "Pvt Ltd",
    "Corporation",
    "Platform",
    "Social Media",
    "Bank",
    "Insurance",
    "Trust",
    "Society",
    "Facts",
    "Arguments",
    "Issues",
    "Legal Issues",
    "Background",
    "Judgment",
    "Order",
    "Relief",
    "Case:",
];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\+91[-\s]?)?\b[6-9]\d{9}\b").unwrap());
static AADHAAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-?\d{4}-?\d{4}\b").unwrap());
static PAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]{5}\d{4}[A-Z]\b").unwrap());
static BANK_ACCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{9,18}\b").unwrap());
static PERSON_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s[A-Z][a-z]+){1,2}\b").unwrap()
});

/// Default confidence for each kind when no finer signal is available.
/// The default emission threshold is 0.7.
fn default_confidence(kind: &str) -> f32 {
    match kind {
        "email" | "aadhaar" | "pan" => 0.95,
        "phone" => 0.9,
        "bank_account" => 0.75,
        "person_name" => 0.72,
        _ => 0.7,
    }
}

/// Redacts all six PII kinds from `text`, skipping matches caught by
/// the denylist, and keeping only detections at or above
/// `confidence_threshold`.
#[must_use]
pub fn redact(text: &str, confidence_threshold: f32) -> RedactionResult {
    let mut raw_matches: Vec<(String, usize, usize, f32)> = Vec::new();

    collect_matches(&EMAIL_RE, text, "email", &mut raw_matches);
    collect_matches(&AADHAAR_RE, text, "aadhaar", &mut raw_matches);
    collect_matches(&PAN_RE, text, "pan", &mut raw_matches);
    collect_matches(&PHONE_RE, text, "phone", &mut raw_matches);
    collect_matches(&PERSON_NAME_RE, text, "person_name", &mut raw_matches);
    collect_matches(&BANK_ACCOUNT_RE, text, "bank_account", &mut raw_matches);

    // Longer/more specific kinds take priority over overlapping shorter
    // ones (e.g. a 12-digit Aadhaar match should not also surface as a
    // bank-account match).
    raw_matches.sort_by(|a, b| a.1.cmp(&b.1).then((b.2 - b.1).cmp(&(a.2 - a.1))));

    let mut accepted: Vec<(String, usize, usize, f32)> = Vec::new();
    let mut covered: Vec<(usize, usize)> = Vec::new();

    for (kind, start, end, confidence) in raw_matches {
        if covered.iter().any(|&(s, e)| start < e && s < end) {
            continue;
        }
        let candidate = &text[start..end];
        if is_denylisted(text, candidate, start, end, &kind) {
            continue;
        }
        if confidence < confidence_threshold {
            continue;
        }
        covered.push((start, end));
        accepted.push((kind, start, end, confidence));
    }

    accepted.sort_by_key(|&(_, start, _, _)| start);

    let mut ordinal_by_kind: HashMap<String, usize> = HashMap::new();
    let mut placeholder_by_hash: HashMap<String, (String, usize)> = HashMap::new();
    let mut detections = Vec::new();
    let mut redacted_text = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut min_confidence = 1.0f32;

    for (kind, start, end, confidence) in accepted {
        redacted_text.push_str(&text[cursor..start]);

        let original = &text[start..end];
        let hash = hex_sha256(original);
        let hash8 = &hash[..8];

        let (placeholder, ordinal) = placeholder_by_hash
            .entry(format!("{kind}:{hash}"))
            .or_insert_with(|| {
                let ordinal = ordinal_by_kind.entry(kind.clone()).or_insert(0);
                *ordinal += 1;
                (format!("[{}_{}_{hash8}]", kind.to_uppercase(), *ordinal), *ordinal)
            })
            .clone();

        redacted_text.push_str(&placeholder);
        min_confidence = min_confidence.min(confidence);

        detections.push(Detection {
            kind: kind.clone(),
            original_hash: hash,
            ordinal,
            start,
            end,
            confidence,
        });

        cursor = end;
    }
    redacted_text.push_str(&text[cursor..]);

    RedactionResult {
        redacted_text,
        confidence: if detections.is_empty() { 1.0 } else { min_confidence },
        detections,
    }
}

fn collect_matches(
    re: &Regex,
    text: &str,
    kind: &str,
    out: &mut Vec<(String, usize, usize, f32)>,
) {
    let confidence = default_confidence(kind);
    for m in re.find_iter(text) {
        out.push((kind.to_string(), m.start(), m.end(), confidence));
    }
}

fn is_denylisted(text: &str, candidate: &str, start: usize, end: usize, kind: &str) -> bool {
    let window_start = text[..start].char_indices().rev().nth(40).map_or(0, |(i, _)| i);
    let window_end = text[end..]
        .char_indices()
        .nth(40)
        .map_or(text.len(), |(i, _)| end + i);
    let context = &text[window_start..window_end];

    if DENYLIST.iter().any(|phrase| candidate.eq_ignore_ascii_case(phrase)) {
        return true;
    }
    if DENYLIST.iter().any(|phrase| context.contains(phrase)) {
        return true;
    }
    // All-caps acronym (e.g. "IPC", "SCR") only suppresses the lexical
    // person-name match; the structured numeric/PAN kinds are digit- or
    // checksum-shaped and must not be filtered by this rule.
    kind == "person_name"
        && candidate.len() > 2
        && candidate.chars().any(char::is_alphabetic)
        && candidate.chars().all(|c| !c.is_alphabetic() || c.is_uppercase())
}

fn hex_sha256(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

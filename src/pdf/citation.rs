//! Citation, title, and case-number extraction from a judgment's first
//! page. Fields that cannot be confidently extracted are
//! left empty, never fabricated.

use regex::Regex;
use std::sync::LazyLock;

/// Citation/title/case-number metadata pulled from a first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMetadata {
    pub citation: String,
    pub case_title: String,
    pub case_number: String,
}

static SCR_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d{4}\]\s+\d+\s+S\.?C\.?R\.?\s+\d+").unwrap());

static INSC_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\s+INSC\s+\d+\b").unwrap());

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.{1,120}?)\s+v(?:s)?\.?\s+(.{1,120})$").unwrap());

static CASE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(Civil Appeal|Criminal Appeal|Writ Petition|SLP|Special Leave Petition|Civil Revision|Criminal Revision)\s+No\.?\s*\d+(?:-[A-Z]+)?\s+of\s+\d{4}",
    )
    .unwrap()
});

/// Extracts citation, title, and case number from a judgment's first
/// page text.
#[must_use]
pub fn extract_metadata(first_page: &str) -> ParsedMetadata {
    ParsedMetadata {
        citation: extract_citation(first_page),
        case_title: extract_title(first_page),
        case_number: extract_case_number(first_page),
    }
}

fn extract_citation(text: &str) -> String {
    // If both an S.C.R. citation and an INSC citation appear on the
    // same line, join them with ':'.
    for line in text.lines() {
        let scr = SCR_CITATION.find(line);
        let insc = INSC_CITATION.find(line);
        match (scr, insc) {
            (Some(a), Some(b)) => return format!("{}:{}", a.as_str(), b.as_str()),
            (Some(a), None) => return a.as_str().to_string(),
            (None, Some(b)) => return b.as_str().to_string(),
            (None, None) => {}
        }
    }
    String::new()
}

fn extract_title(text: &str) -> String {
    let Some(captures) = TITLE.captures(text) else {
        return String::new();
    };
    let left = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
    let right = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    if left.is_empty() || right.is_empty() {
        return String::new();
    }
    format!("{left} v. {right}")
}

fn extract_case_number(text: &str) -> String {
    CASE_NUMBER
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

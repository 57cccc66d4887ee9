//! Input validator: length bounds, prompt-injection / XSS / SQL
//! pattern scans, special-character ratio guard, and file-upload
//! checks.

use std::path::Path;
use std::sync::LazyLock;

use regex::RegexSet;

use crate::config::Config;

/// Result of `validate_text`.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<String>,
    pub risk_score: f32,
}

const RISK_LENGTH: f32 = 0.2;
const RISK_SPECIAL_CHAR: f32 = 0.3;
const RISK_SQL: f32 = 0.4;
const RISK_XSS: f32 = 0.5;
const RISK_PROMPT_INJECTION: f32 = 0.5;

static PROMPT_INJECTION_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)ignore (all )?previous instructions",
        r"(?i)the above( instructions| text| prompt)?",
        r"(?i)/\*\s*SYSTEM\s*\*/",
        r"(?i)---\s*BEGIN SYSTEM\s*---",
        r"(?i)\[SYSTEM\]",
        r"(?i)SYSTEM:",
    ])
    .expect("prompt injection pattern set must compile")
});

static XSS_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)<script[\s>]",
        r"(?i)<iframe[\s>]",
        r"(?i)<svg[^>]*\bonload\b",
        r"(?i)<img[^>]*\bonerror\b",
    ])
    .expect("xss pattern set must compile")
});

static SQL_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bunion\s+select\b",
        r"(?i)\bdrop\s+table\b",
        r"(?i)\bor\s+1\s*=\s*1\b",
        r"(?i)--\s*$",
        r"(?i);\s*delete\s+from\b",
    ])
    .expect("sql pattern set must compile")
});

/// Validates free-text input, in order: length, prompt injection, XSS,
/// SQL, special-character ratio. Violations accumulate; `risk_score`
/// is the clamped sum of each category's weight.
#[must_use]
pub fn validate_text(text: &str, config: &Config) -> ValidationResult {
    let mut violations = Vec::new();
    let mut risk_score = 0.0f32;

    let len = text.chars().count();
    if len < config.input_min_length || len > config.input_max_length {
        violations.push("length".to_string());
        risk_score += RISK_LENGTH;
    }

    if PROMPT_INJECTION_PATTERNS.is_match(text) {
        violations.push("prompt_injection".to_string());
        risk_score += RISK_PROMPT_INJECTION;
    }

    if XSS_PATTERNS.is_match(text) {
        violations.push("xss".to_string());
        risk_score += RISK_XSS;
    }

    if SQL_PATTERNS.is_match(text) {
        violations.push("sql".to_string());
        risk_score += RISK_SQL;
    }

    if exceeds_special_char_ratio(text, config.special_char_ratio) {
        violations.push("special_char_ratio".to_string());
        risk_score += RISK_SPECIAL_CHAR;
    }

    ValidationResult {
        is_valid: violations.is_empty(),
        violations,
        risk_score: risk_score.clamp(0.0, 1.0),
    }
}

fn exceeds_special_char_ratio(text: &str, max_ratio: f32) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let special = text.chars().filter(|c| !c.is_alphanumeric() && !c.is_whitespace()).count();
    (special as f32 / total as f32) > max_ratio
}

/// Result of `validate_file`.
#[derive(Debug, Clone)]
pub struct FileValidationResult {
    pub is_valid: bool,
    pub violations: Vec<String>,
}

/// Validates a PDF upload: extension, size limit, and path traversal.
#[must_use]
pub fn validate_file(path: &Path, size_bytes: u64, config: &Config) -> FileValidationResult {
    let mut violations = Vec::new();

    let extension_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !extension_ok {
        violations.push("extension".to_string());
    }

    if size_bytes > config.file_upload_limit_bytes {
        violations.push("file_size".to_string());
    }

    let has_traversal = path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir));
    if has_traversal {
        violations.push("path_traversal".to_string());
    }

    FileValidationResult {
        is_valid: violations.is_empty(),
        violations,
    }
}

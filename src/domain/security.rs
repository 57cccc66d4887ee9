//! User input record: the output of the security enforcer, written
//! once to the append-only security log.

use serde::{Deserialize, Serialize};

/// Record of one request's pass through the security pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInputRecord {
    /// SHA-256 hex of the original (pre-redaction) text.
    pub original_text_hash: String,
    /// Sanitized (redacted) text.
    pub sanitized_text: String,
    /// PII kinds detected, with counts.
    pub pii_tags: Vec<(String, usize)>,
    /// Validation violations, by category only.
    pub violations: Vec<String>,
    /// Whether the input passed validation.
    pub passed: bool,
    /// Aggregate risk score in `[0, 1]`.
    pub risk_score: f32,
    /// Monotone per-process request id (`REQ_<timestamp>_<seq>`).
    pub request_id: String,
    /// Requesting user id.
    pub user_id: String,
    /// Request timestamp (Unix seconds).
    pub timestamp: i64,
}

//! Security enforcer: runs the input validator then the PII redactor,
//! and writes one append-only security audit record per call.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::domain::UserInputRecord;
use crate::error::Result;

use super::audit::{next_request_id, AuditLog};
use super::redactor::redact;
use super::validator::validate_text;

/// Security audit log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAuditRecord {
    pub timestamp: i64,
    pub request_id: String,
    pub user_id: String,
    pub action: String,
    pub original_input_hash: String,
    pub pii_types_detected: Vec<String>,
    pub num_redactions: usize,
    pub redaction_confidence_score: f32,
    pub validation_passed: bool,
    pub risk_score: f32,
    pub violations: Vec<String>,
    pub ip_address: String,
}

/// Outcome of `SecurityEnforcer::process`.
#[derive(Debug, Clone)]
pub struct EnforcementOutcome {
    pub success: bool,
    pub processed_text: String,
    pub metadata: UserInputRecord,
    pub violations: Vec<String>,
}

/// Runs the input validator then the PII redactor, and appends one
/// audit record per call.
pub struct SecurityEnforcer {
    config: Config,
    audit_log: AuditLog,
}

impl SecurityEnforcer {
    pub fn new(config: Config) -> Result<Self> {
        let audit_path = config.audit_log_dir.join("security.jsonl");
        let audit_log = AuditLog::open(&audit_path)?;
        Ok(Self { config, audit_log })
    }

    /// Runs validation then redaction on `input`, writing a security
    /// audit record regardless of outcome.
    pub fn process(&self, input: &str, user_id: &str, ip: &str, now: i64) -> Result<EnforcementOutcome> {
        let request_id = next_request_id(now);
        let original_hash = hex_sha256(input);
        let validation = validate_text(input, &self.config);

        if !validation.is_valid {
            let record = SecurityAuditRecord {
                timestamp: now,
                request_id: request_id.clone(),
                user_id: user_id.to_string(),
                action: "validate".to_string(),
                original_input_hash: original_hash.clone(),
                pii_types_detected: Vec::new(),
                num_redactions: 0,
                redaction_confidence_score: 1.0,
                validation_passed: false,
                risk_score: validation.risk_score,
                violations: validation.violations.clone(),
                ip_address: ip.to_string(),
            };
            self.audit_log.append(&record)?;
            tracing::warn!(request_id = %request_id, user_id, violations = ?validation.violations, "input failed validation");

            let metadata = UserInputRecord {
                original_text_hash: original_hash,
                sanitized_text: String::new(),
                pii_tags: Vec::new(),
                violations: validation.violations.clone(),
                passed: false,
                risk_score: validation.risk_score,
                request_id,
                user_id: user_id.to_string(),
                timestamp: now,
            };

            return Ok(EnforcementOutcome {
                success: false,
                processed_text: String::new(),
                metadata,
                violations: validation.violations,
            });
        }

        let redaction = redact(input, self.config.pii_confidence_threshold);
        let mut pii_counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
        for detection in &redaction.detections {
            *pii_counts.entry(detection.kind.clone()).or_insert(0) += 1;
        }
        let pii_tags: Vec<(String, usize)> = pii_counts.clone().into_iter().collect();
        let pii_types_detected: Vec<String> = pii_counts.keys().cloned().collect();

        let record = SecurityAuditRecord {
            timestamp: now,
            request_id: request_id.clone(),
            user_id: user_id.to_string(),
            action: "redact".to_string(),
            original_input_hash: original_hash.clone(),
            pii_types_detected,
            num_redactions: redaction.detections.len(),
            redaction_confidence_score: redaction.confidence,
            validation_passed: true,
            risk_score: validation.risk_score,
            violations: Vec::new(),
            ip_address: ip.to_string(),
        };
        self.audit_log.append(&record)?;
        tracing::info!(request_id = %request_id, user_id, num_redactions = redaction.detections.len(), "input validated and redacted");

        let metadata = UserInputRecord {
            original_text_hash: original_hash,
            sanitized_text: redaction.redacted_text.clone(),
            pii_tags,
            violations: Vec::new(),
            passed: true,
            risk_score: validation.risk_score,
            request_id,
            user_id: user_id.to_string(),
            timestamp: now,
        };

        Ok(EnforcementOutcome {
            success: true,
            processed_text: redaction.redacted_text,
            metadata,
            violations: Vec::new(),
        })
    }
}

fn hex_sha256(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

//! Security pipeline: input validator, PII redactor, and the security
//! enforcer that runs them both.

pub mod audit;
pub mod enforcer;
pub mod redactor;
pub mod validator;

pub use enforcer::{EnforcementOutcome, SecurityAuditRecord, SecurityEnforcer};
pub use redactor::{redact, Detection, RedactionResult};
pub use validator::{validate_file, validate_text, FileValidationResult, ValidationResult};

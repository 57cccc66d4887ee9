//! Hallucination detector: reference extraction, validation against
//! closed statute/article tables and the retrieval corpus, and the
//! append-only hallucination audit log.

mod audit;
mod detector;
mod tables;

pub use audit::{HallucinationAuditLog, HallucinationAuditRecord, SuspectedFakeRef};
pub use detector::{check, extract_references, null_retriever, validate_reference, HallucinationReport, NullRetriever};

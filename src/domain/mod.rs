//! Core domain types shared across the ingestion, retrieval, security,
//! and chat layers.

mod case;
mod chunk;
mod hit;
mod reference;
mod security;
mod session;

pub use case::{Case, CaseKey};
pub use chunk::Chunk;
pub use hit::{GroupedCaseHit, RetrievalHit};
pub use reference::{Reference, ReferenceType, Verdict};
pub use security::UserInputRecord;
pub use session::{ChatSession, SessionState, Turn, TurnMetadata, TurnRole};

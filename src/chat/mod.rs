//! Chat engine: session lifecycle and turn routing through retrieval,
//! excerpt enrichment, prompt assembly, and completion, gated by
//! security screening on the way in and annotated by hallucination
//! detection on the way out.

mod engine;

pub use engine::{ChatEngine, ChatResponse, SendMessageError};

//! LLM client: a black-box completion contract with timeout and a
//! deterministic offline fallback, gated behind the `llm-openai`
//! feature the same way the optional semantic embedder is gated.

mod offline;
#[cfg(feature = "llm-openai")]
mod openai;

pub use offline::OfflineLlmClient;
#[cfg(feature = "llm-openai")]
pub use openai::OpenAiLlmClient;

use std::time::Duration;

use crate::error::Result;

/// Minimum connect timeout the client must honor.
pub const MIN_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
/// Minimum read timeout the client must honor.
pub const MIN_READ_TIMEOUT: Duration = Duration::from_secs(120);
/// Upper bound on the per-call timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(180);

/// A request to `LlmClient::complete`.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user_message: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Black-box completion contract. A timeout or provider-side failure
/// surfaces as `LlmError::Unavailable`; callers (the analysis engine
/// and the chat engine) must supply a documented fallback.
pub trait LlmClient: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Builds a production client: the OpenAI-backed implementation when
/// `llm-openai` is enabled, else the deterministic offline fallback.
#[cfg(feature = "llm-openai")]
#[must_use]
pub fn create_client() -> Box<dyn LlmClient> {
    Box::new(OpenAiLlmClient::from_env())
}

#[cfg(not(feature = "llm-openai"))]
#[must_use]
pub fn create_client() -> Box<dyn LlmClient> {
    Box::new(OfflineLlmClient::default())
}

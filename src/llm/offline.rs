//! Deterministic offline `LlmClient`: used by tests and as the
//! always-available fallback when the `llm-openai` feature is off.
//! Never fails — it has no network dependency to time out on.

use super::{CompletionRequest, LlmClient};
use crate::error::Result;

/// Echoes the retrieval context back as a templated Markdown document,
/// matching the output shape the prompt builder asks the real LLM
/// for, so downstream parsing (hallucination detection, chat response
/// assembly) sees a consistent shape in tests and in offline mode.
#[derive(Debug, Default)]
pub struct OfflineLlmClient;

impl LlmClient for OfflineLlmClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        Ok(format!(
            "## Current Case Summary\n\n\
             Offline mode: no LLM provider configured. The following is a \
             direct pass-through of the retrieval context supplied for this query.\n\n\
             ## Similar Precedents Found\n\n\
             {context}\n\n\
             ## Strategic Recommendations\n\n\
             Unavailable in offline mode.\n\n\
             ## All References\n\n\
             See citations listed above.",
            context = request.user_message,
        ))
    }
}

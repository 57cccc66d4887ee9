//! `async-openai`-backed `LlmClient`, gated behind the `llm-openai`
//! feature. The query and chat paths are synchronous, so this client
//! owns a small multi-thread `tokio` runtime and blocks on it per
//! call, the same lazy-singleton pattern used for the optional
//! semantic embedder, another heavyweight optional dependency.

use std::sync::OnceLock;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;

use super::{CompletionRequest, LlmClient};
use crate::error::{Error, LlmError, Result};

static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

fn runtime() -> &'static tokio::runtime::Runtime {
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to start llm client runtime")
    })
}

/// Default chat model used when `LLM_MODEL` is unset.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiLlmClient {
    /// Builds a client from `OPENAI_API_KEY` / `OPENAI_BASE_URL` / `LLM_MODEL`
    /// environment variables, constructed once at startup and injected
    /// as a capability rather than read lazily by callers.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = OpenAIConfig::new();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config = config.with_api_key(key);
        }
        if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
            config = config.with_api_base(base);
        }
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

impl LlmClient for OpenAiLlmClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let timeout = request
            .timeout
            .clamp(super::MIN_READ_TIMEOUT, super::MAX_TIMEOUT);

        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system.clone())
            .build()
            .map_err(|e| Error::Llm(LlmError::Unavailable(e.to_string())))?
            .into();
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_message.clone())
            .build()
            .map_err(|e| Error::Llm(LlmError::Unavailable(e.to_string())))?
            .into();

        let completion_request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .messages(vec![system_message, user_message])
            .build()
            .map_err(|e| Error::Llm(LlmError::Unavailable(e.to_string())))?;

        runtime().block_on(async {
            let call = self.client.chat().create(completion_request);
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(response)) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or_else(|| {
                        Error::Llm(LlmError::Unavailable(
                            "provider returned no completion choices".to_string(),
                        ))
                    }),
                Ok(Err(e)) => Err(Error::Llm(LlmError::Unavailable(e.to_string()))),
                Err(_) => Err(Error::Llm(LlmError::Unavailable(format!(
                    "llm call exceeded {timeout:?} timeout"
                )))),
            }
        })
    }
}

/// Clamps a timeout within the contract bounds, exposed for callers
/// composing a `CompletionRequest` that want to respect §4.10 without
/// reimplementing the clamp.
#[must_use]
pub fn clamp_timeout(timeout: Duration) -> Duration {
    timeout.clamp(super::MIN_READ_TIMEOUT, super::MAX_TIMEOUT)
}

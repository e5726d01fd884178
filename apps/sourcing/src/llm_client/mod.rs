/// LLM Client: the single point of entry for all language-model calls in the sourcing core.
///
/// ARCHITECTURAL RULE: No other module may call a model provider's HTTP API directly.
/// Stages depend on the [`TextGenerator`] capability (or a [`ProviderChain`] of them),
/// never on a concrete provider.
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod anthropic;
pub mod chain;
pub mod openai;
pub mod prompts;

pub use anthropic::AnthropicClient;
pub use chain::{Generated, ProviderChain};
pub use openai::OpenAiClient;

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.3;
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Slowest output rate a request's timeout allows for.
const ASSUMED_TOKENS_PER_SECOND: u64 = 40;
const TIMEOUT_HEADROOM_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Provider-agnostic request. Every adapter maps this onto its own wire format.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask for a bare JSON object where the provider supports it.
    pub json_mode: bool,
    /// Overrides the timeout derived from the output size.
    pub timeout: Option<Duration>,
}

impl LlmRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            json_mode: false,
            timeout: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Timeout for a call that may generate up to `max_tokens`: the explicit override,
    /// or enough time for that output at a slow rate, never under two minutes.
    pub fn timeout_for(&self, max_tokens: u32) -> Duration {
        self.timeout.unwrap_or_else(|| {
            let secs = u64::from(max_tokens) / ASSUMED_TOKENS_PER_SECOND + TIMEOUT_HEADROOM_SECS;
            Duration::from_secs(secs).max(MIN_REQUEST_TIMEOUT)
        })
    }
}

/// The one capability every model provider exposes: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short provider label used in logs and fallback error reports.
    fn name(&self) -> &str;

    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError>;
}

/// Deserializes model output as JSON after stripping markdown code fences.
/// The prompt must instruct the model to return valid JSON.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

use serde::Serialize;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Crate-level error type for every sourcing stage.
///
/// Per-query failures are NOT represented here: they are captured as
/// [`QueryFailure`] values on the stage's telemetry and never abort a batch.
#[derive(Debug, Error)]
pub enum SourcingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Batch of {size} exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Batch integrity error in {stage}: {detail}")]
    BatchIntegrity { stage: &'static str, detail: String },

    #[error("All {} providers failed for {stage}: {}", attempts.len(), describe_attempts(attempts))]
    AllProvidersFailed {
        stage: &'static str,
        attempts: Vec<ProviderAttempt>,
    },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Search provider error: {0}")]
    Search(String),

    #[error("Store error: {0}")]
    Store(String),
}

/// One failed provider attempt inside a fallback chain.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderAttempt {
    pub provider: String,
    pub error: String,
}

/// A single query that failed inside a fan-out. Recorded, never raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    pub query_index: usize,
    pub query: String,
    pub error: String,
}

fn describe_attempts(attempts: &[ProviderAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.provider, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

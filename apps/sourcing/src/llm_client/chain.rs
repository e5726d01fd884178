//! Ordered provider fallback.
//!
//! Providers are tried in order; the first one whose output both arrives and parses is
//! final. Each provider gets exactly one attempt per call (transport-level retries live
//! inside the adapters).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{LlmError, LlmRequest, TextGenerator};
use crate::errors::{ProviderAttempt, SourcingError};

/// A parsed model result plus which provider produced it.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub value: T,
    pub provider: String,
    /// Number of providers called, including the successful one.
    pub calls: usize,
}

#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn TextGenerator>>,
    label: String,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn TextGenerator>>) -> Result<Self, SourcingError> {
        if providers.is_empty() {
            return Err(SourcingError::Config(
                "Provider chain needs at least one language-model provider".to_string(),
            ));
        }
        let label = providers
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(">");
        Ok(Self { providers, label })
    }

    pub fn single(provider: Arc<dyn TextGenerator>) -> Self {
        let label = provider.name().to_string();
        Self {
            providers: vec![provider],
            label,
        }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Calls providers in order until one returns output that `parse` accepts.
    /// A parse rejection counts as a provider failure and moves on to the next provider.
    pub async fn generate_parsed<T, F>(
        &self,
        stage: &'static str,
        request: &LlmRequest,
        parse: F,
    ) -> Result<Generated<T>, SourcingError>
    where
        F: Fn(&str) -> Result<T, String>,
    {
        let mut attempts = Vec::new();

        for (index, provider) in self.providers.iter().enumerate() {
            let outcome = match provider.generate(request).await {
                Ok(text) => parse(&text),
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(value) => {
                    if index > 0 {
                        info!(stage, provider = provider.name(), "Fallback provider succeeded");
                    }
                    return Ok(Generated {
                        value,
                        provider: provider.name().to_string(),
                        calls: index + 1,
                    });
                }
                Err(error) => {
                    warn!(stage, provider = provider.name(), error = %error, "Provider attempt failed");
                    attempts.push(ProviderAttempt {
                        provider: provider.name().to_string(),
                        error,
                    });
                }
            }
        }

        Err(SourcingError::AllProvidersFailed { stage, attempts })
    }
}

#[async_trait]
impl TextGenerator for ProviderChain {
    fn name(&self) -> &str {
        &self.label
    }

    /// Transport-level fallback only: output is returned unparsed.
    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.generate(request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider call failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(LlmError::EmptyContent))
    }
}

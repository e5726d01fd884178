use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::errors::SourcingError;
use crate::llm_client::{AnthropicClient, OpenAiClient, ProviderChain, TextGenerator};
use crate::ranking::PgRankingStore;
use crate::search::SerperClient;

pub const DEFAULT_SKILL_POINT_BUDGET: u32 = 70;
pub const DEFAULT_SEARCH_COST_PER_CALL: f64 = 0.001;
pub const DEFAULT_MIN_QUALITY_PERCENTAGE: u32 = 68;

/// Sourcing configuration, built once at process start and passed by reference into
/// every component. Missing credentials fail here, before any query runs.
#[derive(Debug, Clone)]
pub struct SourcingConfig {
    pub anthropic_api_key: String,
    pub serper_api_key: String,
    /// Fallback provider for strategy generation and skill extraction.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_max_output_tokens: u32,
    /// Enables the Postgres-backed ranking store.
    pub database_url: Option<String>,
    pub skill_point_budget: u32,
    pub search_cost_per_call: f64,
    pub min_quality_percentage: u32,
    pub rust_log: String,
}

impl SourcingConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source. `from_env` passes the process env.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = SourcingConfig {
            anthropic_api_key: require(&lookup, "ANTHROPIC_API_KEY")?,
            serper_api_key: require(&lookup, "SERPER_API_KEY")?,
            openai_api_key: optional(&lookup, "OPENAI_API_KEY"),
            openai_base_url: optional(&lookup, "OPENAI_BASE_URL")
                .unwrap_or_else(|| crate::llm_client::openai::OPENAI_API_URL.to_string()),
            openai_model: optional(&lookup, "OPENAI_MODEL")
                .unwrap_or_else(|| crate::llm_client::openai::DEFAULT_MODEL.to_string()),
            openai_max_output_tokens: parse_or(
                &lookup,
                "OPENAI_MAX_OUTPUT_TOKENS",
                crate::llm_client::openai::DEFAULT_MAX_OUTPUT_TOKENS,
            )?,
            database_url: optional(&lookup, "DATABASE_URL"),
            skill_point_budget: parse_or(&lookup, "SKILL_POINT_BUDGET", DEFAULT_SKILL_POINT_BUDGET)?,
            search_cost_per_call: parse_or(
                &lookup,
                "SEARCH_COST_PER_CALL",
                DEFAULT_SEARCH_COST_PER_CALL,
            )?,
            min_quality_percentage: parse_or(
                &lookup,
                "MIN_QUALITY_PERCENTAGE",
                DEFAULT_MIN_QUALITY_PERCENTAGE,
            )?,
            rust_log: optional(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
        };

        if config.skill_point_budget == 0 {
            bail!("SKILL_POINT_BUDGET must be greater than zero");
        }
        if config.min_quality_percentage > 100 {
            bail!("MIN_QUALITY_PERCENTAGE must be between 0 and 100");
        }
        if config.search_cost_per_call < 0.0 {
            bail!("SEARCH_COST_PER_CALL cannot be negative");
        }

        Ok(config)
    }

    /// Config with the two required credentials and every default.
    pub fn with_keys(anthropic_api_key: &str, serper_api_key: &str) -> Self {
        SourcingConfig {
            anthropic_api_key: anthropic_api_key.to_string(),
            serper_api_key: serper_api_key.to_string(),
            openai_api_key: None,
            openai_base_url: crate::llm_client::openai::OPENAI_API_URL.to_string(),
            openai_model: crate::llm_client::openai::DEFAULT_MODEL.to_string(),
            openai_max_output_tokens: crate::llm_client::openai::DEFAULT_MAX_OUTPUT_TOKENS,
            database_url: None,
            skill_point_budget: DEFAULT_SKILL_POINT_BUDGET,
            search_cost_per_call: DEFAULT_SEARCH_COST_PER_CALL,
            min_quality_percentage: DEFAULT_MIN_QUALITY_PERCENTAGE,
            rust_log: "info".to_string(),
        }
    }

    /// `[anthropic, openai?]` in fallback order.
    pub fn provider_chain(&self) -> Result<ProviderChain, SourcingError> {
        let mut providers: Vec<Arc<dyn TextGenerator>> =
            vec![Arc::new(AnthropicClient::new(self.anthropic_api_key.clone())?)];
        if let Some(key) = &self.openai_api_key {
            let fallback = OpenAiClient::new(key.clone())?
                .with_base_url(&self.openai_base_url)
                .with_model(&self.openai_model)
                .with_max_output_tokens(self.openai_max_output_tokens);
            providers.push(Arc::new(fallback));
        }
        ProviderChain::new(providers)
    }

    pub fn search_provider(&self) -> Result<SerperClient, SourcingError> {
        SerperClient::new(self.serper_api_key.clone())
    }

    /// Postgres-backed ranking store, when `DATABASE_URL` is set.
    pub async fn ranking_store(&self) -> Result<Option<PgRankingStore>> {
        match &self.database_url {
            Some(url) => Ok(Some(PgRankingStore::connect(url).await?)),
            None => Ok(None),
        }
    }
}

fn require<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Result<String> {
    optional(lookup, key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_required_key_fails_fast() {
        let err = SourcingConfig::from_vars(vars(&[("SERPER_API_KEY", "s")])).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let err = SourcingConfig::from_vars(vars(&[
            ("ANTHROPIC_API_KEY", "a"),
            ("SERPER_API_KEY", "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SERPER_API_KEY"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = SourcingConfig::from_vars(vars(&[
            ("ANTHROPIC_API_KEY", "a"),
            ("SERPER_API_KEY", "s"),
        ]))
        .unwrap();
        assert_eq!(config.skill_point_budget, 70);
        assert_eq!(config.min_quality_percentage, 68);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = SourcingConfig::from_vars(vars(&[
            ("ANTHROPIC_API_KEY", "a"),
            ("SERPER_API_KEY", "s"),
            ("SKILL_POINT_BUDGET", "seventy"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SKILL_POINT_BUDGET"));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let result = SourcingConfig::from_vars(vars(&[
            ("ANTHROPIC_API_KEY", "a"),
            ("SERPER_API_KEY", "s"),
            ("SKILL_POINT_BUDGET", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_chain_includes_fallback_when_configured() {
        let mut config = SourcingConfig::with_keys("a", "s");
        assert_eq!(config.provider_chain().unwrap().len(), 1);

        config.openai_api_key = Some("sk".to_string());
        let chain = config.provider_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.name(), "anthropic>openai");
    }
}

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{SearchError, SearchHit, SearchProvider, SearchRequest};
use crate::errors::SourcingError;

const SERPER_URL: &str = "https://google.serper.dev/search";
/// Serper pages top out at 100 organic results.
const MAX_RESULTS_PER_CALL: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

pub struct SerperClient {
    api_key: String,
    client: reqwest::Client,
}

impl SerperClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SourcingError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SourcingError::Config("Serper API key is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourcingError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { api_key, client })
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    fn name(&self) -> &str {
        "serper"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        let num = request.result_count.clamp(1, MAX_RESULTS_PER_CALL);
        info!(query = %request.query, num, "Serper search");

        let body = SerperRequest {
            q: &request.query,
            num,
            location: request.location.as_deref(),
        };

        let response = self
            .client
            .post(SERPER_URL)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: SerperResponse = response.json().await?;
        let hits: Vec<SearchHit> = data
            .organic
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
            })
            .collect();

        info!(query = %request.query, count = hits.len(), "Serper search complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_rejected() {
        assert!(matches!(
            SerperClient::new(" "),
            Err(SourcingError::Config(_))
        ));
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let json = r#"{"organic": [{"link": "https://www.linkedin.com/in/a"}], "credits": 1}"#;
        let data: SerperResponse = serde_json::from_str(json).unwrap();
        assert_eq!(data.organic.len(), 1);
        assert_eq!(data.organic[0].title, "");
    }

    #[test]
    fn test_request_omits_absent_location() {
        let body = SerperRequest {
            q: "cfo",
            num: 10,
            location: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("location").is_none());
        assert_eq!(value["num"], 10);
    }
}

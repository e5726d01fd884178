//! Targeted Query Executor: a small set of high-value competitor queries run in
//! sequential fixed-size batches with a cool-down, for providers with a hard QPS ceiling.
//!
//! Within a batch queries run concurrently; batches never overlap. Each query keeps at
//! most `max_urls_per_query` relevant profile URLs, and the merged list is capped at
//! `max_total_urls`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collector::{fingerprint_from_hit, scoped_query, CandidateFingerprint};
use crate::config::SourcingConfig;
use crate::errors::QueryFailure;
use crate::search::{SearchHit, SearchProvider, SearchRequest};
use crate::telemetry::{estimate_cost, SearchTelemetry};

pub mod merge;

pub use merge::{merge_url_sources, MergedUrl, MergedUrls, SourceContribution};

/// Provider page size requested per targeted query; the relevance filter runs on the
/// full page before the per-query cap applies.
const RESULTS_PER_CALL: usize = 100;
const MIN_TERM_LEN: usize = 3;
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "who", "that", "this", "has", "have", "are", "was",
    "not", "but", "all", "any", "our", "you", "inc", "ltd", "llc",
];

#[derive(Debug, Clone)]
pub struct TargetedOptions {
    pub max_urls_per_query: usize,
    pub max_total_urls: usize,
    pub batch_size: usize,
    pub delay_between_batches: Duration,
    pub location: Option<String>,
}

impl Default for TargetedOptions {
    fn default() -> Self {
        Self {
            max_urls_per_query: 12,
            max_total_urls: 150,
            batch_size: 3,
            delay_between_batches: Duration::from_millis(2000),
            location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub url_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TargetedResult {
    pub per_query: Vec<QueryOutcome>,
    /// Deduplicated, order-preserving, capped.
    pub urls: Vec<String>,
    /// One per entry of `urls`, same order.
    pub fingerprints: Vec<CandidateFingerprint>,
    pub telemetry: SearchTelemetry,
}

pub struct TargetedQueryExecutor {
    search: Arc<dyn SearchProvider>,
    cost_per_call: f64,
}

impl TargetedQueryExecutor {
    pub fn new(search: Arc<dyn SearchProvider>, config: &SourcingConfig) -> Self {
        Self {
            search,
            cost_per_call: config.search_cost_per_call,
        }
    }

    pub async fn execute(&self, queries: &[String], options: &TargetedOptions) -> TargetedResult {
        if queries.is_empty() {
            return TargetedResult::default();
        }
        let batch_size = options.batch_size.max(1);
        let batch_count = queries.len().div_ceil(batch_size);
        info!(
            queries = queries.len(),
            batches = batch_count,
            "Executing targeted queries"
        );

        let mut per_query_hits: Vec<Result<Vec<SearchHit>, String>> = Vec::with_capacity(queries.len());
        for (batch_index, batch) in queries.chunks(batch_size).enumerate() {
            if batch_index > 0 && !options.delay_between_batches.is_zero() {
                debug!(
                    delay_ms = options.delay_between_batches.as_millis() as u64,
                    "Cooling down before next batch"
                );
                tokio::time::sleep(options.delay_between_batches).await;
            }

            let calls = batch.iter().map(|query| {
                let request = SearchRequest {
                    query: scoped_query(query),
                    result_count: RESULTS_PER_CALL,
                    location: options.location.clone(),
                };
                async move { self.search.search(&request).await.map_err(|e| e.to_string()) }
            });
            per_query_hits.extend(join_all(calls).await);
        }

        let mut seen = HashSet::new();
        let mut fingerprints = Vec::new();
        let mut per_query = Vec::with_capacity(queries.len());
        let mut failed_queries = Vec::new();
        let mut total_urls_found = 0;

        for (query_index, (query, outcome)) in queries.iter().zip(per_query_hits).enumerate() {
            let hits = match outcome {
                Ok(hits) => hits,
                Err(error) => {
                    warn!(query = %query, error = %error, "Targeted query failed");
                    failed_queries.push(QueryFailure {
                        query_index,
                        query: query.clone(),
                        error: error.clone(),
                    });
                    per_query.push(QueryOutcome {
                        query: query.clone(),
                        url_count: 0,
                        error: Some(error),
                    });
                    continue;
                }
            };

            let terms = significant_terms(query);
            let relevant: Vec<CandidateFingerprint> = hits
                .iter()
                .filter(|hit| is_relevant(hit, &terms))
                .filter_map(|hit| fingerprint_from_hit(hit, query, options.location.as_deref()))
                .take(options.max_urls_per_query)
                .collect();

            total_urls_found += relevant.len();
            per_query.push(QueryOutcome {
                query: query.clone(),
                url_count: relevant.len(),
                error: None,
            });
            for fingerprint in relevant {
                if seen.insert(fingerprint.url.clone()) {
                    fingerprints.push(fingerprint);
                }
            }
        }

        let unique_urls_after_dedupe = fingerprints.len();
        fingerprints.truncate(options.max_total_urls);
        let urls = fingerprints.iter().map(|f| f.url.clone()).collect::<Vec<_>>();

        let telemetry = SearchTelemetry {
            queries_executed: queries.len(),
            total_queries: queries.len(),
            api_calls_made: queries.len(),
            estimated_cost: estimate_cost(queries.len(), self.cost_per_call),
            total_urls_found,
            unique_urls_after_dedupe,
            final_count: urls.len(),
            failed_queries,
        };

        info!(
            found = telemetry.total_urls_found,
            unique = telemetry.unique_urls_after_dedupe,
            kept = telemetry.final_count,
            failed = telemetry.failed_queries.len(),
            "Targeted queries complete"
        );

        TargetedResult {
            per_query,
            urls,
            fingerprints,
            telemetry,
        }
    }
}

/// Lowercased query words worth matching against a result. Operators, stop-words and
/// very short tokens are excluded.
pub fn significant_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|t| !t.to_ascii_lowercase().starts_with("site:"))
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric() && c != '&')
                .to_lowercase()
        })
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| !matches!(t.as_str(), "and" | "or" | "not"))
        .collect()
}

/// A hit passes when its title or snippet mentions any significant term.
/// Queries with no significant terms keep every hit.
pub fn is_relevant(hit: &SearchHit, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let haystack = format!("{} {}", hit.title, hit.snippet).to_lowercase();
    terms.iter().any(|t| haystack.contains(t.as_str()))
}

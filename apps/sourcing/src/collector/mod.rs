//! Fingerprint Collector: full concurrent fan-out of the primary query plan.
//!
//! Flow: issue every query at once → wait for all → merge in query order (then provider
//! rank) → keep profile URLs → dedupe by canonical URL → apply the total cap.
//!
//! A failing query contributes zero fingerprints and one `QueryFailure`; siblings are
//! unaffected. Because `join_all` yields results in input order, merge order (and
//! therefore truncation) is stable regardless of network timing.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::SourcingConfig;
use crate::errors::QueryFailure;
use crate::search::{SearchHit, SearchProvider, SearchRequest};
use crate::telemetry::{estimate_cost, SearchTelemetry};

pub mod fingerprint;

pub use fingerprint::{fingerprint_from_hit, normalize_profile_url, CandidateFingerprint};

/// Scopes every query to public profile pages.
pub const PROFILE_SITE_FILTER: &str = "site:linkedin.com/in";
pub const DEFAULT_RESULTS_PER_QUERY: usize = 50;

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub location: Option<String>,
    pub results_per_query: usize,
    pub total_candidate_limit: Option<usize>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            location: None,
            results_per_query: DEFAULT_RESULTS_PER_QUERY,
            total_candidate_limit: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectionResult {
    pub fingerprints: Vec<CandidateFingerprint>,
    pub telemetry: SearchTelemetry,
}

pub struct FingerprintCollector {
    search: Arc<dyn SearchProvider>,
    cost_per_call: f64,
}

impl FingerprintCollector {
    pub fn new(search: Arc<dyn SearchProvider>, config: &SourcingConfig) -> Self {
        Self {
            search,
            cost_per_call: config.search_cost_per_call,
        }
    }

    pub async fn collect(&self, queries: &[String], options: &CollectorOptions) -> CollectionResult {
        if queries.is_empty() {
            return CollectionResult::default();
        }

        info!(
            queries = queries.len(),
            provider = self.search.name(),
            "Collecting fingerprints"
        );

        let calls = queries.iter().map(|query| {
            let request = SearchRequest {
                query: scoped_query(query),
                result_count: options.results_per_query,
                location: options.location.clone(),
            };
            async move { self.search.search(&request).await }
        });
        let outcomes = join_all(calls).await;

        let mut seen = HashSet::new();
        let mut fingerprints = Vec::new();
        let mut failed_queries = Vec::new();
        let mut total_urls_found = 0;

        for (query_index, (query, outcome)) in queries.iter().zip(outcomes).enumerate() {
            let hits: Vec<SearchHit> = match outcome {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(query = %query, error = %e, "Search query failed");
                    failed_queries.push(QueryFailure {
                        query_index,
                        query: query.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            for hit in &hits {
                let Some(fingerprint) =
                    fingerprint_from_hit(hit, query, options.location.as_deref())
                else {
                    continue;
                };
                total_urls_found += 1;
                if seen.insert(fingerprint.url.clone()) {
                    fingerprints.push(fingerprint);
                }
            }
        }

        let unique_urls_after_dedupe = fingerprints.len();
        if let Some(limit) = options.total_candidate_limit {
            fingerprints.truncate(limit);
        }

        let telemetry = SearchTelemetry {
            queries_executed: queries.len(),
            total_queries: queries.len(),
            api_calls_made: queries.len(),
            estimated_cost: estimate_cost(queries.len(), self.cost_per_call),
            total_urls_found,
            unique_urls_after_dedupe,
            final_count: fingerprints.len(),
            failed_queries,
        };

        info!(
            found = telemetry.total_urls_found,
            unique = telemetry.unique_urls_after_dedupe,
            kept = telemetry.final_count,
            failed = telemetry.failed_queries.len(),
            cost = telemetry.estimated_cost,
            "Fingerprint collection complete"
        );

        CollectionResult {
            fingerprints,
            telemetry,
        }
    }
}

pub(crate) fn scoped_query(query: &str) -> String {
    format!("{PROFILE_SITE_FILTER} {}", query.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{noise_hit, profile_hit, StubSearch};

    fn queries(list: &[&str]) -> Vec<String> {
        list.iter().map(|q| q.to_string()).collect()
    }

    fn collector(search: StubSearch) -> (FingerprintCollector, Arc<StubSearch>) {
        let search = Arc::new(search);
        let config = SourcingConfig::with_keys("a", "s");
        (FingerprintCollector::new(search.clone(), &config), search)
    }

    fn hits_for(prefix: &str, profiles: usize, noise: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = (0..profiles)
            .map(|i| profile_hit(&format!("{prefix}-{i}"), &format!("Person {i} - CFO - Firm {i}"), ""))
            .collect();
        hits.extend((0..noise).map(|i| noise_hit(&format!("company/{prefix}-{i}"))));
        hits
    }

    #[tokio::test]
    async fn test_failed_query_is_isolated() {
        let search = StubSearch::new()
            .with("CFO M&A one", hits_for("a", 5, 2))
            .failing("CFO M&A two", "provider timeout")
            .with("CFO M&A three", hits_for("b", 5, 2));
        let (collector, _) = collector(search);

        let result = collector
            .collect(
                &queries(&["CFO M&A one", "CFO M&A two", "CFO M&A three"]),
                &CollectorOptions::default(),
            )
            .await;

        assert_eq!(result.fingerprints.len(), 10);
        assert_eq!(result.telemetry.api_calls_made, 3);
        assert_eq!(result.telemetry.failed_queries.len(), 1);
        assert_eq!(result.telemetry.failed_queries[0].query_index, 1);
        assert!(result.telemetry.failed_queries[0].error.contains("provider timeout"));
        assert_eq!(result.telemetry.succeeded_queries(), 2);
        assert!((result.telemetry.estimated_cost - 0.003).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_dedupe_first_occurrence_wins() {
        let shared_variant = SearchHit {
            title: "Later Copy - CFO - Other".to_string(),
            url: "https://www.linkedin.com/in/a-0/?trk=x".to_string(),
            snippet: String::new(),
        };
        let mut second = hits_for("c", 2, 0);
        second.insert(0, shared_variant);
        let search = StubSearch::new()
            .with("first", hits_for("a", 3, 0))
            .with("second", second);
        let (collector, _) = collector(search);

        let result = collector
            .collect(&queries(&["first", "second"]), &CollectorOptions::default())
            .await;

        assert_eq!(result.telemetry.total_urls_found, 6);
        assert_eq!(result.telemetry.unique_urls_after_dedupe, 5);
        let first = &result.fingerprints[0];
        assert_eq!(first.url, "https://www.linkedin.com/in/a-0");
        assert_eq!(first.source_tag, "first");
        assert_eq!(first.name, "Person 0");
    }

    #[tokio::test]
    async fn test_collection_is_idempotent() {
        let build = || {
            StubSearch::new()
                .with("q1", hits_for("a", 4, 1))
                .with("q2", hits_for("a", 4, 1))
                .with("q3", hits_for("b", 3, 0))
        };
        let list = queries(&["q1", "q2", "q3"]);
        let (first, _) = collector(build());
        let (second, _) = collector(build());

        let a = first.collect(&list, &CollectorOptions::default()).await;
        let b = second.collect(&list, &CollectorOptions::default()).await;

        assert_eq!(a.fingerprints, b.fingerprints);
        assert_eq!(a.telemetry, b.telemetry);
        assert_eq!(a.fingerprints.len(), 7);
    }

    #[tokio::test]
    async fn test_total_cap_keeps_first_k_in_merge_order() {
        let search = StubSearch::new()
            .with("q1", hits_for("a", 4, 0))
            .with("q2", hits_for("b", 4, 0));
        let (collector, _) = collector(search);
        let options = CollectorOptions {
            total_candidate_limit: Some(6),
            ..Default::default()
        };

        let result = collector.collect(&queries(&["q1", "q2"]), &options).await;

        let urls: Vec<&str> = result.fingerprints.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.linkedin.com/in/a-0",
                "https://www.linkedin.com/in/a-1",
                "https://www.linkedin.com/in/a-2",
                "https://www.linkedin.com/in/a-3",
                "https://www.linkedin.com/in/b-0",
                "https://www.linkedin.com/in/b-1",
            ]
        );
        assert_eq!(result.telemetry.unique_urls_after_dedupe, 8);
        assert_eq!(result.telemetry.final_count, 6);
    }

    #[tokio::test]
    async fn test_requests_are_site_scoped_with_location() {
        let (collector, search) = collector(StubSearch::new());
        let options = CollectorOptions {
            location: Some("Hong Kong".to_string()),
            results_per_query: 20,
            total_candidate_limit: None,
        };
        collector.collect(&queries(&["CFO Mandarin"]), &options).await;

        let requests = search.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "site:linkedin.com/in CFO Mandarin");
        assert_eq!(requests[0].result_count, 20);
        assert_eq!(requests[0].location.as_deref(), Some("Hong Kong"));
    }

    #[tokio::test]
    async fn test_no_queries_no_calls() {
        let (collector, search) = collector(StubSearch::new());
        let result = collector.collect(&[], &CollectorOptions::default()).await;
        assert_eq!(result.telemetry.api_calls_made, 0);
        assert!(search.requests().is_empty());
    }
}

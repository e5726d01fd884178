//! Cost and yield counters surfaced to every caller of a search stage.

use serde::Serialize;

use crate::errors::QueryFailure;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchTelemetry {
    /// Queries attempted, successful or not.
    pub queries_executed: usize,
    pub total_queries: usize,
    pub api_calls_made: usize,
    pub estimated_cost: f64,
    /// Profile URLs seen before deduplication.
    pub total_urls_found: usize,
    pub unique_urls_after_dedupe: usize,
    /// Entries returned after any total cap.
    pub final_count: usize,
    pub failed_queries: Vec<QueryFailure>,
}

impl SearchTelemetry {
    pub fn succeeded_queries(&self) -> usize {
        self.queries_executed - self.failed_queries.len()
    }
}

/// Calls × fixed unit price, rounded to six decimals.
pub fn estimate_cost(api_calls: usize, cost_per_call: f64) -> f64 {
    (api_calls as f64 * cost_per_call * 1_000_000.0).round() / 1_000_000.0
}

/// Whole-run spend across stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunCost {
    pub search_calls: usize,
    pub llm_calls: usize,
    pub estimated_search_cost: f64,
}

impl RunCost {
    pub fn add_search(&mut self, telemetry: &SearchTelemetry) {
        self.search_calls += telemetry.api_calls_made;
        self.estimated_search_cost =
            ((self.estimated_search_cost + telemetry.estimated_cost) * 1_000_000.0).round()
                / 1_000_000.0;
    }

    pub fn add_llm_calls(&mut self, calls: usize) {
        self.llm_calls += calls;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_cost_is_calls_times_price() {
        assert!((estimate_cost(3, 0.001) - 0.003).abs() < 1e-12);
        assert_eq!(estimate_cost(0, 0.001), 0.0);
    }

    #[test]
    fn test_run_cost_accumulates_search_stages() {
        let mut cost = RunCost::default();
        let primary = SearchTelemetry {
            api_calls_made: 10,
            estimated_cost: estimate_cost(10, 0.001),
            ..Default::default()
        };
        let targeted = SearchTelemetry {
            api_calls_made: 4,
            estimated_cost: estimate_cost(4, 0.001),
            ..Default::default()
        };
        cost.add_search(&primary);
        cost.add_search(&targeted);
        cost.add_llm_calls(2);

        assert_eq!(cost.search_calls, 14);
        assert_eq!(cost.llm_calls, 2);
        assert!((cost.estimated_search_cost - 0.014).abs() < 1e-12);
    }
}

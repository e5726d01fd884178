//! Sourcing run: one role, end to end, up to the enrichment boundary.
//!
//! Flow: extract skills → generate strategy → {collector on primary queries |
//! targeted executor on competitor queries} → merge → score → shortlist.
//!
//! The two search stages run concurrently. Primary results come first in the merge,
//! so a profile found by both keeps the primary query as its source.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::collector::{CandidateFingerprint, CollectorOptions, FingerprintCollector};
use crate::config::SourcingConfig;
use crate::errors::SourcingError;
use crate::llm_client::ProviderChain;
use crate::scoring::{ScoredFingerprint, ScoringReport, SnippetQualityScorer, MAX_BATCH_SIZE};
use crate::search::SearchProvider;
use crate::skills::{extract_hard_skills, HardSkillRequirementSet, RoleNeed};
use crate::strategy::{generate_query_strategy, MultiQueryStrategy, RoleContext};
use crate::targeted::{
    merge_url_sources, MergedUrls, QueryOutcome, TargetedOptions, TargetedQueryExecutor,
};
use crate::telemetry::{RunCost, SearchTelemetry};

pub const PRIMARY_SOURCE: &str = "primary";
pub const TARGETED_SOURCE: &str = "targeted";

#[derive(Debug, Clone)]
pub struct SourcingRequest {
    pub role: RoleContext,
    pub collector: CollectorOptions,
    pub targeted: TargetedOptions,
    /// Cap on the returned shortlist; `None` keeps every fingerprint above threshold.
    pub shortlist_limit: Option<usize>,
}

impl SourcingRequest {
    pub fn new(role: RoleContext) -> Self {
        Self {
            role,
            collector: CollectorOptions::default(),
            targeted: TargetedOptions::default(),
            shortlist_limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourcingRunReport {
    pub skills: HardSkillRequirementSet,
    pub strategy: MultiQueryStrategy,
    pub primary_telemetry: SearchTelemetry,
    pub targeted_telemetry: SearchTelemetry,
    pub targeted_queries: Vec<QueryOutcome>,
    pub merged: MergedUrls,
    /// `None` when there was nothing to score against.
    pub scoring: Option<ScoringReport>,
    pub shortlist: Vec<ScoredFingerprint>,
    pub cost: RunCost,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct SourcingPipeline {
    llm: ProviderChain,
    collector: FingerprintCollector,
    targeted: TargetedQueryExecutor,
    scorer: SnippetQualityScorer,
    skill_point_budget: u32,
    min_quality_percentage: u32,
}

impl SourcingPipeline {
    pub fn new(llm: ProviderChain, search: Arc<dyn SearchProvider>, config: &SourcingConfig) -> Self {
        Self {
            collector: FingerprintCollector::new(search.clone(), config),
            targeted: TargetedQueryExecutor::new(search, config),
            scorer: SnippetQualityScorer::new(Arc::new(llm.clone())),
            llm,
            skill_point_budget: config.skill_point_budget,
            min_quality_percentage: config.min_quality_percentage,
        }
    }

    /// Builds the production adapters from configuration.
    pub fn from_config(config: &SourcingConfig) -> Result<Self, SourcingError> {
        let llm = config.provider_chain()?;
        let search: Arc<dyn SearchProvider> = Arc::new(config.search_provider()?);
        Ok(Self::new(llm, search, config))
    }

    pub async fn run(&self, request: &SourcingRequest) -> Result<SourcingRunReport, SourcingError> {
        let started_at = Utc::now();
        let role = &request.role;
        let mut cost = RunCost::default();
        info!(role = %role.role_title, "Starting sourcing run");

        let need = RoleNeed {
            role_title: role.role_title.clone(),
            industry: role.industry.clone().unwrap_or_default(),
            need_description: role.need_description.clone(),
        };
        let extraction = extract_hard_skills(&need, &self.llm, self.skill_point_budget).await;
        cost.add_llm_calls(extraction.llm_calls);
        let skills = extraction.skills;

        let strategy = generate_query_strategy(role, &skills, &self.llm).await?;
        cost.add_llm_calls(strategy.calls);
        let strategy = strategy.value;

        let collector_options = CollectorOptions {
            location: request.collector.location.clone().or_else(|| role.location.clone()),
            ..request.collector.clone()
        };
        let targeted_options = TargetedOptions {
            location: request.targeted.location.clone().or_else(|| role.location.clone()),
            ..request.targeted.clone()
        };
        let (primary, targeted) = tokio::join!(
            self.collector
                .collect(&strategy.primary_queries, &collector_options),
            self.targeted
                .execute(&strategy.competitor_queries, &targeted_options),
        );
        cost.add_search(&primary.telemetry);
        cost.add_search(&targeted.telemetry);

        let primary_urls: Vec<String> = primary.fingerprints.iter().map(|f| f.url.clone()).collect();
        let merged = merge_url_sources([
            (PRIMARY_SOURCE, primary_urls.as_slice()),
            (TARGETED_SOURCE, targeted.urls.as_slice()),
        ]);

        let mut by_url: HashMap<String, CandidateFingerprint> = HashMap::new();
        for fingerprint in targeted.fingerprints.into_iter().chain(primary.fingerprints) {
            by_url.insert(fingerprint.url.clone(), fingerprint);
        }
        let mut fingerprints: Vec<CandidateFingerprint> = merged
            .urls
            .iter()
            .filter_map(|m| by_url.remove(&m.url))
            .collect();
        if fingerprints.len() > MAX_BATCH_SIZE {
            warn!(
                count = fingerprints.len(),
                max = MAX_BATCH_SIZE,
                "Merged fingerprints exceed one scoring batch, truncating"
            );
            fingerprints.truncate(MAX_BATCH_SIZE);
        }

        let scoring = if skills.is_empty() {
            warn!("No hard skills to score against; skipping snippet scoring");
            None
        } else {
            let report = self
                .scorer
                .score(&fingerprints, &skills, self.min_quality_percentage)
                .await?;
            cost.add_llm_calls(report.api_calls_made);
            Some(report)
        };

        let mut shortlist: Vec<ScoredFingerprint> = scoring
            .as_ref()
            .map(|r| r.shortlist().into_iter().cloned().collect())
            .unwrap_or_default();
        if let Some(limit) = request.shortlist_limit {
            shortlist.truncate(limit);
        }

        info!(
            fingerprints = fingerprints.len(),
            shortlisted = shortlist.len(),
            search_calls = cost.search_calls,
            llm_calls = cost.llm_calls,
            estimated_search_cost = cost.estimated_search_cost,
            "Sourcing run complete"
        );

        Ok(SourcingRunReport {
            skills,
            strategy,
            primary_telemetry: primary.telemetry,
            targeted_telemetry: targeted.telemetry,
            targeted_queries: targeted.per_query,
            merged,
            scoring,
            shortlist,
            cost,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

//! Read-side lookups the ranking engine depends on.
//!
//! `InMemoryRankingStore` serves tests and callers that already hold the data;
//! `PgRankingStore` reads the same shapes from PostgreSQL.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::models::{
    CandidateLearning, CandidateRecord, CandidateRow, CareerPathPattern, CompanyRecord,
    CompanyTierStats,
};
use crate::errors::SourcingError;

#[async_trait]
pub trait RankingStore: Send + Sync {
    async fn candidate(&self, id: Uuid) -> Result<Option<CandidateRecord>, SourcingError>;

    /// Case-insensitive by name.
    async fn company(&self, name: &str) -> Result<Option<CompanyRecord>, SourcingError>;

    async fn candidate_learning(&self, id: Uuid)
        -> Result<Option<CandidateLearning>, SourcingError>;

    /// Stats for whichever of `companies` are known, case-insensitive.
    async fn company_tier_stats(
        &self,
        companies: &[String],
    ) -> Result<Vec<CompanyTierStats>, SourcingError>;

    /// Patterns for one industry, most frequent first.
    async fn career_paths(&self, industry: &str) -> Result<Vec<CareerPathPattern>, SourcingError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct InMemoryRankingStore {
    candidates: HashMap<Uuid, CandidateRecord>,
    companies: HashMap<String, CompanyRecord>,
    learning: HashMap<Uuid, CandidateLearning>,
    tier_stats: HashMap<String, CompanyTierStats>,
    career_paths: Vec<CareerPathPattern>,
}

impl InMemoryRankingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidate(mut self, candidate: CandidateRecord) -> Self {
        self.candidates.insert(candidate.id, candidate);
        self
    }

    pub fn with_company(mut self, company: CompanyRecord) -> Self {
        self.companies.insert(company.name.to_lowercase(), company);
        self
    }

    pub fn with_learning(mut self, learning: CandidateLearning) -> Self {
        self.learning.insert(learning.candidate_id, learning);
        self
    }

    pub fn with_tier_stats(mut self, stats: CompanyTierStats) -> Self {
        self.tier_stats.insert(stats.company_name.to_lowercase(), stats);
        self
    }

    pub fn with_career_path(mut self, pattern: CareerPathPattern) -> Self {
        self.career_paths.push(pattern);
        self
    }
}

#[async_trait]
impl RankingStore for InMemoryRankingStore {
    async fn candidate(&self, id: Uuid) -> Result<Option<CandidateRecord>, SourcingError> {
        Ok(self.candidates.get(&id).cloned())
    }

    async fn company(&self, name: &str) -> Result<Option<CompanyRecord>, SourcingError> {
        Ok(self.companies.get(&name.trim().to_lowercase()).cloned())
    }

    async fn candidate_learning(
        &self,
        id: Uuid,
    ) -> Result<Option<CandidateLearning>, SourcingError> {
        Ok(self.learning.get(&id).cloned())
    }

    async fn company_tier_stats(
        &self,
        companies: &[String],
    ) -> Result<Vec<CompanyTierStats>, SourcingError> {
        Ok(companies
            .iter()
            .filter_map(|c| self.tier_stats.get(&c.trim().to_lowercase()).cloned())
            .collect())
    }

    async fn career_paths(&self, industry: &str) -> Result<Vec<CareerPathPattern>, SourcingError> {
        let mut patterns: Vec<CareerPathPattern> = self
            .career_paths
            .iter()
            .filter(|p| p.industry.eq_ignore_ascii_case(industry.trim()))
            .cloned()
            .collect();
        patterns.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        Ok(patterns)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

/// Creates a PostgreSQL connection pool for the ranking store.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct PgRankingStore {
    pool: PgPool,
}

impl PgRankingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self::new(create_pool(database_url).await?))
    }
}

fn store_error(e: sqlx::Error) -> SourcingError {
    SourcingError::Store(e.to_string())
}

#[async_trait]
impl RankingStore for PgRankingStore {
    async fn candidate(&self, id: Uuid) -> Result<Option<CandidateRecord>, SourcingError> {
        let row = sqlx::query_as::<_, CandidateRow>(
            "SELECT id, name, current_title, current_company, location, open_to_relocation, \
             current_salary, expected_salary, work_history \
             FROM candidates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(row.map(CandidateRecord::from))
    }

    async fn company(&self, name: &str) -> Result<Option<CompanyRecord>, SourcingError> {
        sqlx::query_as::<_, CompanyRecord>(
            "SELECT name, industry, tier FROM companies WHERE lower(name) = lower($1) LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn candidate_learning(
        &self,
        id: Uuid,
    ) -> Result<Option<CandidateLearning>, SourcingError> {
        sqlx::query_as::<_, CandidateLearning>(
            "SELECT candidate_id, interviews, offers, placements, feedback_score \
             FROM candidate_learning WHERE candidate_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn company_tier_stats(
        &self,
        companies: &[String],
    ) -> Result<Vec<CompanyTierStats>, SourcingError> {
        if companies.is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<String> = companies.iter().map(|c| c.trim().to_lowercase()).collect();
        sqlx::query_as::<_, CompanyTierStats>(
            "SELECT company_name, tier, placements, successful_placements \
             FROM company_tier_stats WHERE lower(company_name) = ANY($1)",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn career_paths(&self, industry: &str) -> Result<Vec<CareerPathPattern>, SourcingError> {
        sqlx::query_as::<_, CareerPathPattern>(
            "SELECT industry, from_title, to_title, occurrences, success_rate \
             FROM career_path_patterns WHERE lower(industry) = lower($1) \
             ORDER BY occurrences DESC",
        )
        .bind(industry.trim())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)
    }
}

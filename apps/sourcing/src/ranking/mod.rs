//! Candidate Ranking Engine: blends five sub-scores for an enriched candidate against a
//! job, with a confidence figure for how much of the blend rests on real data.
//!
//! Ranking never fails: learned inputs that are missing (or whose lookup errors) fall
//! back to neutral sub-scores, and an unknown candidate gets the null ranking.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub mod factors;
pub mod models;
pub mod store;

pub use models::{
    CandidateLearning, CandidateRecord, CareerPathPattern, CompanyRecord, CompanyTierStats,
    JobContext, RankedCandidate, ScoreBreakdown, WorkHistoryEntry,
};
pub use store::{InMemoryRankingStore, PgRankingStore, RankingStore};

use factors::Factor;

/// Sub-score weights in percent: tier, career, compensation, geography, success.
pub const WEIGHTS: [u32; 5] = [40, 25, 20, 10, 5];

const BASE_CONFIDENCE: u32 = 40;
/// (strong, weak) confidence points per evidenced sub-score, in `WEIGHTS` order.
const CONFIDENCE_POINTS: [(u32, u32); 5] = [(20, 8), (15, 6), (10, 4), (8, 3), (7, 3)];
/// A sub-score above this counts as strong evidence.
const STRONG_EVIDENCE_ABOVE: f64 = 70.0;

const NULL_SCORE: u32 = 50;
const NULL_CONFIDENCE: u32 = 10;

/// `round(Σ wᵢ·sᵢ)` clamped to 0..=100, in integer arithmetic.
pub fn weighted_final_score(breakdown: &ScoreBreakdown) -> u32 {
    let scores = [
        breakdown.company_tier,
        breakdown.career_path,
        breakdown.compensation,
        breakdown.geography,
        breakdown.success_factors,
    ];
    let total: u32 = scores.iter().zip(WEIGHTS).map(|(s, w)| s * w).sum();
    ((total + 50) / 100).min(100)
}

fn confidence(factors: &[&Factor; 5]) -> u32 {
    let earned: u32 = factors
        .iter()
        .zip(CONFIDENCE_POINTS)
        .filter(|(f, _)| f.has_evidence)
        .map(|(f, (strong, weak))| if f.score > STRONG_EVIDENCE_ABOVE { strong } else { weak })
        .sum();
    (BASE_CONFIDENCE + earned).min(100)
}

fn null_ranking(candidate_id: Uuid, reason: String) -> RankedCandidate {
    RankedCandidate {
        candidate_id,
        final_score: NULL_SCORE,
        confidence_score: NULL_CONFIDENCE,
        breakdown: ScoreBreakdown {
            company_tier: NULL_SCORE,
            career_path: NULL_SCORE,
            compensation: NULL_SCORE,
            geography: NULL_SCORE,
            success_factors: NULL_SCORE,
        },
        reasoning: reason,
    }
}

/// Logs and drops a failed optional lookup.
fn or_missing<T>(result: Result<T, crate::errors::SourcingError>, lookup: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(lookup, error = %e, "Ranking lookup failed, treating as missing");
            None
        }
    }
}

pub struct RankingEngine {
    store: Arc<dyn RankingStore>,
}

impl RankingEngine {
    pub fn new(store: Arc<dyn RankingStore>) -> Self {
        Self { store }
    }

    pub async fn rank(&self, candidate_id: Uuid, job: &JobContext) -> RankedCandidate {
        let (candidate, company, learning) = tokio::join!(
            self.store.candidate(candidate_id),
            self.store.company(&job.target_company),
            self.store.candidate_learning(candidate_id),
        );

        let candidate = match candidate {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                debug!(%candidate_id, "Candidate not found");
                return null_ranking(candidate_id, "Candidate not found".to_string());
            }
            Err(e) => {
                warn!(%candidate_id, error = %e, "Candidate lookup failed");
                return null_ranking(candidate_id, format!("Candidate lookup failed: {e}"));
            }
        };
        let company = or_missing(company, "company").flatten();
        let learning = or_missing(learning, "candidate_learning").flatten();

        let companies = candidate.companies();
        let industry = company.as_ref().and_then(|c| c.industry.clone());
        let (tier_stats, patterns) = tokio::join!(
            async {
                if companies.is_empty() {
                    Ok(Vec::new())
                } else {
                    self.store.company_tier_stats(&companies).await
                }
            },
            async {
                match industry.as_deref() {
                    Some(industry) => self.store.career_paths(industry).await,
                    None => Ok(Vec::new()),
                }
            },
        );
        let tier_stats = or_missing(tier_stats, "company_tier_stats").unwrap_or_default();
        let patterns = or_missing(patterns, "career_paths").unwrap_or_default();

        let tier = factors::company_tier(&tier_stats, company.as_ref().and_then(|c| c.tier));
        let career = factors::career_path(&candidate, job, &patterns);
        let comp = factors::compensation(&candidate, job);
        let geo = factors::geography(&candidate, job);
        let success = factors::success_factors(learning.as_ref());

        let breakdown = ScoreBreakdown {
            company_tier: tier.score.round() as u32,
            career_path: career.score.round() as u32,
            compensation: comp.score.round() as u32,
            geography: geo.score.round() as u32,
            success_factors: success.score.round() as u32,
        };
        let all = [&tier, &career, &comp, &geo, &success];
        let ranked = RankedCandidate {
            candidate_id,
            final_score: weighted_final_score(&breakdown),
            confidence_score: confidence(&all),
            breakdown,
            reasoning: all
                .iter()
                .map(|f| f.note.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        };

        debug!(
            %candidate_id,
            final_score = ranked.final_score,
            confidence = ranked.confidence_score,
            "Candidate ranked"
        );
        ranked
    }

    /// Ranks concurrently, best first. Equal scores keep input order.
    pub async fn rank_many(&self, candidate_ids: &[Uuid], job: &JobContext) -> Vec<RankedCandidate> {
        info!(
            count = candidate_ids.len(),
            target_company = %job.target_company,
            "Ranking candidates"
        );
        let mut ranked = join_all(candidate_ids.iter().map(|id| self.rank(*id, job))).await;
        ranked.sort_by(|a, b| b.final_score.cmp(&a.final_score));
        ranked
    }
}

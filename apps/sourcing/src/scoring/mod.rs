//! Snippet Quality Scorer: predicts how well each fingerprint matches the weighted
//! hard-skill set from its search snippet alone, in one model call per batch.
//!
//! The response is all-or-nothing: every input id must come back exactly once, or the
//! whole call fails with `BatchIntegrity`. Every fingerprint is returned scored; the
//! threshold only drives the `above_threshold` count and [`ScoringReport::shortlist`].

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::collector::CandidateFingerprint;
use crate::errors::SourcingError;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{LlmError, LlmRequest, TextGenerator};
use crate::skills::HardSkillRequirementSet;

pub mod prompts;
pub mod tiers;

pub use tiers::{tier_for_percentage, QualityTier, TierCounts};

use prompts::{SCORING_PREAMBLE, SCORING_PROMPT_TEMPLATE};

pub const MAX_BATCH_SIZE: usize = 800;
const STAGE: &str = "snippet_scoring";
const SCORING_TEMPERATURE: f32 = 0.3;
const BASE_OUTPUT_TOKENS: u32 = 512;
const OUTPUT_TOKENS_PER_CANDIDATE: u32 = 96;
const MAX_OUTPUT_TOKENS: u32 = 64_000;
/// Object keys a model may wrap the score array in.
const WRAPPER_KEYS: &[&str] = &["scores", "results", "candidates", "fingerprints", "items"];

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Case-insensitive; anything unrecognized reads as `Low`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" | "med" | "moderate" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFingerprint {
    #[serde(flatten)]
    pub fingerprint: CandidateFingerprint,
    /// In `[0, budget]`.
    pub predicted_score: f64,
    /// `round(predicted_score / budget * 100)`
    pub predicted_percentage: u32,
    pub confidence: Confidence,
    pub matched_signals: BTreeSet<String>,
    pub rationale: String,
    pub tier: QualityTier,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoringReport {
    /// Same length and order as the input batch.
    pub scored: Vec<ScoredFingerprint>,
    pub tiers: TierCounts,
    pub above_threshold: usize,
    pub threshold_percentage: u32,
    pub api_calls_made: usize,
    /// `None` when no call was made.
    pub provider: Option<String>,
}

impl ScoringReport {
    /// Fingerprints at or above the threshold, best first. Equal scores keep input order.
    pub fn shortlist(&self) -> Vec<&ScoredFingerprint> {
        let mut shortlist: Vec<&ScoredFingerprint> = self
            .scored
            .iter()
            .filter(|s| s.predicted_percentage >= self.threshold_percentage)
            .collect();
        shortlist.sort_by(|a, b| b.predicted_score.total_cmp(&a.predicted_score));
        shortlist
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ScoringInput<'a> {
    id: usize,
    name: &'a str,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    snippet: &'a str,
}

#[derive(Debug, Deserialize)]
struct RawScore {
    id: usize,
    #[serde(rename = "predictedScore", alias = "predicted_score", alias = "score")]
    predicted_score: f64,
    #[serde(default, alias = "matchedSignals", alias = "matched_signals")]
    signals: Vec<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    rationale: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

pub struct SnippetQualityScorer {
    llm: Arc<dyn TextGenerator>,
}

impl SnippetQualityScorer {
    /// Pass a `ProviderChain` for transport-level fallback between providers.
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn score(
        &self,
        fingerprints: &[CandidateFingerprint],
        skills: &HardSkillRequirementSet,
        min_quality_percentage: u32,
    ) -> Result<ScoringReport, SourcingError> {
        if min_quality_percentage > 100 {
            return Err(SourcingError::Invalid(format!(
                "Minimum quality percentage must be 0-100, got {min_quality_percentage}"
            )));
        }
        if fingerprints.is_empty() {
            return Ok(ScoringReport {
                threshold_percentage: min_quality_percentage,
                ..Default::default()
            });
        }
        if fingerprints.len() > MAX_BATCH_SIZE {
            return Err(SourcingError::BatchTooLarge {
                size: fingerprints.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        if skills.is_empty() {
            return Err(SourcingError::Invalid(
                "Cannot score fingerprints against an empty skill set".to_string(),
            ));
        }

        info!(
            count = fingerprints.len(),
            provider = self.llm.name(),
            "Scoring fingerprint batch"
        );

        let request = build_request(fingerprints, skills)?;
        let text = self.llm.generate(&request).await?;
        let raw = parse_scores(&text, fingerprints.len())?;

        let budget = skills.budget();
        let mut tiers = TierCounts::default();
        let scored: Vec<ScoredFingerprint> = fingerprints
            .iter()
            .zip(raw)
            .map(|(fingerprint, raw)| {
                let scored = to_scored(fingerprint.clone(), raw, budget);
                tiers.record(scored.tier);
                scored
            })
            .collect();
        let above_threshold = scored
            .iter()
            .filter(|s| s.predicted_percentage >= min_quality_percentage)
            .count();

        info!(
            scored = scored.len(),
            above_threshold,
            elite = tiers.elite,
            excellent = tiers.excellent,
            good = tiers.good,
            poor = tiers.poor,
            "Batch scoring complete"
        );

        Ok(ScoringReport {
            scored,
            tiers,
            above_threshold,
            threshold_percentage: min_quality_percentage,
            api_calls_made: 1,
            provider: Some(self.llm.name().to_string()),
        })
    }
}

fn build_request(
    fingerprints: &[CandidateFingerprint],
    skills: &HardSkillRequirementSet,
) -> Result<LlmRequest, SourcingError> {
    let skills_block = skills
        .entries()
        .iter()
        .map(|e| format!("- {} ({} points)", e.skill, e.points))
        .collect::<Vec<_>>()
        .join("\n");
    let inputs: Vec<ScoringInput> = fingerprints
        .iter()
        .enumerate()
        .map(|(id, f)| ScoringInput {
            id,
            name: &f.name,
            title: &f.title,
            company: &f.company,
            location: &f.location,
            snippet: &f.snippet,
        })
        .collect();
    let candidates_json = serde_json::to_string_pretty(&inputs).map_err(LlmError::Parse)?;

    let prompt = SCORING_PROMPT_TEMPLATE
        .replace("{budget}", &skills.budget().to_string())
        .replace("{skills_block}", &skills_block)
        .replace("{count}", &fingerprints.len().to_string())
        .replace("{max_id}", &(fingerprints.len() - 1).to_string())
        .replace("{candidates_json}", &candidates_json);

    let max_tokens = BASE_OUTPUT_TOKENS
        .saturating_add(OUTPUT_TOKENS_PER_CANDIDATE.saturating_mul(fingerprints.len() as u32))
        .min(MAX_OUTPUT_TOKENS);

    Ok(LlmRequest::new(json_system(SCORING_PREAMBLE), prompt)
        .max_tokens(max_tokens)
        .temperature(SCORING_TEMPERATURE)
        .json_mode())
}

/// Parses the score array and returns it ordered by id. Fails unless ids cover
/// `0..expected` exactly once.
fn parse_scores(text: &str, expected: usize) -> Result<Vec<RawScore>, SourcingError> {
    let integrity = |detail: String| SourcingError::BatchIntegrity {
        stage: STAGE,
        detail,
    };

    let value: Value =
        crate::llm_client::parse_json(text).map_err(|e| integrity(format!("unparseable response: {e}")))?;
    let array = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| integrity("response object has no score array".to_string()))?,
        _ => return Err(integrity("response is not a JSON array or object".to_string())),
    };

    if array.len() != expected {
        return Err(integrity(format!(
            "expected {expected} scores, got {}",
            array.len()
        )));
    }

    let mut slots: Vec<Option<RawScore>> = (0..expected).map(|_| None).collect();
    for item in array {
        let raw: RawScore = serde_json::from_value(item)
            .map_err(|e| integrity(format!("malformed score entry: {e}")))?;
        let id = raw.id;
        let Some(slot) = slots.get_mut(id) else {
            return Err(integrity(format!("id {id} out of range 0..{expected}")));
        };
        if slot.is_some() {
            return Err(integrity(format!("duplicate id {id}")));
        }
        *slot = Some(raw);
    }

    debug!(count = expected, "Score ids verified");
    // Length matches and no id repeats, so every slot is filled.
    slots
        .into_iter()
        .enumerate()
        .map(|(id, slot)| slot.ok_or_else(|| integrity(format!("missing id {id}"))))
        .collect()
}

fn to_scored(fingerprint: CandidateFingerprint, raw: RawScore, budget: u32) -> ScoredFingerprint {
    let budget_f = f64::from(budget);
    let predicted_score = raw.predicted_score.clamp(0.0, budget_f);
    let predicted_percentage = predicted_percentage(predicted_score, budget);
    let matched_signals = raw
        .signals
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    ScoredFingerprint {
        fingerprint,
        predicted_score,
        predicted_percentage,
        confidence: raw
            .confidence
            .as_deref()
            .map(Confidence::parse_lenient)
            .unwrap_or(Confidence::Low),
        matched_signals,
        rationale: raw.rationale.trim().to_string(),
        tier: tier_for_percentage(predicted_percentage),
    }
}

pub fn predicted_percentage(score: f64, budget: u32) -> u32 {
    if budget == 0 {
        return 0;
    }
    ((score / f64::from(budget)) * 100.0).round().clamp(0.0, 100.0) as u32
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Enriched inputs (owned by the enrichment side, read-only here)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHistoryEntry {
    pub company: String,
    pub title: String,
    #[serde(default)]
    pub years: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: Uuid,
    pub name: String,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    pub location: Option<String>,
    pub open_to_relocation: bool,
    pub current_salary: Option<f64>,
    pub expected_salary: Option<f64>,
    /// Most recent first.
    pub work_history: Vec<WorkHistoryEntry>,
}

impl CandidateRecord {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            current_title: None,
            current_company: None,
            location: None,
            open_to_relocation: false,
            current_salary: None,
            expected_salary: None,
            work_history: Vec::new(),
        }
    }

    /// Current company followed by work-history companies, deduplicated case-insensitively.
    pub fn companies(&self) -> Vec<String> {
        let mut companies: Vec<String> = Vec::new();
        let candidates = self
            .current_company
            .iter()
            .chain(self.work_history.iter().map(|w| &w.company));
        for company in candidates {
            let company = company.trim();
            if company.is_empty() || companies.iter().any(|c| c.eq_ignore_ascii_case(company)) {
                continue;
            }
            companies.push(company.to_string());
        }
        companies
    }
}

/// Row shape of the `candidates` table; `work_history` is a JSONB array.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    pub location: Option<String>,
    pub open_to_relocation: bool,
    pub current_salary: Option<f64>,
    pub expected_salary: Option<f64>,
    pub work_history: Value,
}

impl From<CandidateRow> for CandidateRecord {
    fn from(row: CandidateRow) -> Self {
        let work_history = serde_json::from_value(row.work_history).unwrap_or_else(|e| {
            tracing::warn!(candidate_id = %row.id, error = %e, "Unreadable work history, ignoring");
            Vec::new()
        });
        Self {
            id: row.id,
            name: row.name,
            current_title: row.current_title,
            current_company: row.current_company,
            location: row.location,
            open_to_relocation: row.open_to_relocation,
            current_salary: row.current_salary,
            expected_salary: row.expected_salary,
            work_history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CompanyRecord {
    pub name: String,
    pub industry: Option<String>,
    pub tier: Option<i32>,
}

// ────────────────────────────────────────────────────────────────────────────
// Learned inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CompanyTierStats {
    pub company_name: String,
    /// 1 (best) to 4.
    pub tier: i32,
    pub placements: i32,
    pub successful_placements: i32,
}

impl CompanyTierStats {
    pub fn success_rate(&self) -> Option<f64> {
        (self.placements > 0)
            .then(|| f64::from(self.successful_placements) / f64::from(self.placements))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CareerPathPattern {
    pub industry: String,
    pub from_title: String,
    pub to_title: String,
    pub occurrences: i32,
    /// 0.0 to 1.0.
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CandidateLearning {
    pub candidate_id: Uuid,
    pub interviews: i32,
    pub offers: i32,
    pub placements: i32,
    /// 0 to 100.
    pub feedback_score: Option<f64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Request / result
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobContext {
    pub target_company: String,
    pub target_role: String,
    pub target_salary: Option<f64>,
    pub target_location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub company_tier: u32,
    pub career_path: u32,
    pub compensation: u32,
    pub geography: u32,
    pub success_factors: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub candidate_id: Uuid,
    pub final_score: u32,
    pub confidence_score: u32,
    pub breakdown: ScoreBreakdown,
    pub reasoning: String,
}

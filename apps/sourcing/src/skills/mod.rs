//! Hard-skill requirements: a fixed point budget spread over 4–8 verifiable skills.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod extractor;
pub mod prompts;

pub use extractor::{extract_hard_skills, SkillExtraction};

pub const MIN_SKILLS: usize = 4;
pub const MAX_SKILLS: usize = 8;

/// Free-text hiring need handed to the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleNeed {
    pub role_title: String,
    pub industry: String,
    pub need_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: String,
    pub points: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum SkillSetError {
    #[error("expected {MIN_SKILLS}-{MAX_SKILLS} skills, got {0}")]
    Count(usize),
    #[error("weights sum to {sum}, budget is {budget}")]
    Sum { sum: u32, budget: u32 },
    #[error("duplicate skill '{0}'")]
    Duplicate(String),
    #[error("skill '{0}' has zero weight")]
    ZeroWeight(String),
}

/// Weighted hard-skill set. Either empty, or 4–8 unique skills whose points sum to the
/// budget exactly. Entries are kept heaviest first; ties keep their original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardSkillRequirementSet {
    budget: u32,
    entries: Vec<SkillRequirement>,
}

impl HardSkillRequirementSet {
    /// "No skill-weighted filtering available."
    pub fn empty(budget: u32) -> Self {
        Self {
            budget,
            entries: Vec::new(),
        }
    }

    /// Validates an exact set. Use [`Self::rebalanced`] for model output.
    pub fn new(budget: u32, entries: Vec<SkillRequirement>) -> Result<Self, SkillSetError> {
        if !(MIN_SKILLS..=MAX_SKILLS).contains(&entries.len()) {
            return Err(SkillSetError::Count(entries.len()));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.points == 0 {
                return Err(SkillSetError::ZeroWeight(entry.skill.clone()));
            }
            if entries[..i]
                .iter()
                .any(|e| e.skill.eq_ignore_ascii_case(&entry.skill))
            {
                return Err(SkillSetError::Duplicate(entry.skill.clone()));
            }
        }
        let sum: u32 = entries.iter().map(|e| e.points).sum();
        if sum != budget {
            return Err(SkillSetError::Sum { sum, budget });
        }
        Ok(Self::sorted(budget, entries))
    }

    /// Builds a valid set from loosely weighted labels.
    ///
    /// Blank labels and non-positive weights are dropped, case-insensitive duplicates
    /// merge into the first label, the `MAX_SKILLS` heaviest survive, and weights are
    /// rescaled to the budget with largest-remainder rounding (every entry keeps ≥ 1
    /// point). Fewer than `MIN_SKILLS` survivors yields an empty set.
    pub fn rebalanced(budget: u32, raw: Vec<(String, f64)>) -> Self {
        let mut merged: Vec<(String, f64)> = Vec::new();
        for (label, weight) in raw {
            let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
            if label.is_empty() || !weight.is_finite() || weight <= 0.0 {
                continue;
            }
            match merged
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(&label))
            {
                Some((_, total)) => *total += weight,
                None => merged.push((label, weight)),
            }
        }

        // Stable sort keeps extraction order among equal weights.
        merged.sort_by(|a, b| b.1.total_cmp(&a.1));
        merged.truncate(MAX_SKILLS.min(budget as usize));

        if merged.len() < MIN_SKILLS {
            return Self::empty(budget);
        }

        let points = largest_remainder(budget, &merged.iter().map(|(_, w)| *w).collect::<Vec<_>>());
        let entries = merged
            .into_iter()
            .zip(points)
            .map(|((skill, _), points)| SkillRequirement { skill, points })
            .collect();
        Self::sorted(budget, entries)
    }

    fn sorted(budget: u32, mut entries: Vec<SkillRequirement>) -> Self {
        entries.sort_by(|a, b| b.points.cmp(&a.points));
        Self { budget, entries }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[SkillRequirement] {
        &self.entries
    }

    pub fn total_points(&self) -> u32 {
        self.entries.iter().map(|e| e.points).sum()
    }

    pub fn get(&self, skill: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.skill.eq_ignore_ascii_case(skill))
            .map(|e| e.points)
    }

    /// Labels of the `n` heaviest skills.
    pub fn top_skills(&self, n: usize) -> Vec<&str> {
        self.entries.iter().take(n).map(|e| e.skill.as_str()).collect()
    }
}

/// Distributes `budget` integer points proportionally to `weights`, each ≥ 1.
/// Assumes `budget >= weights.len()`.
fn largest_remainder(budget: u32, weights: &[f64]) -> Vec<u32> {
    let total: f64 = weights.iter().sum();
    let exact: Vec<f64> = weights
        .iter()
        .map(|w| w / total * budget as f64)
        .collect();
    let mut points: Vec<u32> = exact.iter().map(|x| (x.floor() as u32).max(1)).collect();

    let mut assigned: u32 = points.iter().sum();

    // Hand out missing points by descending fractional part (earlier index wins ties).
    let mut by_fraction: Vec<usize> = (0..weights.len()).collect();
    by_fraction.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa)
    });
    let mut cursor = 0;
    while assigned < budget {
        points[by_fraction[cursor % by_fraction.len()]] += 1;
        assigned += 1;
        cursor += 1;
    }

    // Minimum-one bumps can overshoot: take points back from the largest entries.
    while assigned > budget {
        let Some(largest) = (0..points.len())
            .filter(|&i| points[i] > 1)
            .max_by_key(|&i| points[i])
        else {
            break;
        };
        points[largest] -= 1;
        assigned -= 1;
    }

    points
}

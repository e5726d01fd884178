//! The five ranking sub-scores. Each is a pure function of already-fetched inputs and
//! reports whether it had evidence or fell back to its neutral default.

use super::models::{
    CandidateLearning, CandidateRecord, CareerPathPattern, CompanyTierStats, JobContext,
};

pub const NEUTRAL_COMPANY_TIER: f64 = 60.0;
pub const NEUTRAL_CAREER_PATH: f64 = 60.0;
pub const NEUTRAL_COMPENSATION: f64 = 60.0;
pub const NEUTRAL_GEOGRAPHY: f64 = 70.0;
pub const NEUTRAL_SUCCESS: f64 = 50.0;

/// Tier stats only blend in their placement history beyond this many placements.
const MIN_PLACEMENTS_FOR_HISTORY: i32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    /// 0 to 100.
    pub score: f64,
    pub has_evidence: bool,
    pub note: String,
}

impl Factor {
    fn evidenced(score: f64, note: String) -> Self {
        Self {
            score: score.clamp(0.0, 100.0),
            has_evidence: true,
            note,
        }
    }

    fn neutral(score: f64, note: &str) -> Self {
        Self {
            score,
            has_evidence: false,
            note: note.to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Company tier
// ────────────────────────────────────────────────────────────────────────────

fn tier_base(tier: i32) -> f64 {
    match tier {
        1 => 95.0,
        2 => 80.0,
        3 => 65.0,
        4 => 45.0,
        _ => NEUTRAL_COMPANY_TIER,
    }
}

/// Best score across the candidate's known companies. `target_tier` is the hiring
/// company's tier, reported next to the candidate's best.
pub fn company_tier(stats: &[CompanyTierStats], target_tier: Option<i32>) -> Factor {
    let best = stats
        .iter()
        .map(|s| {
            let base = tier_base(s.tier);
            let score = match s.success_rate() {
                Some(rate) if s.placements >= MIN_PLACEMENTS_FOR_HISTORY => {
                    0.7 * base + 0.3 * rate * 100.0
                }
                _ => base,
            };
            (score, s)
        })
        .max_by(|a, b| a.0.total_cmp(&b.0));

    match best {
        Some((score, s)) => {
            let mut note = format!("{} is a tier-{} company", s.company_name, s.tier);
            if let Some(target) = target_tier {
                note.push_str(&format!(" (hiring company is tier-{target})"));
            }
            Factor::evidenced(score, note)
        }
        None => Factor::neutral(NEUTRAL_COMPANY_TIER, "No tier data for candidate's companies"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Career path
// ────────────────────────────────────────────────────────────────────────────

/// Rough seniority rank of a title, higher is more senior.
pub fn seniority_level(title: &str) -> Option<u8> {
    let title = format!(" {} ", title.to_lowercase().replace(['-', ',', '/'], " "));
    let has = |needles: &[&str]| needles.iter().any(|n| title.contains(n));

    if has(&[" chief ", " ceo ", " cfo ", " coo ", " cto ", " cio ", " cmo ", " president ", " partner ", " managing director "]) {
        Some(5)
    } else if has(&[" vp ", " vice president ", " head of ", " svp ", " evp "]) {
        Some(4)
    } else if has(&[" director ", " senior manager ", " principal "]) {
        Some(3)
    } else if has(&[" manager ", " lead ", " controller "]) {
        Some(2)
    } else if has(&[" analyst ", " associate ", " accountant ", " specialist ", " engineer "]) {
        Some(1)
    } else if has(&[" intern ", " trainee ", " assistant "]) {
        Some(0)
    } else {
        None
    }
}

/// Lowercased alphanumeric words.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_words(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// One title's words appear as a contiguous run in the other's: "VP" matches
/// "VP Finance" but not "SVP Finance".
fn titles_match(a: &str, b: &str) -> bool {
    let (a, b) = (words(a), words(b));
    contains_words(&a, &b) || contains_words(&b, &a)
}

pub fn career_path(
    candidate: &CandidateRecord,
    job: &JobContext,
    patterns: &[CareerPathPattern],
) -> Factor {
    let Some(current_title) = candidate.current_title.as_deref() else {
        return Factor::neutral(NEUTRAL_CAREER_PATH, "No current title");
    };

    if let Some(pattern) = patterns.iter().find(|p| {
        titles_match(&p.from_title, current_title) && titles_match(&p.to_title, &job.target_role)
    }) {
        let score = 50.0 + 50.0 * pattern.success_rate.clamp(0.0, 1.0);
        return Factor::evidenced(
            score,
            format!(
                "{} to {} seen {} times ({:.0}% success)",
                pattern.from_title,
                pattern.to_title,
                pattern.occurrences,
                pattern.success_rate * 100.0
            ),
        );
    }

    match (seniority_level(current_title), seniority_level(&job.target_role)) {
        (Some(from), Some(to)) => {
            let (score, note) = match i16::from(to) - i16::from(from) {
                1 => (90.0, "natural step up"),
                0 => (80.0, "lateral move"),
                2 => (60.0, "stretch of two levels"),
                d if d > 2 => (35.0, "large seniority jump"),
                _ => (45.0, "step down in seniority"),
            };
            Factor::evidenced(score, format!("{current_title} to {}: {note}", job.target_role))
        }
        _ => Factor::neutral(NEUTRAL_CAREER_PATH, "No comparable career path"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Compensation
// ────────────────────────────────────────────────────────────────────────────

/// Uplift assumed over current salary when no expectation is recorded.
const ASSUMED_UPLIFT: f64 = 1.1;

pub fn compensation(candidate: &CandidateRecord, job: &JobContext) -> Factor {
    let expected = candidate
        .expected_salary
        .or(candidate.current_salary.map(|c| c * ASSUMED_UPLIFT))
        .filter(|s| *s > 0.0);
    let (Some(target), Some(expected)) = (job.target_salary.filter(|s| *s > 0.0), expected) else {
        return Factor::neutral(NEUTRAL_COMPENSATION, "No salary data");
    };

    let ratio = target / expected;
    let score = if ratio >= 1.1 {
        100.0
    } else if ratio >= 1.0 {
        90.0
    } else if ratio >= 0.9 {
        70.0
    } else if ratio >= 0.8 {
        45.0
    } else {
        20.0
    };
    Factor::evidenced(score, format!("offer covers {:.0}% of expectation", ratio * 100.0))
}

// ────────────────────────────────────────────────────────────────────────────
// Geography
// ────────────────────────────────────────────────────────────────────────────

/// Comma-separated parts, most specific first, each normalized to its words.
fn location_parts(location: &str) -> Vec<Vec<String>> {
    location
        .split(',')
        .map(words)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Same city: either location's first part equals some part of the other.
/// "Kowloon, Hong Kong" is in "Hong Kong"; "India" is not in "Indianapolis, US".
fn same_place(a: &[Vec<String>], b: &[Vec<String>]) -> bool {
    match (a.first(), b.first()) {
        (Some(city_a), Some(city_b)) => b.contains(city_a) || a.contains(city_b),
        _ => false,
    }
}

fn same_region(a: &[Vec<String>], b: &[Vec<String>]) -> bool {
    matches!((a.last(), b.last()), (Some(x), Some(y)) if x == y)
}

pub fn geography(candidate: &CandidateRecord, job: &JobContext) -> Factor {
    let Some(target) = job.target_location.as_deref().filter(|t| !t.trim().is_empty()) else {
        return Factor::neutral(NEUTRAL_GEOGRAPHY, "No target location");
    };
    if target.to_lowercase().contains("remote") {
        return Factor::evidenced(90.0, "remote role".to_string());
    }

    let Some(location) = candidate.location.as_deref().filter(|l| !l.trim().is_empty()) else {
        if candidate.open_to_relocation {
            return Factor::evidenced(65.0, "open to relocation".to_string());
        }
        return Factor::neutral(NEUTRAL_GEOGRAPHY, "No candidate location");
    };

    let (here, there) = (location_parts(location), location_parts(target));
    if same_place(&here, &there) {
        Factor::evidenced(100.0, format!("based in {target}"))
    } else if same_region(&here, &there) {
        Factor::evidenced(75.0, format!("same region as {target}"))
    } else if candidate.open_to_relocation {
        Factor::evidenced(65.0, format!("open to relocating to {target}"))
    } else {
        Factor::evidenced(30.0, format!("{location} is far from {target}"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Success factors
// ────────────────────────────────────────────────────────────────────────────

pub fn success_factors(learning: Option<&CandidateLearning>) -> Factor {
    let Some(learning) = learning else {
        return Factor::neutral(NEUTRAL_SUCCESS, "No placement history");
    };
    let offer_rate = (learning.interviews > 0)
        .then(|| (f64::from(learning.offers) / f64::from(learning.interviews)).min(1.0) * 100.0);

    match (learning.feedback_score, offer_rate) {
        (Some(feedback), Some(rate)) => Factor::evidenced(
            0.7 * feedback + 0.3 * rate,
            format!("feedback {feedback:.0}, offer rate {rate:.0}%"),
        ),
        (Some(feedback), None) => Factor::evidenced(feedback, format!("feedback {feedback:.0}")),
        (None, Some(rate)) => Factor::evidenced(rate, format!("offer rate {rate:.0}%")),
        (None, None) => Factor::neutral(NEUTRAL_SUCCESS, "No placement history"),
    }
}

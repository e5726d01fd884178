//! Fingerprints: cheap, unenriched profile records recovered from search results.
//!
//! Everything here is best-effort string parsing of result titles and snippets; the
//! fallbacks below are what a caller sees when a field cannot be recovered.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::search::SearchHit;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_TITLE: &str = "No title available";
pub const UNKNOWN_COMPANY: &str = "Unknown";
pub const UNKNOWN_LOCATION: &str = "Unknown";

static PROFILE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:[a-z]{2,3}\.|www\.)?linkedin\.com/in/([^/?#\s]+)").unwrap()
});
static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blocation:\s*([^·|\n]+)").unwrap());
/// Separators between name, title and company in a profile result title.
static TITLE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-\x{2013}\x{2014}]\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFingerprint {
    /// Canonical profile URL; the fingerprint's identity.
    pub url: String,
    pub name: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub snippet: String,
    /// Query text that first surfaced this profile.
    pub source_tag: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTitle {
    pub name: String,
    pub title: String,
    pub company: String,
}

/// Canonical `https://www.linkedin.com/in/<slug>` form, or `None` for non-profile URLs.
///
/// Query strings, fragments, trailing slashes, sub-pages and locale subdomains are
/// dropped so every variant of one profile maps to the same key.
pub fn normalize_profile_url(url: &str) -> Option<String> {
    let captures = PROFILE_URL_RE.captures(url.trim())?;
    let slug = captures.get(1)?.as_str().to_lowercase();
    Some(format!("https://www.linkedin.com/in/{slug}"))
}

pub fn is_profile_url(url: &str) -> bool {
    normalize_profile_url(url).is_some()
}

/// Splits "Name - Title - Company | LinkedIn".
///
/// Two-part titles of the form "Name - Title at Company" recover the company from the
/// " at " clause. Missing parts fall back to `UNKNOWN_NAME` / `UNKNOWN_TITLE` /
/// `UNKNOWN_COMPANY`.
pub fn parse_result_title(raw: &str) -> ParsedTitle {
    let head = raw.split('|').next().unwrap_or_default().trim();
    let parts: Vec<&str> = TITLE_SPLIT_RE
        .split(head)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let name = parts.first().copied().unwrap_or(UNKNOWN_NAME);
    let (title, company) = match (parts.get(1), parts.get(2)) {
        (Some(title), Some(company)) => (*title, *company),
        (Some(title), None) => match title.rsplit_once(" at ") {
            Some((role, company)) if !role.trim().is_empty() && !company.trim().is_empty() => {
                (role.trim(), company.trim())
            }
            _ => (*title, UNKNOWN_COMPANY),
        },
        _ => (UNKNOWN_TITLE, UNKNOWN_COMPANY),
    };

    ParsedTitle {
        name: name.to_string(),
        title: title.to_string(),
        company: company.to_string(),
    }
}

/// Reads a "Location: ..." fragment from a result snippet.
pub fn extract_location(snippet: &str) -> Option<String> {
    LOCATION_RE
        .captures(snippet)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().trim_end_matches('.').trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Builds a fingerprint from a search hit, discarding non-profile URLs.
pub fn fingerprint_from_hit(
    hit: &SearchHit,
    source_tag: &str,
    fallback_location: Option<&str>,
) -> Option<CandidateFingerprint> {
    let url = normalize_profile_url(&hit.url)?;
    let parsed = parse_result_title(&hit.title);
    let location = extract_location(&hit.snippet)
        .or_else(|| fallback_location.map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    Some(CandidateFingerprint {
        url,
        name: parsed.name,
        title: parsed.title,
        company: parsed.company,
        location,
        snippet: hit.snippet.trim().to_string(),
        source_tag: source_tag.to_string(),
    })
}

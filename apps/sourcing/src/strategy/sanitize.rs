//! Keyword-query hygiene. Consumer search APIs ignore or misread boolean syntax, so
//! every query leaving this module is a flat keyword string.

use std::collections::HashSet;

const BOOLEAN_TOKENS: &[&str] = &["AND", "OR", "NOT", "&&", "||", "|"];
const EDGE_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?', '\'', '"', '(', ')', '[', ']'];

/// Strips boolean operators, grouping, quotes and search operators; collapses whitespace.
pub fn to_keyword_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .map(|c| match c {
            '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\u{201C}' | '\u{201D}' => ' ',
            other => other,
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| !BOOLEAN_TOKENS.contains(token))
        .filter(|token| !token.to_ascii_lowercase().starts_with("site:"))
        .map(|token| token.trim_start_matches(['-', '+']))
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased whitespace tokens with surrounding punctuation trimmed. Symbols that are
/// part of a term (`M&A`, `C++`, `C#`) are kept.
fn term_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.trim_matches(EDGE_PUNCTUATION).to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// True when every token of `term` appears in `query` as a contiguous run of whole tokens.
/// "Go" is not in "Google"; "CTO" is not in "Director".
pub fn contains_term(query: &str, term: &str) -> bool {
    let needle = term_tokens(term);
    if needle.is_empty() {
        return true;
    }
    term_tokens(query)
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

/// Prepends `lead` and appends each of `terms` when missing (case-insensitive).
pub fn ensure_terms(query: &str, lead: &str, terms: &[&str]) -> String {
    let mut out = if lead.is_empty() || contains_term(query, lead) {
        query.to_string()
    } else if query.is_empty() {
        lead.to_string()
    } else {
        format!("{lead} {query}")
    };
    for term in terms {
        if !term.is_empty() && !contains_term(&out, term) {
            out.push(' ');
            out.push_str(term);
        }
    }
    out.trim().to_string()
}

/// Case-insensitive, order-preserving dedupe that also drops empty strings.
pub fn dedupe_queries(queries: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|q| !q.trim().is_empty())
        .filter(|q| seen.insert(q.to_lowercase()))
        .collect()
}

/// True when a query contains a boolean operator token or grouping.
pub fn has_boolean_syntax(query: &str) -> bool {
    query.contains('(')
        || query.contains(')')
        || query
            .split_whitespace()
            .any(|token| BOOLEAN_TOKENS.contains(&token))
}

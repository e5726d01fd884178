//! Query Strategy Generator: role context + weighted skills → multi-query search plan.
//!
//! Model output is treated as a draft: every query is flattened to keywords, forced to
//! carry the role title and top skills, deduplicated, and topped up or trimmed to the
//! plan's size bounds before it leaves this module.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::SourcingError;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{parse_json, Generated, LlmRequest, ProviderChain};
use crate::skills::HardSkillRequirementSet;

pub mod prompts;
pub mod sanitize;

use prompts::{STRATEGY_PREAMBLE, STRATEGY_PROMPT_TEMPLATE};
use sanitize::{contains_term, dedupe_queries, ensure_terms, to_keyword_query};

pub const MIN_PRIMARY_QUERIES: usize = 8;
pub const MAX_PRIMARY_QUERIES: usize = 15;
pub const MAX_COMPETITOR_QUERIES: usize = 5;
pub const MIN_SOCIAL_QUERIES: usize = 2;
pub const MAX_SOCIAL_QUERIES: usize = 3;

const MAX_OUTPUT_TOKENS: u32 = 2048;
/// Skills every primary query must mention.
const ANCHOR_SKILLS: usize = 2;

/// Deterministic prefixes used when the model returns too few distinct queries.
const TOP_UP_PREFIXES: &[&str] = &[
    "former",
    "experienced",
    "senior",
    "interim",
    "group",
    "regional",
    "global",
    "deputy",
    "lead",
    "head",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleContext {
    pub role_title: String,
    pub industry: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub need_description: String,
}

impl RoleContext {
    /// Peer mapping only makes sense with a company or industry to map from.
    pub fn supports_competitor_mapping(&self) -> bool {
        self.company.as_deref().is_some_and(|c| !c.trim().is_empty())
            || self.industry.as_deref().is_some_and(|i| !i.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiQueryStrategy {
    pub primary_queries: Vec<String>,
    pub competitor_queries: Vec<String>,
    pub social_queries: Vec<String>,
    pub rationale: String,
    pub estimated_coverage: String,
}

/// Wire shape of the strategy-generation contract.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrategyResponse {
    #[serde(default)]
    boolean_queries: Vec<String>,
    #[serde(default)]
    competitor_queries: Vec<String>,
    #[serde(default)]
    x_strategies: Vec<String>,
    #[serde(default)]
    query_rationale: String,
    #[serde(default)]
    estimated_coverage: String,
}

/// Generates the plan with provider fallback. Fails when every provider fails:
/// an empty plan would silently source zero candidates.
pub async fn generate_query_strategy(
    context: &RoleContext,
    skills: &HardSkillRequirementSet,
    llm: &ProviderChain,
) -> Result<Generated<MultiQueryStrategy>, SourcingError> {
    if context.role_title.trim().is_empty() {
        return Err(SourcingError::Invalid("role_title cannot be empty".to_string()));
    }

    let prompt = build_strategy_prompt(context, skills)?;
    let request = LlmRequest::new(json_system(STRATEGY_PREAMBLE), prompt)
        .max_tokens(MAX_OUTPUT_TOKENS)
        .json_mode();

    info!("Generating query strategy for role '{}'", context.role_title);

    let generated = llm
        .generate_parsed("query_strategy", &request, parse_strategy_response)
        .await?;

    let strategy = finalize_strategy(generated.value, context, skills);
    info!(
        provider = %generated.provider,
        primary = strategy.primary_queries.len(),
        competitor = strategy.competitor_queries.len(),
        social = strategy.social_queries.len(),
        "Query strategy ready"
    );

    Ok(Generated {
        value: strategy,
        provider: generated.provider,
        calls: generated.calls,
    })
}

fn build_strategy_prompt(
    context: &RoleContext,
    skills: &HardSkillRequirementSet,
) -> Result<String, SourcingError> {
    let skills_json = serde_json::to_string_pretty(skills.entries())
        .map_err(|e| SourcingError::Invalid(format!("Failed to serialize skills: {e}")))?;
    let top_skills = if skills.is_empty() {
        "(none: use the role title only)".to_string()
    } else {
        skills.top_skills(ANCHOR_SKILLS).join(", ")
    };

    Ok(STRATEGY_PROMPT_TEMPLATE
        .replace("{role_title}", &context.role_title)
        .replace("{industry}", context.industry.as_deref().unwrap_or("not specified"))
        .replace("{company}", context.company.as_deref().unwrap_or("not specified"))
        .replace("{location}", context.location.as_deref().unwrap_or("any"))
        .replace("{need_description}", &context.need_description)
        .replace("{skills_json}", &skills_json)
        .replace("{top_skills}", &top_skills))
}

fn parse_strategy_response(text: &str) -> Result<StrategyResponse, String> {
    let response: StrategyResponse = parse_json(text).map_err(|e| e.to_string())?;
    if response.boolean_queries.iter().all(|q| q.trim().is_empty()) {
        return Err("strategy contained no primary queries".to_string());
    }
    Ok(response)
}

fn finalize_strategy(
    response: StrategyResponse,
    context: &RoleContext,
    skills: &HardSkillRequirementSet,
) -> MultiQueryStrategy {
    let role = to_keyword_query(&context.role_title);
    let role = role.as_str();
    let anchor_terms = anchor_terms(skills);
    let anchors: Vec<&str> = anchor_terms.iter().map(String::as_str).collect();

    let mut primary = dedupe_queries(
        response
            .boolean_queries
            .iter()
            .map(|q| ensure_terms(&to_keyword_query(q), role, &anchors)),
    );
    primary.truncate(MAX_PRIMARY_QUERIES);
    if primary.len() < MIN_PRIMARY_QUERIES {
        debug!(
            returned = primary.len(),
            "Topping up primary queries to the minimum"
        );
        let mut candidates = primary;
        candidates.extend(top_up_primary(context, skills));
        primary = dedupe_queries(candidates);
        primary.truncate(MIN_PRIMARY_QUERIES);
    }

    let competitor = if context.supports_competitor_mapping() {
        let mut queries = dedupe_queries(
            response
                .competitor_queries
                .iter()
                .map(|q| ensure_terms(&to_keyword_query(q), role, &[])),
        );
        queries.retain(|q| !q.eq_ignore_ascii_case(role));
        queries.truncate(MAX_COMPETITOR_QUERIES);
        queries
    } else {
        Vec::new()
    };

    let mut social = dedupe_queries(response.x_strategies.iter().map(|q| q.trim().to_string()));
    social.truncate(MAX_SOCIAL_QUERIES);
    if social.len() < MIN_SOCIAL_QUERIES {
        let mut candidates = social;
        candidates.extend(top_up_social(role, &anchors));
        social = dedupe_queries(candidates);
        social.truncate(MIN_SOCIAL_QUERIES);
    }

    MultiQueryStrategy {
        primary_queries: primary,
        competitor_queries: competitor,
        social_queries: social,
        rationale: response.query_rationale.trim().to_string(),
        estimated_coverage: response.estimated_coverage.trim().to_string(),
    }
}

/// Keyword variants built only from known inputs, in a fixed order.
fn top_up_primary(context: &RoleContext, skills: &HardSkillRequirementSet) -> Vec<String> {
    let role = to_keyword_query(&context.role_title);
    let anchor_terms = anchor_terms(skills);
    let anchors: Vec<&str> = anchor_terms.iter().map(String::as_str).collect();
    let base = ensure_terms("", &role, &anchors);

    let mut variants = vec![base.clone()];
    for entry in skills.entries().iter().skip(ANCHOR_SKILLS) {
        variants.push(format!("{base} {}", entry.skill));
    }
    for extra in [context.industry.as_deref(), context.location.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !contains_term(&base, s))
    {
        variants.push(format!("{base} {extra}"));
    }
    for prefix in TOP_UP_PREFIXES {
        variants.push(format!("{prefix} {base}"));
    }
    variants.iter().map(|v| to_keyword_query(v)).collect()
}

/// Top skills as keyword terms, so inserting them cannot reintroduce boolean syntax.
fn anchor_terms(skills: &HardSkillRequirementSet) -> Vec<String> {
    skills
        .top_skills(ANCHOR_SKILLS)
        .into_iter()
        .map(to_keyword_query)
        .filter(|term| !term.is_empty())
        .collect()
}

fn top_up_social(role: &str, anchors: &[&str]) -> Vec<String> {
    let lead = anchors.first().copied().unwrap_or_default();
    [
        format!("{role} {lead}"),
        format!("{role} {lead} conference speaker"),
        format!("{role} {lead} podcast"),
    ]
    .into_iter()
    .map(|q| q.split_whitespace().collect::<Vec<_>>().join(" "))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::sanitize::has_boolean_syntax;
    use super::*;
    use crate::testing::{cfo_skills, skill_set, ScriptedLlm};
    use std::sync::Arc;

    fn cfo_context() -> RoleContext {
        RoleContext {
            role_title: "CFO".to_string(),
            industry: Some("Private Equity".to_string()),
            company: Some("Harbor Capital".to_string()),
            location: Some("Hong Kong".to_string()),
            need_description: "CFO for a PE-backed portfolio company expanding into China".to_string(),
        }
    }

    const FULL_RESPONSE: &str = r#"{
        "booleanQueries": [
            "(CFO OR \"Chief Financial Officer\") AND M&A AND Mandarin",
            "CFO M&A Mandarin private equity",
            "CFO Mandarin PE fund portfolio company",
            "CFO M&A FP&A China",
            "site:linkedin.com/in CFO cross-border M&A",
            "CFO M&A Mandarin Hong Kong",
            "finance chief M&A Mandarin",
            "CFO M&A Mandarin PE fund FP&A",
            "CFO M&A Mandarin private equity"
        ],
        "competitorQueries": ["CFO KKR portfolio Asia", "Hillhouse portfolio finance lead"],
        "xStrategies": ["CFO cross-border M&A Mandarin", "PE CFO China expansion", "CFO Asia deals", "extra one"],
        "queryRationale": "Anchor on M&A and Mandarin, vary PE context",
        "estimatedCoverage": "Roughly 60% of reachable PE CFOs in Greater China"
    }"#;

    async fn generate(response: &str, context: &RoleContext) -> MultiQueryStrategy {
        let llm = ProviderChain::single(Arc::new(ScriptedLlm::named("primary").reply(response)));
        generate_query_strategy(context, &cfo_skills(), &llm)
            .await
            .unwrap()
            .value
    }

    #[tokio::test]
    async fn test_cfo_strategy_primary_queries_anchor_on_role_and_top_skills() {
        let strategy = generate(FULL_RESPONSE, &cfo_context()).await;

        assert!(strategy.primary_queries.len() >= MIN_PRIMARY_QUERIES);
        assert!(strategy.primary_queries.len() <= MAX_PRIMARY_QUERIES);
        for query in &strategy.primary_queries {
            assert!(query.contains("CFO"), "missing role title: {query}");
            assert!(
                contains_term(query, "M&A") || contains_term(query, "Mandarin"),
                "missing top skill: {query}"
            );
            assert!(!has_boolean_syntax(query), "boolean syntax left in: {query}");
            assert!(!query.contains("site:"));
        }
    }

    #[tokio::test]
    async fn test_duplicate_model_queries_collapse() {
        let strategy = generate(FULL_RESPONSE, &cfo_context()).await;
        let lower: Vec<String> = strategy.primary_queries.iter().map(|q| q.to_lowercase()).collect();
        let unique: std::collections::HashSet<_> = lower.iter().collect();
        assert_eq!(unique.len(), lower.len());
    }

    #[tokio::test]
    async fn test_competitor_and_social_bounds() {
        let strategy = generate(FULL_RESPONSE, &cfo_context()).await;

        assert_eq!(strategy.competitor_queries.len(), 2);
        assert!(strategy.competitor_queries.iter().all(|q| q.contains("CFO")));
        assert_eq!(strategy.social_queries.len(), MAX_SOCIAL_QUERIES);
        assert_eq!(strategy.rationale, "Anchor on M&A and Mandarin, vary PE context");
        assert!(strategy.estimated_coverage.starts_with("Roughly 60%"));
    }

    #[tokio::test]
    async fn test_sparse_response_topped_up_to_minimum() {
        let sparse = r#"{"booleanQueries": ["CFO M&A Mandarin"], "xStrategies": []}"#;
        let strategy = generate(sparse, &cfo_context()).await;

        assert_eq!(strategy.primary_queries.len(), MIN_PRIMARY_QUERIES);
        assert_eq!(strategy.primary_queries[0], "CFO M&A Mandarin");
        assert!(strategy.primary_queries.iter().all(|q| q.contains("CFO")
            && q.contains("M&A")
            && q.contains("Mandarin")));
        assert_eq!(strategy.social_queries.len(), MIN_SOCIAL_QUERIES);
    }

    #[tokio::test]
    async fn test_no_company_or_industry_drops_competitor_queries() {
        let context = RoleContext {
            industry: None,
            company: None,
            ..cfo_context()
        };
        let strategy = generate(FULL_RESPONSE, &context).await;
        assert!(strategy.competitor_queries.is_empty());
    }

    #[tokio::test]
    async fn test_empty_skill_set_enforces_role_title_only() {
        let llm = ProviderChain::single(Arc::new(
            ScriptedLlm::named("primary").reply(r#"{"booleanQueries": ["finance chief Hong Kong"]}"#),
        ));
        let skills = HardSkillRequirementSet::empty(70);
        let strategy = generate_query_strategy(&cfo_context(), &skills, &llm)
            .await
            .unwrap()
            .value;

        assert_eq!(strategy.primary_queries[0], "CFO finance chief Hong Kong");
        assert!(strategy.primary_queries.len() >= MIN_PRIMARY_QUERIES);
        assert!(strategy.primary_queries.iter().all(|q| q.contains("CFO")));
    }

    #[tokio::test]
    async fn test_primary_failure_uses_fallback_result() {
        let primary = Arc::new(ScriptedLlm::named("anthropic").fail("overloaded"));
        let fallback = Arc::new(ScriptedLlm::named("openai").reply(FULL_RESPONSE));
        let llm = ProviderChain::new(vec![primary, fallback]).unwrap();

        let generated = generate_query_strategy(&cfo_context(), &cfo_skills(), &llm)
            .await
            .unwrap();
        assert_eq!(generated.provider, "openai");
        assert_eq!(generated.calls, 2);
    }

    #[tokio::test]
    async fn test_both_providers_failing_is_an_error() {
        let primary = Arc::new(ScriptedLlm::named("anthropic").fail("overloaded"));
        let fallback = Arc::new(ScriptedLlm::named("openai").reply(r#"{"booleanQueries": []}"#));
        let llm = ProviderChain::new(vec![primary, fallback]).unwrap();

        let err = generate_query_strategy(&cfo_context(), &cfo_skills(), &llm)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SourcingError::AllProvidersFailed { stage: "query_strategy", .. }
        ));
    }

    #[tokio::test]
    async fn test_blank_role_rejected_before_any_call() {
        let scripted = Arc::new(ScriptedLlm::named("primary").reply(FULL_RESPONSE));
        let llm = ProviderChain::single(scripted.clone());
        let context = RoleContext {
            role_title: "  ".to_string(),
            ..cfo_context()
        };
        let err = generate_query_strategy(&context, &cfo_skills(), &llm)
            .await
            .unwrap_err();
        assert!(matches!(err, SourcingError::Invalid(_)));
        assert_eq!(scripted.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_queries_truncated_to_fifteen() {
        let queries: Vec<String> = (0..20).map(|i| format!("CFO M&A Mandarin variant{i}")).collect();
        let response = serde_json::json!({ "booleanQueries": queries }).to_string();
        let strategy = generate(&response, &cfo_context()).await;

        assert_eq!(strategy.primary_queries.len(), MAX_PRIMARY_QUERIES);
        assert_eq!(strategy.primary_queries[0], "CFO M&A Mandarin variant0");
        assert_eq!(strategy.primary_queries[14], "CFO M&A Mandarin variant14");
    }

    #[tokio::test]
    async fn test_competitor_queries_capped_at_five() {
        let competitors: Vec<String> = (0..7).map(|i| format!("CFO peer{i} portfolio")).collect();
        let response = serde_json::json!({
            "booleanQueries": ["CFO M&A Mandarin"],
            "competitorQueries": competitors,
        })
        .to_string();
        let strategy = generate(&response, &cfo_context()).await;

        assert_eq!(strategy.competitor_queries.len(), MAX_COMPETITOR_QUERIES);
        assert_eq!(strategy.competitor_queries[4], "CFO peer4 portfolio");
    }

    #[tokio::test]
    async fn test_role_and_skill_tokens_not_satisfied_by_substrings() {
        let llm = ProviderChain::single(Arc::new(ScriptedLlm::named("primary").reply(
            r#"{"booleanQueries": ["Director engineering Go Kubernetes", "CTO Google cloud Kubernetes"]}"#,
        )));
        let context = RoleContext {
            role_title: "CTO".to_string(),
            ..cfo_context()
        };
        let skills = skill_set(&[("Go", 25), ("Kubernetes", 20), ("Rust", 15), ("AWS", 10)]);
        let strategy = generate_query_strategy(&context, &skills, &llm)
            .await
            .unwrap()
            .value;

        assert_eq!(strategy.primary_queries[0], "CTO Director engineering Go Kubernetes");
        assert_eq!(strategy.primary_queries[1], "CTO Google cloud Kubernetes Go");
        for query in &strategy.primary_queries {
            assert!(contains_term(query, "CTO"), "missing role title: {query}");
            assert!(contains_term(query, "Go"), "missing top skill: {query}");
            assert!(contains_term(query, "Kubernetes"), "missing top skill: {query}");
        }
    }

    #[tokio::test]
    async fn test_punctuated_role_title_stays_keyword_only() {
        let context = RoleContext {
            role_title: "Head of Finance (APAC)".to_string(),
            ..cfo_context()
        };
        let sparse = r#"{"booleanQueries": ["finance leader M&A"]}"#;
        let strategy = generate(sparse, &context).await;

        assert_eq!(strategy.primary_queries.len(), MIN_PRIMARY_QUERIES);
        assert_eq!(strategy.primary_queries[0], "Head of Finance APAC finance leader M&A Mandarin");
        for query in &strategy.primary_queries {
            assert!(!has_boolean_syntax(query), "boolean syntax left in: {query}");
            assert!(contains_term(query, "Head of Finance APAC"), "missing role title: {query}");
        }
    }

    #[tokio::test]
    async fn test_boolean_syntax_in_skill_labels_is_flattened() {
        let skills = skill_set(&[
            ("M&A (cross-border)", 25),
            ("Mandarin OR Cantonese", 15),
            ("PE fund", 15),
            ("FP&A", 15),
        ]);
        let llm = ProviderChain::single(Arc::new(
            ScriptedLlm::named("primary").reply(r#"{"booleanQueries": ["CFO Hong Kong"]}"#),
        ));
        let strategy = generate_query_strategy(&cfo_context(), &skills, &llm)
            .await
            .unwrap()
            .value;

        assert_eq!(
            strategy.primary_queries[0],
            "CFO Hong Kong M&A cross-border Mandarin Cantonese"
        );
        assert!(strategy.primary_queries.iter().all(|q| !has_boolean_syntax(q)));
    }

    #[test]
    fn test_prompt_lists_top_skills() {
        let prompt = build_strategy_prompt(&cfo_context(), &cfo_skills()).unwrap();
        assert!(prompt.contains("these top skills: M&A, Mandarin"));
        assert!(prompt.contains("HIRING COMPANY: Harbor Capital"));
    }
}

// All LLM prompt constants for query strategy generation.

/// System preamble for strategy generation. Combine with `json_system`.
pub const STRATEGY_PREAMBLE: &str = "You are a senior sourcing strategist who writes \
    high-yield web search queries for finding candidate profiles.";

/// Strategy prompt template.
/// Replace: {role_title}, {industry}, {company}, {location}, {need_description},
///          {skills_json}, {top_skills}
pub const STRATEGY_PROMPT_TEMPLATE: &str = r#"Build a multi-query sourcing plan for this search.

ROLE: {role_title}
INDUSTRY: {industry}
HIRING COMPANY: {company}
LOCATION: {location}
HIRING NEED:
{need_description}

WEIGHTED HARD SKILLS (points out of the total budget):
{skills_json}

Return a JSON object with this EXACT schema (no extra fields):
{
  "booleanQueries": ["CFO M&A Mandarin private equity"],
  "competitorQueries": ["CFO M&A Mandarin KKR portfolio"],
  "xStrategies": ["CFO cross-border M&A Mandarin"],
  "queryRationale": "Why these queries cover the market",
  "estimatedCoverage": "Rough share of the reachable market these queries cover"
}

HARD RULES:
1. "booleanQueries": 8 to 15 short keyword queries. Despite the field name, use NO boolean syntax: no AND, no OR, no NOT, no parentheses, no quotes, no site: operator
2. EVERY query in booleanQueries contains the role title "{role_title}" and these top skills: {top_skills}
3. Vary the remaining words across queries: other skills, industry terms, seniority, synonyms
4. "competitorQueries": 0 to 5 queries naming peer companies of the hiring company or industry leaders; leave empty when there is no company or industry context
5. "xStrategies": 2 to 3 keyword queries for finding these people through social posts
6. Keep every query under 10 words"#;

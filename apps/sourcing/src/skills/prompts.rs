// All LLM prompt constants for skill extraction.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System preamble for skill extraction. Combine with `json_system`.
pub const SKILL_EXTRACTION_PREAMBLE: &str = "You are an executive search analyst. \
    You convert a hiring need into a short list of weighted, verifiable requirements.";

/// Skill extraction prompt template.
/// Replace: {hard_skills_instruction}, {budget}, {role_title}, {industry}, {need_description}
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = r#"{hard_skills_instruction}

Split exactly {budget} points across 4 to 8 hard-skill requirements for this role.
Weight each requirement by how strongly it separates a qualified candidate from an unqualified one.

ROLE: {role_title}
INDUSTRY: {industry}
HIRING NEED:
{need_description}

Return a JSON object with this EXACT schema (no extra fields):
{
  "skills": [
    {"skill": "M&A execution", "weight": 25},
    {"skill": "Mandarin fluency", "weight": 15}
  ]
}

RULES:
1. 4 to 8 entries, weights are positive integers summing to {budget}
2. Each skill is 1-4 words and could appear verbatim on a profile (e.g. "CPA", "PE fund", "FP&A")
3. Prefer measurable experience ("10+ years audit") over adjectives
4. Do NOT list personality traits, leadership style, or culture fit"#;

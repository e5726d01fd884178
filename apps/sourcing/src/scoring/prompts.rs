// All LLM prompt constants for snippet quality scoring.

/// System preamble for batch scoring. Combine with `json_system`.
pub const SCORING_PREAMBLE: &str = "You are a conservative executive search screener. \
    You score candidates only on what their search snippet explicitly says.";

/// Batch scoring prompt template.
/// Replace: {budget}, {skills_block}, {count}, {max_id}, {candidates_json}
pub const SCORING_PROMPT_TEMPLATE: &str = r#"Score each candidate against these weighted requirements. The weights sum to {budget} points.

REQUIREMENTS:
{skills_block}

CANDIDATES ({count}, ids 0 to {max_id}):
{candidates_json}

For every candidate award each requirement's points only when the title, company or snippet
shows explicit evidence of it. Partial credit is allowed when the evidence is indirect
(e.g. "finance lead at a PE-backed firm" for "PE fund"). NEVER infer information that is
not written. Missing evidence scores zero.

Return a JSON object with this EXACT schema (no extra fields):
{
  "scores": [
    {
      "id": 0,
      "predictedScore": 42,
      "signals": ["M&A execution", "Mandarin fluency"],
      "confidence": "medium",
      "rationale": "Snippet cites two cross-border deals and Mandarin."
    }
  ]
}

RULES:
1. Exactly one entry per candidate id, ids 0 to {max_id}, none skipped or repeated
2. predictedScore is a number from 0 to {budget}
3. signals lists only requirement names with evidence
4. confidence is "high", "medium" or "low" and reflects how much the snippet says
5. rationale is one short sentence"#;

// Shared prompt constants and prompt-building utilities.
// Each stage that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction shared by every prompt that touches skill requirements.
pub const HARD_SKILLS_ONLY_INSTRUCTION: &str = "\
    CRITICAL: Only observable, verifiable attributes count as requirements: technical skills, \
    certifications, language fluency, domain or industry background, and quantifiable experience. \
    NEVER include soft skills such as leadership, culture fit, communication or teamwork.";

/// Joins a role-specific system preamble with the JSON-only fragment.
pub fn json_system(preamble: &str) -> String {
    format!("{preamble} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_appends_fragment() {
        let system = json_system("You are a sourcing analyst.");
        assert!(system.starts_with("You are a sourcing analyst. "));
        assert!(system.ends_with("Do NOT include explanations or apologies."));
    }
}

//! Skill Requirement Extractor: turns a free-text need into a budgeted hard-skill set.
//!
//! Never fails: a provider error or unusable output yields an empty set, which callers
//! read as "no skill-weighted filtering available".

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::prompts::{SKILL_EXTRACTION_PREAMBLE, SKILL_EXTRACTION_PROMPT_TEMPLATE};
use super::{HardSkillRequirementSet, RoleNeed};
use crate::llm_client::prompts::{json_system, HARD_SKILLS_ONLY_INSTRUCTION};
use crate::llm_client::{parse_json, LlmRequest, ProviderChain};

const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Soft-skill vocabulary that never counts as a hard requirement.
const SOFT_SKILL_TERMS: &[&str] = &[
    "leadership",
    "leader",
    "culture",
    "communication",
    "communicator",
    "teamwork",
    "team player",
    "interpersonal",
    "passion",
    "attitude",
    "collaborat",
    "motivat",
    "empathy",
    "emotional intelligence",
    "work ethic",
    "soft skill",
    "personality",
    "people skills",
    "charisma",
    "integrity",
    "adaptab",
    "growth mindset",
    "self-starter",
];

#[derive(Debug, Clone)]
pub struct SkillExtraction {
    pub skills: HardSkillRequirementSet,
    /// Provider that produced the set; `None` when every provider failed.
    pub provider: Option<String>,
    pub llm_calls: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillResponse {
    Wrapped { skills: Vec<RawSkill> },
    Bare(Vec<RawSkill>),
}

#[derive(Debug, Deserialize)]
struct RawSkill {
    #[serde(alias = "label", alias = "name")]
    skill: String,
    #[serde(alias = "points")]
    weight: f64,
}

/// Runs one extraction call (with provider fallback) and normalizes the result.
pub async fn extract_hard_skills(
    need: &RoleNeed,
    llm: &ProviderChain,
    budget: u32,
) -> SkillExtraction {
    let prompt = SKILL_EXTRACTION_PROMPT_TEMPLATE
        .replace("{hard_skills_instruction}", HARD_SKILLS_ONLY_INSTRUCTION)
        .replace("{budget}", &budget.to_string())
        .replace("{role_title}", &need.role_title)
        .replace("{industry}", &need.industry)
        .replace("{need_description}", &need.need_description);
    let request = LlmRequest::new(json_system(SKILL_EXTRACTION_PREAMBLE), prompt)
        .max_tokens(MAX_OUTPUT_TOKENS)
        .json_mode();

    info!("Extracting hard skills for role '{}'", need.role_title);

    let generated = match llm
        .generate_parsed("skill_extraction", &request, parse_skill_response)
        .await
    {
        Ok(generated) => generated,
        Err(e) => {
            warn!(error = %e, "Skill extraction failed; continuing without skill weights");
            return SkillExtraction {
                skills: HardSkillRequirementSet::empty(budget),
                provider: None,
                llm_calls: llm.len(),
            };
        }
    };

    let skills = normalize_skills(generated.value, budget);
    if skills.is_empty() {
        warn!(
            provider = %generated.provider,
            "Extracted skills did not survive normalization; continuing without skill weights"
        );
    } else {
        info!(
            provider = %generated.provider,
            count = skills.len(),
            "Hard skills extracted: {}",
            skills
                .entries()
                .iter()
                .map(|e| format!("{}={}", e.skill, e.points))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    SkillExtraction {
        skills,
        provider: Some(generated.provider),
        llm_calls: generated.calls,
    }
}

fn parse_skill_response(text: &str) -> Result<Vec<(String, f64)>, String> {
    let response: SkillResponse = parse_json(text).map_err(|e| e.to_string())?;
    let raw = match response {
        SkillResponse::Wrapped { skills } | SkillResponse::Bare(skills) => skills,
    };
    if raw.is_empty() {
        return Err("model returned no skills".to_string());
    }
    Ok(raw.into_iter().map(|r| (r.skill, r.weight)).collect())
}

fn normalize_skills(raw: Vec<(String, f64)>, budget: u32) -> HardSkillRequirementSet {
    let hard: Vec<(String, f64)> = raw
        .into_iter()
        .filter(|(label, _)| {
            let soft = is_soft_skill(label);
            if soft {
                debug!("Dropping soft skill '{label}'");
            }
            !soft
        })
        .collect();
    HardSkillRequirementSet::rebalanced(budget, hard)
}

pub fn is_soft_skill(label: &str) -> bool {
    let lower = label.to_lowercase();
    SOFT_SKILL_TERMS.iter().any(|term| lower.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::{MAX_SKILLS, MIN_SKILLS};
    use crate::testing::ScriptedLlm;
    use std::sync::Arc;

    fn need() -> RoleNeed {
        RoleNeed {
            role_title: "CFO".to_string(),
            industry: "Private Equity".to_string(),
            need_description: "Portfolio-company CFO with cross-border deal experience".to_string(),
        }
    }

    fn chain(llm: ScriptedLlm) -> ProviderChain {
        ProviderChain::single(Arc::new(llm))
    }

    #[test]
    fn test_soft_skill_detection() {
        assert!(is_soft_skill("Strong Leadership"));
        assert!(is_soft_skill("culture fit"));
        assert!(is_soft_skill("Cross-functional collaboration"));
        assert!(!is_soft_skill("M&A"));
        assert!(!is_soft_skill("Mandarin fluency"));
    }

    #[tokio::test]
    async fn test_extraction_sums_to_budget() {
        let llm = chain(ScriptedLlm::named("primary").reply(
            r#"{"skills": [
                {"skill": "M&A", "weight": 25},
                {"skill": "Mandarin", "weight": 15},
                {"skill": "PE fund", "weight": 15},
                {"skill": "FP&A", "weight": 15}
            ]}"#,
        ));
        let extraction = extract_hard_skills(&need(), &llm, 70).await;

        assert_eq!(extraction.skills.total_points(), 70);
        assert_eq!(extraction.skills.len(), 4);
        assert_eq!(extraction.skills.get("M&A"), Some(25));
        assert_eq!(extraction.provider.as_deref(), Some("primary"));
        assert_eq!(extraction.llm_calls, 1);
    }

    #[tokio::test]
    async fn test_soft_skills_removed_and_weights_rebalanced() {
        let llm = chain(ScriptedLlm::named("primary").reply(
            r#"[
                {"skill": "Leadership", "weight": 20},
                {"skill": "IFRS", "weight": 10},
                {"skill": "CPA", "weight": 10},
                {"skill": "Treasury", "weight": 10},
                {"skill": "Culture fit", "weight": 10},
                {"skill": "SAP S/4HANA", "weight": 10}
            ]"#,
        ));
        let extraction = extract_hard_skills(&need(), &llm, 70).await;
        let skills = extraction.skills;

        assert_eq!(skills.len(), 4);
        assert!(skills.get("Leadership").is_none());
        assert!(skills.get("Culture fit").is_none());
        assert_eq!(skills.total_points(), 70);
        assert!((MIN_SKILLS..=MAX_SKILLS).contains(&skills.len()));
    }

    #[tokio::test]
    async fn test_unparseable_output_yields_empty_set() {
        let llm = chain(ScriptedLlm::named("primary").reply("I think they need M&A skills."));
        let extraction = extract_hard_skills(&need(), &llm, 70).await;

        assert!(extraction.skills.is_empty());
        assert!(extraction.provider.is_none());
    }

    #[tokio::test]
    async fn test_empty_list_yields_empty_set() {
        let llm = chain(ScriptedLlm::named("primary").reply(r#"{"skills": []}"#));
        let extraction = extract_hard_skills(&need(), &llm, 70).await;
        assert!(extraction.skills.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_carries_budget_and_role() {
        let scripted = Arc::new(ScriptedLlm::named("primary").reply("[]"));
        let llm = ProviderChain::single(scripted.clone());
        extract_hard_skills(&need(), &llm, 70).await;

        let request = scripted.last_request().unwrap();
        assert!(request.prompt.contains("Split exactly 70 points"));
        assert!(request.prompt.contains("ROLE: CFO"));
        assert!(request.json_mode);
        assert!(request.system.contains("valid JSON only"));
    }
}

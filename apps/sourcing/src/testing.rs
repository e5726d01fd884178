//! Test doubles for the provider seams.
//!
//! - `ScriptedLlm`: queued text replies or failures, with a call log
//! - `StubSearch`: canned hits (or a failure) per query, with a request log

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collector::{fingerprint_from_hit, CandidateFingerprint};
use crate::llm_client::{LlmError, LlmRequest, TextGenerator};
use crate::search::{SearchError, SearchHit, SearchProvider, SearchRequest};
use crate::skills::{HardSkillRequirementSet, SkillRequirement};

// --- ScriptedLlm ---

pub struct ScriptedLlm {
    name: String,
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<LlmRequest>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, error: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Err(error.into()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<LlmRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Api {
                status: 500,
                message,
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}

// --- StubSearch ---

/// Matches a request when its query ends with the registered query text,
/// so site-scoped queries still hit the fixture registered for the bare query.
/// Unmatched queries get the fallback hits, or nothing.
pub struct StubSearch {
    responses: Vec<(String, Result<Vec<SearchHit>, String>)>,
    fallback: Vec<SearchHit>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl StubSearch {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            fallback: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.responses.push((query.to_string(), Ok(hits)));
        self
    }

    pub fn failing(mut self, query: &str, error: &str) -> Self {
        self.responses.push((query.to_string(), Err(error.to_string())));
        self
    }

    pub fn otherwise(mut self, hits: Vec<SearchHit>) -> Self {
        self.fallback = hits;
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        self.requests.lock().unwrap().push(request.clone());
        let matched = self
            .responses
            .iter()
            .find(|(query, _)| request.query.ends_with(query.as_str()));
        match matched {
            Some((_, Ok(hits))) => Ok(hits.clone()),
            Some((_, Err(message))) => Err(SearchError::Other(message.clone())),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// A LinkedIn-style profile hit.
pub fn profile_hit(slug: &str, title: &str, snippet: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        url: format!("https://www.linkedin.com/in/{slug}"),
        snippet: snippet.to_string(),
    }
}

/// A hit whose URL is not a profile page.
pub fn noise_hit(path: &str) -> SearchHit {
    SearchHit {
        title: "Careers".to_string(),
        url: format!("https://www.linkedin.com/{path}"),
        snippet: String::new(),
    }
}

/// The CFO requirement set used across stage tests: M&A 25, Mandarin 15, PE fund 15, FP&A 15.
/// Exact set with a 70-point budget.
pub fn skill_set(weights: &[(&str, u32)]) -> HardSkillRequirementSet {
    let entries = weights
        .iter()
        .map(|(skill, points)| SkillRequirement {
            skill: skill.to_string(),
            points: *points,
        })
        .collect();
    HardSkillRequirementSet::new(70, entries).unwrap()
}

pub fn cfo_skills() -> HardSkillRequirementSet {
    skill_set(&[("M&A", 25), ("Mandarin", 15), ("PE fund", 15), ("FP&A", 15)])
}

pub fn fingerprint(slug: &str, title: &str, snippet: &str) -> CandidateFingerprint {
    fingerprint_from_hit(&profile_hit(slug, title, snippet), "test", None).unwrap()
}

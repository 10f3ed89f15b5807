//! Mock language model for development & testing
//!
//! Keeps the loop runnable without network access. Answers are canned
//! per prompt kind; the critic score and failing kinds are configurable.

use crate::error::AnalysisError;
use crate::llm::LanguageModel;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Which stage a prompt came from, recognised by the stage's closing label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Plan,
    Refine,
    Summarize,
    Critique,
    Synthesize,
}

impl PromptKind {
    pub fn classify(prompt: &str) -> Self {
        if prompt.contains("Score: <number>") {
            PromptKind::Critique
        } else if prompt.contains("Comprehensive Analysis:") {
            PromptKind::Synthesize
        } else if prompt.contains("Refined sub-questions:") {
            PromptKind::Refine
        } else if prompt.contains("Sub-questions:") {
            PromptKind::Plan
        } else {
            PromptKind::Summarize
        }
    }
}

pub struct MockLanguageModel {
    critic_scores: Vec<u8>,
    failing: HashSet<PromptKind>,
    calls: Mutex<Vec<(PromptKind, String)>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            critic_scores: vec![8],
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Score reported by every critique
    pub fn with_score(self, score: u8) -> Self {
        self.with_scores(vec![score])
    }

    /// Scores reported by successive critiques; the last one repeats
    pub fn with_scores(mut self, scores: Vec<u8>) -> Self {
        if !scores.is_empty() {
            self.critic_scores = scores;
        }
        self
    }

    fn critic_score(&self, nth: usize) -> u8 {
        let last = self.critic_scores.len().saturating_sub(1);
        self.critic_scores.get(nth.min(last)).copied().unwrap_or(8)
    }

    /// Make every prompt of this kind fail
    pub fn failing_on(mut self, kind: PromptKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub fn call_count(&self, kind: PromptKind) -> usize {
        self.prompts(kind).len()
    }

    pub fn prompts(&self, kind: PromptKind) -> Vec<String> {
        match self.calls.lock() {
            Ok(calls) => calls
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, p)| p.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn respond(&self, kind: PromptKind, nth: usize) -> String {
        match kind {
            PromptKind::Plan => "Here are the sub-questions:\n\
                1. What were the latest quarterly revenue and earnings figures?\n\
                2. How has the share price moved over the past 12 months?\n\
                3. What are analysts forecasting for the next fiscal year?"
                .to_string(),
            PromptKind::Refine => "1. What was year-over-year revenue growth in the most recent 10-Q?\n\
                2. What is the current P/E ratio compared with the sector median?\n\
                3. What guidance did management give on the last earnings call?"
                .to_string(),
            PromptKind::Summarize => {
                "Revenue rose 6% year over year to $94.9B; EPS came in at $1.64 on 2024-10-31."
                    .to_string()
            }
            PromptKind::Critique => format!(
                "Score: {}\nStrengths: Concrete figures and dates.\nWeaknesses: Limited forward guidance.",
                self.critic_score(nth)
            ),
            PromptKind::Synthesize => "## Key Findings\n\
                Revenue and earnings grew modestly while valuation remains above the sector median.\n\n\
                ## Summary\nPerformance is stable with moderate growth."
                .to_string(),
        }
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let kind = PromptKind::classify(prompt);

        let nth = match self.calls.lock() {
            Ok(mut calls) => {
                let nth = calls.iter().filter(|(k, _)| *k == kind).count();
                calls.push((kind, prompt.to_string()));
                nth
            }
            Err(_) => 0,
        };

        if self.failing.contains(&kind) {
            return Err(AnalysisError::LlmError(format!(
                "mock failure for {:?} prompt",
                kind
            )));
        }

        Ok(self.respond(kind, nth))
    }
}

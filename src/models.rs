//! Core data models for the research-and-critique loop

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Score assumed when the critic output cannot be graded
pub const DEFAULT_CRITIC_SCORE: u8 = 6;

/// Fixed fan-out of every planning pass
pub const SUB_QUESTION_COUNT: usize = 3;

//
// ================= Request =================
//

/// Caller-supplied parameters for one analysis run.
///
/// `target_score` and `max_retries` carry no defaults here; the serving
/// layer decides them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub question: String,
    pub purpose: String,
    pub target_score: u8,
    pub max_retries: u32,
}

//
// ================= Retrieval =================
//

/// Outcome of searching one sub-question.
///
/// Exactly one of `content` / `error` is populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchOutcome {
    pub question: String,
    pub content: Option<Value>,
    pub error: Option<String>,
    pub attempts: u32,
}

impl SearchOutcome {
    pub fn found(question: impl Into<String>, content: Value, attempts: u32) -> Self {
        Self {
            question: question.into(),
            content: Some(content),
            error: None,
            attempts,
        }
    }

    pub fn failed(question: impl Into<String>, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            question: question.into(),
            content: None,
            error: Some(error.into()),
            attempts,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

//
// ================= State =================
//

/// The value threaded through every stage of the loop.
///
/// Stages consume a state and hand back a new one; nothing holds a
/// reference to a previous cycle's sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisState {
    pub question: String,
    pub purpose: String,
    pub sub_questions: Vec<String>,
    pub search_results: Vec<SearchOutcome>,
    pub summaries: Vec<String>,
    pub critic_score: u8,
    pub critic_feedback: String,
    pub retry_count: u32,
    pub target_score: u8,
    pub max_retries: u32,
    pub processing_time: BTreeMap<String, f64>,
    pub final_answer: Option<String>,
    pub max_retries_reached: bool,
}

impl AnalysisState {
    pub fn new(request: &AnalysisRequest) -> Self {
        Self {
            question: request.question.clone(),
            purpose: request.purpose.clone(),
            sub_questions: Vec::new(),
            search_results: Vec::new(),
            summaries: Vec::new(),
            critic_score: DEFAULT_CRITIC_SCORE,
            critic_feedback: String::new(),
            retry_count: 0,
            target_score: request.target_score,
            max_retries: request.max_retries,
            processing_time: BTreeMap::new(),
            final_answer: None,
            max_retries_reached: false,
        }
    }

    /// Append a timing entry. Keys are never overwritten.
    pub fn with_timing(mut self, key: impl Into<String>, seconds: f64) -> Self {
        self.processing_time.entry(key.into()).or_insert(seconds);
        self
    }

    /// Timing key for a per-cycle stage: bare on the first cycle,
    /// suffixed with the retry number afterwards.
    pub fn cycle_key(&self, stage: &str) -> String {
        if self.retry_count == 0 {
            stage.to_string()
        } else {
            format!("{}_{}", stage, self.retry_count)
        }
    }

    pub fn total_processing_time(&self) -> f64 {
        self.processing_time.values().sum()
    }
}

//
// ================= Final Result =================
//

/// What the caller of a run receives. Always well-formed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub final_answer: String,
    pub critic_score: Option<u8>,
    pub retry_count: u32,
    pub processing_time: BTreeMap<String, f64>,
    pub max_retries_reached: bool,
    pub error: bool,
    pub critic_feedback: Option<String>,
    pub sub_questions: Vec<String>,
}

impl AnalysisReport {
    pub fn from_state(run_id: Uuid, state: AnalysisState) -> Self {
        let critic_feedback = if state.critic_feedback.is_empty() {
            None
        } else {
            Some(state.critic_feedback)
        };

        Self {
            run_id,
            final_answer: state
                .final_answer
                .unwrap_or_else(|| "No analysis available".to_string()),
            critic_score: Some(state.critic_score),
            retry_count: state.retry_count,
            processing_time: state.processing_time,
            max_retries_reached: state.max_retries_reached,
            error: false,
            critic_feedback,
            sub_questions: state.sub_questions,
        }
    }

    pub fn failed(run_id: Uuid, message: String) -> Self {
        Self {
            run_id,
            final_answer: format!("Analysis failed: {}", message),
            critic_score: None,
            retry_count: 0,
            processing_time: BTreeMap::new(),
            max_retries_reached: false,
            error: true,
            critic_feedback: None,
            sub_questions: Vec::new(),
        }
    }
}

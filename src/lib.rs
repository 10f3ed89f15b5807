//! Financial Research Agent
//!
//! Answers a financial question by running a research-and-critique loop:
//! - Decomposes the question into a fixed set of sub-questions
//! - Searches every sub-question concurrently, with per-query retries
//! - Summarizes each excerpt against its sub-question
//! - Grades the summary set and retries with an escalating strategy
//! - Synthesizes a final report once the grade passes or retries run out
//!
//! LOOP:
//! PLAN → RETRIEVE → SUMMARIZE → CRITIQUE → (SYNTHESIZE | RETRY → RETRIEVE)

pub mod agent;
pub mod api;
pub mod config;
pub mod critic;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod planner;
pub mod retrieval;
pub mod search;
pub mod strategy;
pub mod summarizer;
pub mod synthesizer;

pub use error::Result;

// Re-export common types
pub use agent::Orchestrator;
pub use models::*;

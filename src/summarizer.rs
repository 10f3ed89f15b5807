//! Evidence summarization
//!
//! Turns each retrieved excerpt into a question-scoped answer. Entries are
//! handled one at a time; a bad entry only costs its own summary.

use crate::extract::extract_content;
use crate::llm::LanguageModel;
use crate::models::SearchOutcome;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Excerpts shorter than this (after trimming) are treated as empty
const MIN_CONTENT_CHARS: usize = 10;

pub struct Summarizer {
    llm: Arc<dyn LanguageModel>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// One summary block per search outcome, same order
    pub async fn summarize(&self, results: &[SearchOutcome]) -> Vec<String> {
        let mut summaries = Vec::with_capacity(results.len());

        for outcome in results {
            summaries.push(self.summarize_one(outcome).await);
        }

        info!(count = summaries.len(), "Summaries generated");
        summaries
    }

    async fn summarize_one(&self, outcome: &SearchOutcome) -> String {
        let question = &outcome.question;

        if let Some(err) = &outcome.error {
            return format!(
                "Unable to retrieve information for: {} (Error: {})",
                question, err
            );
        }

        let content = outcome
            .content
            .as_ref()
            .map(extract_content)
            .unwrap_or_default();

        if content.trim().chars().count() < MIN_CONTENT_CHARS {
            debug!(question = %question, "Excerpt too short to summarize");
            return format!("No relevant information found for: {}", question);
        }

        let prompt = build_summary_prompt(question, &content);

        match self.llm.complete(&prompt).await {
            Ok(answer) => format!("Q: {}\nA: {}", question, answer.trim()),
            Err(e) => {
                error!(question = %question, error = %e, "Error summarizing excerpt");
                format!("Error processing: {}", question)
            }
        }
    }
}

fn build_summary_prompt(question: &str, content: &str) -> String {
    format!(
        r#"You are a professional financial analyst. Analyze the following information to answer the specific question.
Focus on quantitative data, key metrics, and factual insights.

Question: {question}

Source Information:
{content}

Instructions:
- Extract specific numbers, percentages, dates, and metrics
- Identify key trends or changes
- Note any significant events or developments
- Keep the summary concise but comprehensive
- If information is insufficient, state what's missing

Analysis:"#
    )
}

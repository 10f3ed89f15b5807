//! Sub-question planner
//!
//! Uses the language model to decompose one question into a fixed set of
//! complementary, searchable sub-questions. The numbered-list parsing is
//! best effort; the pad/truncate step is what callers rely on.

use crate::llm::LanguageModel;
use crate::models::SUB_QUESTION_COUNT;
use std::sync::Arc;
use tracing::{error, info};

pub struct SubQuestionPlanner {
    llm: Arc<dyn LanguageModel>,
}

impl SubQuestionPlanner {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Decompose `question` into exactly three sub-questions.
    ///
    /// Falls back to `[question]` if the language call fails.
    pub async fn plan(&self, question: &str, purpose: &str) -> Vec<String> {
        let prompt = build_plan_prompt(question, purpose);

        match self.llm.complete(&prompt).await {
            Ok(output) => {
                let sub_questions = normalize(parse_numbered_list(&output), question);
                info!(?sub_questions, "Sub-questions planned");
                sub_questions
            }
            Err(e) => {
                error!(error = %e, "Planning failed, falling back to the original question");
                vec![question.to_string()]
            }
        }
    }

    /// Produce new sub-questions steered by the previous critique.
    ///
    /// Returns `None` if the language call fails; the caller keeps its
    /// current sub-questions.
    pub async fn refine(&self, question: &str, feedback: &str) -> Option<Vec<String>> {
        let prompt = build_refine_prompt(question, feedback);

        match self.llm.complete(&prompt).await {
            Ok(output) => {
                let sub_questions = normalize(parse_numbered_list(&output), question);
                info!(?sub_questions, "Refined sub-questions");
                Some(sub_questions)
            }
            Err(e) => {
                error!(error = %e, "Refining sub-questions failed");
                None
            }
        }
    }
}

/// Keep lines that look like numbered list items and take the text after
/// the first period.
pub fn parse_numbered_list(output: &str) -> Vec<String> {
    output
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .map(|line| match line.split_once('.') {
            Some((_, rest)) => rest.trim(),
            None => line,
        })
        .filter(|question| !question.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pad with the original question or truncate to exactly three
pub fn normalize(mut sub_questions: Vec<String>, question: &str) -> Vec<String> {
    sub_questions.truncate(SUB_QUESTION_COUNT);
    while sub_questions.len() < SUB_QUESTION_COUNT {
        sub_questions.push(question.to_string());
    }
    sub_questions
}

fn build_plan_prompt(question: &str, purpose: &str) -> String {
    format!(
        r#"You are an expert financial analyst specializing in {purpose}.
Break the following question into exactly 3 focused, specific sub-questions that can be answered via web search.
Each sub-question should target different aspects of the analysis.

Main Question: "{question}"

Requirements:
- Make each sub-question specific and searchable
- Focus on quantitative data where possible
- Ensure questions are complementary, not overlapping
- Format as a numbered list (1., 2., 3.)

Sub-questions:"#
    )
}

fn build_refine_prompt(question: &str, feedback: &str) -> String {
    format!(
        r#"You are an expert financial analyst. The previous analysis attempt received this feedback:
{feedback}

Create 3 NEW, more specific and targeted sub-questions for this main question:
"{question}"

Make these questions:
- More specific with exact metrics and timeframes
- Focus on different data sources (earnings reports, market data, analyst reports)
- Include specific financial terms and ratios
- Target recent and reliable information sources

Format as a numbered list (1., 2., 3.)

Refined sub-questions:"#
    )
}

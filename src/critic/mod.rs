//! Critic: grades the summary set
//!
//! The score is the only signal the control loop branches on, so every
//! failure mode resolves to a score rather than an error.

use crate::llm::LanguageModel;
use crate::models::DEFAULT_CRITIC_SCORE;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const MAX_SCORE: u8 = 10;

const EVALUATION_ERROR: &str = "Error in evaluation";
const MISSING_SCORE: &str = "No score found in evaluation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Critique {
    pub score: u8,
    pub feedback: String,
}

impl Critique {
    fn fallback(feedback: &str) -> Self {
        Self {
            score: DEFAULT_CRITIC_SCORE,
            feedback: feedback.to_string(),
        }
    }
}

pub struct Critic {
    llm: Arc<dyn LanguageModel>,
}

impl Critic {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn critique(&self, question: &str, summaries: &[String]) -> Critique {
        let prompt = build_critic_prompt(question, summaries);

        let output = match self.llm.complete(&prompt).await {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "Critic evaluation failed");
                return Critique::fallback(EVALUATION_ERROR);
            }
        };

        match extract_score(&output) {
            Some(score) => {
                info!(score, "Critic evaluation completed");
                Critique {
                    score,
                    feedback: output.trim().to_string(),
                }
            }
            None => {
                warn!("Critic output had no usable score line");
                Critique::fallback(MISSING_SCORE)
            }
        }
    }
}

/// Find the first `Score:` line (case-insensitive) and read the first run
/// of digits after its colon, capped at `MAX_SCORE`.
///
/// Only the first `Score:` line is considered.
pub fn extract_score(output: &str) -> Option<u8> {
    let line = output
        .lines()
        .find(|line| line.trim().to_lowercase().starts_with("score:"))?;

    let (_, after_colon) = line.split_once(':')?;

    let digits: String = after_colon
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return None;
    }

    // Runs too long for u64 are certainly above the cap
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    Some(value.min(MAX_SCORE as u64) as u8)
}

fn build_critic_prompt(question: &str, summaries: &[String]) -> String {
    let summaries = summaries.join("\n\n");

    format!(
        r#"You are a senior financial analyst reviewing research summaries. Evaluate the quality and completeness of the analysis.

Original Question: {question}

Analysis Summaries:
{summaries}

Evaluation Criteria:
1. Completeness: Does the analysis address all aspects of the original question?
2. Data Quality: Are specific metrics, numbers, and dates provided?
3. Relevance: Is the information directly relevant to the question?
4. Clarity: Is the analysis clear and well-structured?

Provide a score from 1-10 where:
- 8-10: Excellent, comprehensive analysis
- 6-7: Good analysis with minor gaps
- 4-5: Adequate but missing key information
- 1-3: Poor, significant issues

Format:
Score: <number>
Strengths: <what works well>
Weaknesses: <what needs improvement>"#
    )
}

//
// ================= Tests =================
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLanguageModel, PromptKind};

    #[test]
    fn test_extract_score_variants() {
        assert_eq!(extract_score("Score: 7\nStrengths: x"), Some(7));
        assert_eq!(extract_score("  score: 8/10"), Some(8));
        assert_eq!(extract_score("SCORE: **9**"), Some(9));
        assert_eq!(extract_score("Intro\nScore: 15"), Some(10));
        assert_eq!(extract_score("Score: 0"), Some(0));
        assert_eq!(extract_score("Score: 99999999999999999999999"), Some(10));
    }

    #[test]
    fn test_extract_score_missing() {
        assert_eq!(extract_score("Strengths: good\nWeaknesses: none"), None);
        assert_eq!(extract_score("Score: N/A\nScore: 9"), None);
        assert_eq!(extract_score("The score: was 5"), None);
    }

    #[tokio::test]
    async fn test_critique_uses_model_score_and_verbatim_feedback() {
        let model = Arc::new(MockLanguageModel::new().with_score(4));
        let critic = Critic::new(model.clone());

        let summaries = vec!["Q: a\nA: b".to_string(), "Q: c\nA: d".to_string()];
        let critique = critic.critique("How is Apple performing?", &summaries).await;

        assert_eq!(critique.score, 4);
        assert!(critique.feedback.starts_with("Score: 4\nStrengths:"));
        let prompt = &model.prompts(PromptKind::Critique)[0];
        assert!(prompt.contains("Q: a\nA: b\n\nQ: c\nA: d"));
    }

    #[tokio::test]
    async fn test_zero_score_is_kept() {
        let model = Arc::new(MockLanguageModel::new().with_score(0));
        let critique = Critic::new(model).critique("q", &[]).await;

        assert_eq!(critique.score, 0);
        assert!(critique.feedback.starts_with("Score: 0"));
    }

    #[tokio::test]
    async fn test_critique_failure_defaults() {
        let model = Arc::new(MockLanguageModel::new().failing_on(PromptKind::Critique));
        let critic = Critic::new(model);

        let critique = critic.critique("q", &[]).await;

        assert_eq!(critique.score, DEFAULT_CRITIC_SCORE);
        assert_eq!(critique.feedback, EVALUATION_ERROR);
    }
}

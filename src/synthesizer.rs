//! Final report synthesis

use crate::llm::LanguageModel;
use std::sync::Arc;
use tracing::{error, info};

const SYNTHESIS_ERROR: &str = "Error generating final analysis";

pub struct Synthesizer {
    llm: Arc<dyn LanguageModel>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// One language call over the whole summary set. Never fails.
    pub async fn synthesize(&self, question: &str, summaries: &[String]) -> String {
        let prompt = build_synthesis_prompt(question, summaries);

        match self.llm.complete(&prompt).await {
            Ok(answer) => {
                info!(chars = answer.len(), "Final synthesis completed");
                answer
            }
            Err(e) => {
                error!(error = %e, "Error in final synthesis");
                SYNTHESIS_ERROR.to_string()
            }
        }
    }
}

fn build_synthesis_prompt(question: &str, summaries: &[String]) -> String {
    let findings = summaries.join("\n");

    format!(
        r#"You are a senior financial analyst preparing a comprehensive report. Based on the research summaries,
provide a detailed analysis that directly answers the original question.

Original Question: {question}

Research Findings:
{findings}

Instructions:
- Structure your response with clear sections
- Lead with key findings and conclusions
- Include specific metrics, percentages, and data points
- Provide context and implications
- End with a clear summary statement
- Use professional financial analysis language

Comprehensive Analysis:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLanguageModel, PromptKind};

    #[tokio::test]
    async fn test_synthesize_joins_summaries() {
        let model = Arc::new(MockLanguageModel::new());
        let synthesizer = Synthesizer::new(model.clone());

        let answer = synthesizer
            .synthesize("How is Apple performing?", &["Q: a\nA: b".into(), "Q: c\nA: d".into()])
            .await;

        assert!(answer.starts_with("## Key Findings"));
        let prompt = &model.prompts(PromptKind::Synthesize)[0];
        assert!(prompt.contains("Original Question: How is Apple performing?"));
        assert!(prompt.contains("Q: a\nA: b\nQ: c\nA: d"));
    }

    #[tokio::test]
    async fn test_synthesize_failure_placeholder() {
        let model = Arc::new(MockLanguageModel::new().failing_on(PromptKind::Synthesize));
        let answer = Synthesizer::new(model).synthesize("q", &[]).await;
        assert_eq!(answer, SYNTHESIS_ERROR);
    }
}

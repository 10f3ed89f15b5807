//! Retry strategist
//!
//! Chooses how the next cycle searches after a rejected critique. The
//! strategy escalates with the retry number: refine the sub-questions,
//! then rewrite search terms, then widen scope.

use crate::models::AnalysisState;
use crate::planner::SubQuestionPlanner;
use tracing::info;

/// Suffixes appended positionally by `RetryStrategy::ModifyTerms`
const TERM_ENHANCEMENTS: [&str; 3] = [
    " financial results earnings revenue",
    " stock performance market cap valuation",
    " quarterly report Q1 Q2 Q3 Q4 annual",
];

const FALLBACK_ENHANCEMENT: &str = " latest news update";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    Refine,
    ModifyTerms,
    Broaden,
}

/// Strategy for a retry, keyed on the retry number after increment
pub fn select_strategy(retry_count: u32) -> RetryStrategy {
    match retry_count {
        0..=3 => RetryStrategy::Refine,
        4..=6 => RetryStrategy::ModifyTerms,
        _ => RetryStrategy::Broaden,
    }
}

#[derive(Debug)]
pub enum RetryOutcome {
    /// New sub-questions are ready for another retrieval pass
    Continue(AnalysisState),
    /// Budget already spent; the state is terminal-bound
    Exhausted(AnalysisState),
}

pub struct RetryStrategist {
    planner: SubQuestionPlanner,
}

impl RetryStrategist {
    pub fn new(planner: SubQuestionPlanner) -> Self {
        Self { planner }
    }

    pub async fn retry(&self, state: AnalysisState) -> RetryOutcome {
        if state.retry_count >= state.max_retries {
            info!(
                max_retries = state.max_retries,
                "Maximum retries reached, proceeding with available information"
            );
            let message = format!(
                "Maximum retries ({}) reached. Analysis based on available information.",
                state.max_retries
            );
            return RetryOutcome::Exhausted(AnalysisState {
                final_answer: Some(message),
                max_retries_reached: true,
                ..state
            });
        }

        let retry_count = state.retry_count + 1;
        let strategy = select_strategy(retry_count);

        info!(
            attempt = retry_count,
            max_retries = state.max_retries,
            ?strategy,
            "Retrying analysis"
        );

        let sub_questions = match strategy {
            RetryStrategy::Refine => self
                .planner
                .refine(&state.question, &state.critic_feedback)
                .await
                .unwrap_or_else(|| state.sub_questions.clone()),
            RetryStrategy::ModifyTerms => modify_search_terms(&state.sub_questions),
            RetryStrategy::Broaden => broaden_scope(&state.question),
        };

        RetryOutcome::Continue(AnalysisState {
            sub_questions,
            retry_count,
            ..state
        })
    }
}

/// Append domain-specific terms to each sub-question by position
pub fn modify_search_terms(sub_questions: &[String]) -> Vec<String> {
    sub_questions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let suffix = TERM_ENHANCEMENTS.get(i).copied().unwrap_or(FALLBACK_ENHANCEMENT);
            format!("{}{}", question, suffix)
        })
        .collect()
}

/// Replace the sub-questions with broader takes on the original question
pub fn broaden_scope(question: &str) -> Vec<String> {
    vec![
        format!("{} news recent developments", question),
        format!("{} financial performance overview", question),
        format!("{} market analysis investor sentiment", question),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLanguageModel, PromptKind};
    use crate::models::AnalysisRequest;
    use std::sync::Arc;

    const QUESTION: &str = "How is Apple performing?";

    fn state(retry_count: u32, max_retries: u32) -> AnalysisState {
        let mut state = AnalysisState::new(&AnalysisRequest {
            question: QUESTION.to_string(),
            purpose: "financial analysis".to_string(),
            target_score: 6,
            max_retries,
        });
        state.retry_count = retry_count;
        state.sub_questions = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        state.critic_feedback = "Weaknesses: missing margin data".to_string();
        state
    }

    fn strategist(model: Arc<MockLanguageModel>) -> RetryStrategist {
        RetryStrategist::new(SubQuestionPlanner::new(model))
    }

    #[test]
    fn test_strategy_boundaries() {
        assert_eq!(select_strategy(1), RetryStrategy::Refine);
        assert_eq!(select_strategy(3), RetryStrategy::Refine);
        assert_eq!(select_strategy(4), RetryStrategy::ModifyTerms);
        assert_eq!(select_strategy(6), RetryStrategy::ModifyTerms);
        assert_eq!(select_strategy(7), RetryStrategy::Broaden);
        assert_eq!(select_strategy(100), RetryStrategy::Broaden);
    }

    #[test]
    fn test_modify_search_terms_positional_with_fallback() {
        let input: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            modify_search_terms(&input),
            vec![
                "a financial results earnings revenue",
                "b stock performance market cap valuation",
                "c quarterly report Q1 Q2 Q3 Q4 annual",
                "d latest news update",
            ]
        );
    }

    #[test]
    fn test_broaden_scope_uses_original_question() {
        let broad = broaden_scope(QUESTION);
        assert_eq!(broad.len(), 3);
        assert_eq!(broad[0], "How is Apple performing? news recent developments");
        assert_eq!(broad[2], "How is Apple performing? market analysis investor sentiment");
    }

    #[tokio::test]
    async fn test_exhausted_sets_terminal_fields() {
        let model = Arc::new(MockLanguageModel::new());
        let outcome = strategist(model.clone()).retry(state(5, 5)).await;

        let RetryOutcome::Exhausted(state) = outcome else {
            panic!("expected exhausted outcome");
        };
        assert!(state.max_retries_reached);
        assert_eq!(state.retry_count, 5);
        assert_eq!(
            state.final_answer.as_deref(),
            Some("Maximum retries (5) reached. Analysis based on available information.")
        );
        assert_eq!(model.call_count(PromptKind::Refine), 0);
    }

    #[tokio::test]
    async fn test_refine_strategy_uses_feedback() {
        let model = Arc::new(MockLanguageModel::new());
        let outcome = strategist(model.clone()).retry(state(0, 5)).await;

        let RetryOutcome::Continue(state) = outcome else {
            panic!("expected continue outcome");
        };
        assert_eq!(state.retry_count, 1);
        assert_eq!(state.sub_questions.len(), 3);
        assert!(state.sub_questions[0].contains("10-Q"));
        assert!(model.prompts(PromptKind::Refine)[0].contains("missing margin data"));
    }

    #[tokio::test]
    async fn test_refine_failure_keeps_sub_questions() {
        let model = Arc::new(MockLanguageModel::new().failing_on(PromptKind::Refine));
        let RetryOutcome::Continue(state) = strategist(model).retry(state(2, 5)).await else {
            panic!("expected continue outcome");
        };
        assert_eq!(state.retry_count, 3);
        assert_eq!(state.sub_questions, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_modify_and_broaden_skip_the_model() {
        let model = Arc::new(MockLanguageModel::new());
        let strategist = strategist(model.clone());

        let RetryOutcome::Continue(modified) = strategist.retry(state(3, 10)).await else {
            panic!("expected continue outcome");
        };
        assert_eq!(modified.retry_count, 4);
        assert_eq!(modified.sub_questions[0], "a financial results earnings revenue");

        let RetryOutcome::Continue(broadened) = strategist.retry(state(6, 10)).await else {
            panic!("expected continue outcome");
        };
        assert_eq!(broadened.retry_count, 7);
        assert_eq!(broadened.sub_questions, broaden_scope(QUESTION));

        assert_eq!(model.call_count(PromptKind::Refine), 0);
    }
}

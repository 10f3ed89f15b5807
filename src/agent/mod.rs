//! Main orchestrator - implements the research-and-critique loop
//!
//! PLAN → RETRIEVE → SUMMARIZE → CRITIQUE → (SYNTHESIZE | RETRY → RETRIEVE …)

use crate::critic::Critic;
use crate::error::AnalysisError;
use crate::llm::LanguageModel;
use crate::models::{AnalysisReport, AnalysisRequest, AnalysisState};
use crate::planner::SubQuestionPlanner;
use crate::retrieval::{ConcurrentRetriever, RetryPolicy};
use crate::search::SearchProvider;
use crate::strategy::{RetryOutcome, RetryStrategist};
use crate::summarizer::Summarizer;
use crate::synthesizer::Synthesizer;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Stages of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Planning,
    Retrieving,
    Summarizing,
    Critiquing,
    Retrying,
    Synthesizing,
    Done,
}

/// Outcome of the quality gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Score met the target
    Accept,
    /// Score missed the target and the retry budget is spent
    Exhausted,
    /// Score missed the target; try again
    Retry,
}

impl Decision {
    pub fn next_stage(self) -> Stage {
        match self {
            Decision::Accept | Decision::Exhausted => Stage::Synthesizing,
            Decision::Retry => Stage::Retrying,
        }
    }
}

/// The quality gate. Pure: score and budget only.
pub fn decide(critic_score: u8, target_score: u8, retry_count: u32, max_retries: u32) -> Decision {
    if critic_score >= target_score {
        Decision::Accept
    } else if retry_count >= max_retries {
        Decision::Exhausted
    } else {
        Decision::Retry
    }
}

/// Orchestrator that owns every stage and the transition between them
pub struct Orchestrator {
    planner: SubQuestionPlanner,
    retriever: ConcurrentRetriever,
    summarizer: Summarizer,
    critic: Critic,
    strategist: RetryStrategist,
    synthesizer: Synthesizer,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LanguageModel>, search: Arc<dyn SearchProvider>) -> Self {
        Self::with_retry_policy(llm, search, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            planner: SubQuestionPlanner::new(Arc::clone(&llm)),
            retriever: ConcurrentRetriever::with_policy(search, policy),
            summarizer: Summarizer::new(Arc::clone(&llm)),
            critic: Critic::new(Arc::clone(&llm)),
            strategist: RetryStrategist::new(SubQuestionPlanner::new(Arc::clone(&llm))),
            synthesizer: Synthesizer::new(llm),
        }
    }

    /// Run one analysis to completion. Never returns an error: failures
    /// that escape the stages become a report with `error = true`.
    pub async fn run(&self, request: AnalysisRequest) -> AnalysisReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis", run_id = %run_id);

        async move {
            info!(
                question = %request.question,
                target_score = request.target_score,
                max_retries = request.max_retries,
                "Orchestrator: starting analysis"
            );

            match self.run_stages(&request).await {
                Ok(state) => {
                    info!(
                        score = state.critic_score,
                        retry_count = state.retry_count,
                        max_retries_reached = state.max_retries_reached,
                        total_seconds = state.total_processing_time(),
                        "Analysis completed"
                    );
                    AnalysisReport::from_state(run_id, state)
                }
                Err(e) => {
                    error!(error = %e, "Error in analysis");
                    AnalysisReport::failed(run_id, e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Drive the state machine from `Planning` to `Done`
    pub async fn run_stages(&self, request: &AnalysisRequest) -> Result<AnalysisState> {
        let mut state = AnalysisState::new(request);
        let mut stage = Stage::Planning;
        let mut cycles: u32 = 0;

        while stage != Stage::Done {
            debug!(?stage, retry_count = state.retry_count, "Entering stage");
            let start = Instant::now();

            let (next_state, next_stage) = match stage {
                Stage::Planning => {
                    let sub_questions =
                        self.planner.plan(&state.question, &state.purpose).await;
                    let next = AnalysisState { sub_questions, ..state };
                    (next.with_timing("planning", elapsed(start)), Stage::Retrieving)
                }
                Stage::Retrieving => {
                    cycles += 1;
                    check_cycle_bound(cycles, state.max_retries)?;

                    let search_results = self.retriever.retrieve(&state.sub_questions).await;
                    let key = state.cycle_key("retrieval");
                    let next = AnalysisState { search_results, ..state };
                    (next.with_timing(key, elapsed(start)), Stage::Summarizing)
                }
                Stage::Summarizing => {
                    let summaries = self.summarizer.summarize(&state.search_results).await;
                    let key = state.cycle_key("summarization");
                    let next = AnalysisState { summaries, ..state };
                    (next.with_timing(key, elapsed(start)), Stage::Critiquing)
                }
                Stage::Critiquing => {
                    let critique = self.critic.critique(&state.question, &state.summaries).await;
                    let key = state.cycle_key("critic");
                    let decision = decide(
                        critique.score,
                        state.target_score,
                        state.retry_count,
                        state.max_retries,
                    );

                    info!(
                        score = critique.score,
                        target_score = state.target_score,
                        retry_count = state.retry_count,
                        max_retries = state.max_retries,
                        ?decision,
                        "Quality gate"
                    );

                    let next = AnalysisState {
                        critic_score: critique.score,
                        critic_feedback: critique.feedback,
                        max_retries_reached: decision == Decision::Exhausted,
                        ..state
                    };
                    (next.with_timing(key, elapsed(start)), decision.next_stage())
                }
                Stage::Retrying => match self.strategist.retry(state).await {
                    RetryOutcome::Continue(next) => {
                        let key = format!("retry_{}", next.retry_count);
                        (next.with_timing(key, elapsed(start)), Stage::Retrieving)
                    }
                    RetryOutcome::Exhausted(next) => {
                        warn!("Retry requested with no budget left");
                        (next, Stage::Synthesizing)
                    }
                },
                Stage::Synthesizing => {
                    let answer = self
                        .synthesizer
                        .synthesize(&state.question, &state.summaries)
                        .await;
                    let next = AnalysisState {
                        final_answer: Some(answer),
                        ..state
                    };
                    (next.with_timing("synthesis", elapsed(start)), Stage::Done)
                }
                Stage::Done => (state, Stage::Done),
            };

            state = next_state;
            stage = next_stage;
        }

        Ok(state)
    }
}

/// At most `max_retries + 1` retrieval cycles per run
fn check_cycle_bound(cycles: u32, max_retries: u32) -> Result<()> {
    if cycles > max_retries.saturating_add(1) {
        return Err(AnalysisError::LoopBoundExceeded(format!(
            "retrieval cycle {} exceeds max_retries {} + 1",
            cycles, max_retries
        )));
    }
    Ok(())
}

fn elapsed(start: Instant) -> f64 {
    start.elapsed().as_secs_f64()
}

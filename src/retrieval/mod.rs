//! Concurrent retriever
//!
//! One search task per sub-question, all in flight at once, joined in
//! input order. Each task retries on its own; a failing query never
//! fails its siblings.

use crate::models::SearchOutcome;
use crate::search::SearchProvider;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Per-query retry policy, fixed when the retriever is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

pub struct ConcurrentRetriever {
    search: Arc<dyn SearchProvider>,
    policy: RetryPolicy,
}

impl ConcurrentRetriever {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self::with_policy(search, RetryPolicy::default())
    }

    pub fn with_policy(search: Arc<dyn SearchProvider>, policy: RetryPolicy) -> Self {
        Self { search, policy }
    }

    /// Search every sub-question concurrently.
    ///
    /// Output has the same length and order as `sub_questions`. If a task
    /// dies (panic or cancellation) the whole batch degrades to empty.
    /// Dropping the returned future aborts every search still in flight.
    pub async fn retrieve(&self, sub_questions: &[String]) -> Vec<SearchOutcome> {
        let start = Instant::now();

        let handles: Vec<_> = sub_questions
            .iter()
            .cloned()
            .map(|query| {
                let search = Arc::clone(&self.search);
                let policy = self.policy;
                tokio::spawn(async move { fetch_with_retry(search, query, policy).await })
            })
            .collect();
        let _guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        let mut outcomes = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(error = %e, "Retrieval task failed, discarding batch");
                    return Vec::new();
                }
            }
        }

        let failed = outcomes.iter().filter(|o| o.is_error()).count();
        info!(
            queries = outcomes.len(),
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieval batch completed"
        );

        outcomes
    }
}

/// Aborts spawned searches when the batch is abandoned. Aborting a
/// finished task is a no-op.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

async fn fetch_with_retry(
    search: Arc<dyn SearchProvider>,
    query: String,
    policy: RetryPolicy,
) -> SearchOutcome {
    let mut attempt = 1;

    loop {
        match search.search(&query).await {
            Ok(result) => {
                debug!(query = %query, attempt, "Search succeeded");
                return SearchOutcome::found(query, result, attempt);
            }
            Err(e) => {
                warn!(query = %query, attempt, error = %e, "Search attempt failed");
                if attempt >= policy.max_attempts() {
                    return SearchOutcome::failed(query, e.to_string(), attempt);
                }
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::search::MockSearchProvider;
    use crate::Result;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn queries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Fails queries containing "bad"; answers others after a delay that
    /// shrinks with position, so completion order is the reverse of input order.
    struct SelectiveSearch;

    #[async_trait]
    impl SearchProvider for SelectiveSearch {
        async fn search(&self, query: &str) -> Result<Value> {
            if query.contains("bad") {
                return Err(AnalysisError::SearchError("rate limited".to_string()));
            }
            let delay = 100 - query.len() as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(json!({ "content": query }))
        }
    }

    struct PanickingSearch;

    #[async_trait]
    impl SearchProvider for PanickingSearch {
        async fn search(&self, query: &str) -> Result<Value> {
            if query == "boom" {
                panic!("search backend crashed");
            }
            Ok(json!("ok"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_and_length_preserved_with_mixed_outcomes() {
        let retriever = ConcurrentRetriever::new(Arc::new(SelectiveSearch));
        let input = queries(&["a", "bad one", "abcdefgh", "bad two", "abcdefghijklmnop"]);

        let outcomes = retriever.retrieve(&input).await;

        assert_eq!(outcomes.len(), input.len());
        for (outcome, query) in outcomes.iter().zip(&input) {
            assert_eq!(&outcome.question, query);
            assert_eq!(outcome.is_error(), query.contains("bad"));
        }
        assert_eq!(outcomes[0].content, Some(json!({ "content": "a" })));
        assert_eq!(outcomes[1].error.as_deref(), Some("Search error: rate limited"));
        assert_eq!(outcomes[1].attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_recovers_within_budget() {
        let search = Arc::new(MockSearchProvider::new().failing_first(2));
        let retriever = ConcurrentRetriever::new(search.clone());

        let outcomes = retriever.retrieve(&queries(&["apple revenue"])).await;

        assert!(!outcomes[0].is_error());
        assert_eq!(outcomes[0].attempts, 3);
        assert_eq!(search.attempts_for("apple revenue"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_wait_between_attempts() {
        let search = Arc::new(MockSearchProvider::always_failing());
        let retriever = ConcurrentRetriever::new(search.clone());
        let start = tokio::time::Instant::now();

        let outcomes = retriever.retrieve(&queries(&["q1", "q2", "q3"])).await;

        assert!(outcomes.iter().all(|o| o.is_error() && o.content.is_none()));
        assert_eq!(search.total_attempts(), 9);
        // Two one-second pauses per query, all queries in parallel
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_task_panic_degrades_to_empty_batch() {
        let retriever = ConcurrentRetriever::new(Arc::new(PanickingSearch));

        let outcomes = retriever.retrieve(&queries(&["fine", "boom"])).await;

        assert!(outcomes.is_empty());
    }

    /// Counts searches that ran to completion after a long pause
    struct SlowSearch {
        completed: AtomicU32,
    }

    #[async_trait]
    impl SearchProvider for SlowSearch {
        async fn search(&self, _query: &str) -> Result<Value> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(json!("late"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_batch_aborts_in_flight_searches() {
        let search = Arc::new(SlowSearch {
            completed: AtomicU32::new(0),
        });
        let retriever = ConcurrentRetriever::new(search.clone());

        let timed_out = tokio::time::timeout(
            Duration::from_secs(1),
            retriever.retrieve(&queries(&["q1", "q2", "q3"])),
        )
        .await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(search.completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let retriever = ConcurrentRetriever::new(Arc::new(MockSearchProvider::new()));
        assert!(retriever.retrieve(&[]).await.is_empty());
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }
}

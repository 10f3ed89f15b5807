//! Search capability
//!
//! "Given a query, return ranked results". The result shape is not
//! contracted: providers hand back raw JSON and `extract` copes with it.

use crate::config::{SearchBackend, ServiceConfig};
use crate::error::AnalysisError;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

pub mod tavily;
pub use tavily::TavilyClient;

/// Trait for web search (opaque to the loop)
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Value>;
}

/// Create the search provider selected by `SEARCH_PROVIDER`
pub fn build_search_provider(config: &ServiceConfig) -> Result<Arc<dyn SearchProvider>> {
    let provider: Arc<dyn SearchProvider> = match config.search_backend {
        SearchBackend::Tavily => {
            let key = config.tavily_api_key.clone().ok_or_else(|| {
                AnalysisError::ConfigError("TAVILY_API_KEY not configured".to_string())
            })?;
            Arc::new(TavilyClient::new(key, config.tavily_max_results)?)
        }
        SearchBackend::Mock => Arc::new(MockSearchProvider::new()),
    };

    Ok(provider)
}

/// Mock search provider for development & testing.
///
/// Returns a Tavily-shaped payload. Can be told to fail the first N
/// attempts of every query, or all of them.
pub struct MockSearchProvider {
    fail_first: u32,
    attempts: Mutex<HashMap<String, u32>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self {
            fail_first: 0,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Fail the first `n` attempts for each distinct query
    pub fn failing_first(mut self, n: u32) -> Self {
        self.fail_first = n;
        self
    }

    /// Fail every attempt
    pub fn always_failing() -> Self {
        Self::new().failing_first(u32::MAX)
    }

    /// Attempts made for a query so far
    pub fn attempts_for(&self, query: &str) -> u32 {
        self.attempts
            .lock()
            .map(|a| a.get(query).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Attempts made across all queries
    pub fn total_attempts(&self) -> u32 {
        self.attempts
            .lock()
            .map(|a| a.values().sum())
            .unwrap_or(0)
    }
}

impl Default for MockSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str) -> Result<Value> {
        let attempt = {
            let mut attempts = self
                .attempts
                .lock()
                .map_err(|_| AnalysisError::SearchError("mock state poisoned".to_string()))?;
            let count = attempts.entry(query.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if attempt <= self.fail_first {
            return Err(AnalysisError::SearchError(format!(
                "mock search unavailable (attempt {})",
                attempt
            )));
        }

        Ok(json!({
            "query": query,
            "results": [
                {
                    "title": "Quarterly results",
                    "url": "https://example.com/earnings",
                    "content": format!("Latest filing relevant to '{}': revenue up 6% year over year, operating margin 30%.", query),
                    "score": 0.91
                },
                {
                    "title": "Market coverage",
                    "url": "https://example.com/markets",
                    "content": "Shares gained 12% over the past twelve months against a 9% sector gain.",
                    "score": 0.84
                }
            ]
        }))
    }
}

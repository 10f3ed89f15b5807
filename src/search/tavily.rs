//! Tavily web search client

use crate::error::AnalysisError;
use crate::search::SearchProvider;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
    max_results: u32,
}

impl TavilyClient {
    pub fn new(api_key: String, max_results: u32) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            max_results,
        })
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
    search_depth: &'static str,
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Result<Value> {
        let body = SearchRequest {
            query,
            max_results: self.max_results,
            search_depth: "basic",
        };

        debug!(query, "Calling Tavily search");

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::SearchError(format!("Tavily request failed: {}", e)))?;

        let status = response.status();
        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| AnalysisError::SearchError(format!("Invalid JSON response: {}", e)))?;

        if !status.is_success() {
            return Err(AnalysisError::SearchError(format!(
                "Tavily returned {}: {}",
                status, payload
            )));
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = SearchRequest {
            query: "AAPL revenue",
            max_results: 3,
            search_depth: "basic",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["query"], "AAPL revenue");
        assert_eq!(json["max_results"], 3);
    }
}

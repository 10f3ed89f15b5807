//! Service configuration
//!
//! Read once at start-up from the process environment, after loading `.env`.
//! The analysis core itself takes no defaults; `default_target_score` and
//! `default_max_retries` are only applied by the HTTP layer.

use crate::error::AnalysisError;
use crate::Result;
use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    Gemini,
    Mock,
}

impl FromStr for LlmProvider {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(LlmProvider::Groq),
            "gemini" => Ok(LlmProvider::Gemini),
            "mock" => Ok(LlmProvider::Mock),
            other => Err(AnalysisError::ConfigError(format!(
                "Unknown LLM_PROVIDER '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    Tavily,
    Mock,
}

impl FromStr for SearchBackend {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tavily" => Ok(SearchBackend::Tavily),
            "mock" => Ok(SearchBackend::Mock),
            other => Err(AnalysisError::ConfigError(format!(
                "Unknown SEARCH_PROVIDER '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub llm_provider: LlmProvider,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub gemini_api_key: Option<String>,
    pub search_backend: SearchBackend,
    pub tavily_api_key: Option<String>,
    pub tavily_max_results: u32,
    pub port: u16,
    pub default_target_score: u8,
    pub default_max_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            llm_provider: LlmProvider::Groq,
            groq_api_key: None,
            groq_model: "llama-3.3-70b-versatile".to_string(),
            gemini_api_key: None,
            search_backend: SearchBackend::Tavily,
            tavily_api_key: None,
            tavily_max_results: 3,
            port: 8000,
            default_target_score: 5,
            default_max_retries: 5,
        }
    }
}

impl ServiceConfig {
    /// Load `.env` (if present) and read the environment
    pub fn from_env() -> Result<Self> {
        if dotenv::dotenv().is_err() {
            warn!(".env file not found, using process environment only");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let llm_provider = match get("LLM_PROVIDER") {
            Some(v) => v.parse()?,
            None => defaults.llm_provider,
        };
        let search_backend = match get("SEARCH_PROVIDER") {
            Some(v) => v.parse()?,
            None => defaults.search_backend,
        };

        let config = Self {
            llm_provider,
            groq_api_key: get("GROQ_API_KEY"),
            groq_model: get("GROQ_MODEL").unwrap_or(defaults.groq_model),
            gemini_api_key: get("GEMINI_API_KEY"),
            search_backend,
            tavily_api_key: get("TAVILY_API_KEY"),
            tavily_max_results: parse_or(get("TAVILY_MAX_RESULTS"), "TAVILY_MAX_RESULTS", defaults.tavily_max_results)?,
            port: parse_or(
                get("PORT").or_else(|| get("API_PORT")),
                "PORT",
                defaults.port,
            )?,
            default_target_score: parse_or(
                get("DEFAULT_TARGET_SCORE"),
                "DEFAULT_TARGET_SCORE",
                defaults.default_target_score,
            )?,
            default_max_retries: parse_or(
                get("DEFAULT_MAX_RETRIES"),
                "DEFAULT_MAX_RETRIES",
                defaults.default_max_retries,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// The selected providers must have their credentials
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        match self.llm_provider {
            LlmProvider::Groq if self.groq_api_key.is_none() => missing.push("GROQ_API_KEY"),
            LlmProvider::Gemini if self.gemini_api_key.is_none() => missing.push("GEMINI_API_KEY"),
            _ => {}
        }

        if self.search_backend == SearchBackend::Tavily && self.tavily_api_key.is_none() {
            missing.push("TAVILY_API_KEY");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::ConfigError(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| {
            AnalysisError::ConfigError(format!("{} is not a valid number: '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_keys() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gk"),
            ("TAVILY_API_KEY", "tk"),
        ]));
        let config = tokio_test::assert_ok!(config);
        assert_eq!(config.llm_provider, LlmProvider::Groq);
        assert_eq!(config.search_backend, SearchBackend::Tavily);
        assert_eq!(config.port, 8000);
        assert_eq!(config.default_target_score, 5);
        assert_eq!(config.default_max_retries, 5);
        assert_eq!(config.tavily_max_results, 3);
    }

    #[test]
    fn test_missing_keys_reported_together() {
        let err = ServiceConfig::from_lookup(lookup(&[])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("GROQ_API_KEY"));
        assert!(message.contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_mock_providers_need_no_keys() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "mock"),
            ("SEARCH_PROVIDER", "MOCK"),
            ("API_PORT", "9090"),
        ]))
        .unwrap();
        assert_eq!(config.llm_provider, LlmProvider::Mock);
        assert_eq!(config.search_backend, SearchBackend::Mock);
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = ServiceConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "mock"),
            ("SEARCH_PROVIDER", "mock"),
            ("DEFAULT_MAX_RETRIES", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError(_)));
    }

    #[test]
    fn test_unknown_provider() {
        let err = "openai".parse::<LlmProvider>().unwrap_err();
        assert!(err.to_string().contains("openai"));
    }
}

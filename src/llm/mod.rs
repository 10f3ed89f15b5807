//! Language capability
//!
//! The loop only needs "given a prompt, return text". Concrete clients
//! live in submodules; `build_language_model` picks one from config.

use crate::config::{LlmProvider, ServiceConfig};
use crate::error::AnalysisError;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod gemini;
pub mod groq;
pub mod mock;

pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use mock::{MockLanguageModel, PromptKind};

/// Trait for text completion (opaque to the loop)
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create the language model selected by `LLM_PROVIDER`
pub fn build_language_model(config: &ServiceConfig) -> Result<Arc<dyn LanguageModel>> {
    let missing = |key: &str| AnalysisError::ConfigError(format!("{} not configured", key));

    let model: Arc<dyn LanguageModel> = match config.llm_provider {
        LlmProvider::Groq => {
            let key = config
                .groq_api_key
                .clone()
                .ok_or_else(|| missing("GROQ_API_KEY"))?;
            Arc::new(GroqClient::new(key, config.groq_model.clone())?)
        }
        LlmProvider::Gemini => {
            let key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| missing("GEMINI_API_KEY"))?;
            Arc::new(GeminiClient::new(key)?)
        }
        LlmProvider::Mock => Arc::new(MockLanguageModel::new()),
    };

    Ok(model)
}

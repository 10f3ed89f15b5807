//! Error types for the financial research agent

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {

    // =============================
    // Core Loop Errors
    // =============================

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Search error: {0}")]
    SearchError(String),

    #[error("Loop bound exceeded: {0}")]
    LoopBoundExceeded(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

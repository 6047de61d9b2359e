//! LLM integration for the hospital kiosk
//!
//! Features:
//! - Ollama-compatible chat backend with retry and backoff
//! - Per-call decoding parameters (conversational vs deterministic)
//! - Capped rolling chat histories
//! - A scripted backend for tests and offline runs

pub mod backend;
pub mod history;
pub mod prompt;
pub mod scripted;

pub use backend::{FinishReason, GenerationResult, LlmBackend, LlmConfig, OllamaBackend};
pub use history::ChatHistory;
pub use kiosk_config::GenerationParams;
pub use prompt::{Message, Role};
pub use scripted::ScriptedBackend;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for kiosk_core::Error {
    fn from(err: LlmError) -> Self {
        kiosk_core::Error::Llm(err.to_string())
    }
}

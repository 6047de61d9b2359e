//! Shared error type

use thiserror::Error;

/// Result alias used by the collaborator traits
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by collaborators of the dialogue core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Speech recognition failed or produced nothing usable
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Speech synthesis rejected the input or failed
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),
}

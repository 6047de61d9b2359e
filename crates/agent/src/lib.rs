//! Hospital kiosk dialogue agent
//!
//! Features:
//! - Pure dialogue state machine over an explicit per-session context
//! - Yes/no/unsure confirmation classifier (LLM-backed or keyword-based)
//! - Department triage and wayfinding generation with bounded timeouts
//! - Shared in-memory reception store
//! - Per-session agent serializing turns and absorbing generation failures

pub mod agent;
pub mod classifier;
pub mod department;
pub mod dialogue;
pub mod generator;
pub mod reception;
pub mod replies;
pub mod traits;

pub use agent::{FailureKind, KioskAgent, TurnFailure, TurnReply};
pub use classifier::{
    parse_judgment, IntentClassifier, KeywordClassifier, LlmIntentClassifier, ScriptedClassifier,
};
pub use department::{extract_department, extract_department_or};
pub use dialogue::{
    ConfirmField, DialogueContext, DialogueEngine, DialoguePolicy, SideEffect, TurnEvent,
    TurnOutcome,
};
pub use generator::{GenerationStage, ResponseGenerator};
pub use reception::ReceptionStore;
pub use traits::Agent;

use kiosk_llm::LlmError;
use thiserror::Error;

/// Agent errors
///
/// Only generation can fail a turn. Ambiguous answers, exhausted retry
/// budgets and lookup misses are ordinary outcomes reported as
/// [`TurnEvent`]s.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Generation failed during {stage}: {source}")]
    Generation {
        stage: GenerationStage,
        #[source]
        source: LlmError,
    },

    #[error("Generation timed out during {stage} after {timeout_ms}ms")]
    GenerationTimeout { stage: GenerationStage, timeout_ms: u64 },
}

impl AgentError {
    pub fn stage(&self) -> GenerationStage {
        match self {
            AgentError::Generation { stage, .. } | AgentError::GenerationTimeout { stage, .. } => {
                *stage
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AgentError::GenerationTimeout { .. })
    }
}

impl From<AgentError> for kiosk_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::GenerationTimeout { timeout_ms, .. } => kiosk_core::Error::Timeout(timeout_ms),
            other => kiosk_core::Error::Llm(other.to_string()),
        }
    }
}

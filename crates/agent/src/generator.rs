//! Triage and direction generation
//!
//! Every call is bounded by the configured generation timeout. A timeout,
//! whether raised here or by the HTTP client, surfaces as
//! [`AgentError::GenerationTimeout`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kiosk_config::{GenerationParams, PromptsConfig};
use kiosk_llm::{ChatHistory, LlmBackend, LlmError, Message};

use crate::AgentError;

/// Which dialogue step asked for generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    /// Department recommendation from a symptom
    Triage,
    /// Registration completion with location and waiting time
    Registration,
    /// Questions after registration
    FollowUp,
    /// Wayfinding
    Direction,
}

impl GenerationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Triage => "triage",
            GenerationStage::Registration => "registration",
            GenerationStage::FollowUp => "follow_up",
            GenerationStage::Direction => "direction",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prompted free-text generation for the dialogue
#[derive(Clone)]
pub struct ResponseGenerator {
    backend: Arc<dyn LlmBackend>,
    params: GenerationParams,
    timeout: Duration,
    direction_prompt: String,
}

impl ResponseGenerator {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        params: GenerationParams,
        timeout: Duration,
        prompts: &PromptsConfig,
    ) -> Self {
        Self {
            backend,
            params,
            timeout,
            direction_prompt: prompts.direction.clone(),
        }
    }

    /// Recommend a department for a symptom, given earlier triage turns
    pub async fn recommend(&self, history: &ChatHistory, symptom: &str) -> Result<String, AgentError> {
        self.generate(GenerationStage::Triage, &history.with_user(symptom))
            .await
    }

    /// Confirm a registration and describe where to go
    pub async fn complete_registration(
        &self,
        history: &ChatHistory,
        request: &str,
    ) -> Result<String, AgentError> {
        self.generate(GenerationStage::Registration, &history.with_user(request))
            .await
    }

    pub async fn answer_follow_up(
        &self,
        history: &ChatHistory,
        question: &str,
    ) -> Result<String, AgentError> {
        self.generate(GenerationStage::FollowUp, &history.with_user(question))
            .await
    }

    /// Describe how to reach a place; each request starts a fresh conversation
    pub async fn guide_to(&self, destination: &str) -> Result<String, AgentError> {
        let messages = vec![
            Message::system(self.direction_prompt.clone()),
            Message::user(format!("{} 어디에 있나요?", destination.trim())),
        ];
        self.generate(GenerationStage::Direction, &messages).await
    }

    async fn generate(
        &self,
        stage: GenerationStage,
        messages: &[Message],
    ) -> Result<String, AgentError> {
        let start = Instant::now();
        let timeout_ms = self.timeout.as_millis() as u64;

        let result = tokio::time::timeout(self.timeout, self.backend.generate(messages, &self.params))
            .await
            .map_err(|_| AgentError::GenerationTimeout { stage, timeout_ms })?;

        let text = match result {
            Ok(result) => result.text.trim().to_string(),
            Err(LlmError::Timeout) => return Err(AgentError::GenerationTimeout { stage, timeout_ms }),
            Err(source) => return Err(AgentError::Generation { stage, source }),
        };

        if text.is_empty() {
            return Err(AgentError::Generation {
                stage,
                source: LlmError::InvalidResponse("Empty generation".to_string()),
            });
        }

        tracing::debug!(
            %stage,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = text.chars().count(),
            "Generated reply"
        );
        Ok(text)
    }
}

//! Per-session kiosk agent
//!
//! Owns one session's [`DialogueContext`] and runs turns against the shared
//! [`DialogueEngine`]. The context lock is held for the whole turn, so a
//! session's turns never interleave, while different sessions proceed in
//! parallel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use kiosk_core::{ConversationState, SubState};

use crate::dialogue::{DialogueContext, DialogueEngine, SideEffect, TurnEvent};
use crate::generator::GenerationStage;
use crate::traits::Agent;
use crate::{replies, AgentError};

/// What kind of failure interrupted a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Generation,
    Timeout,
}

/// Typed failure attached to a reply when generation did not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFailure {
    pub kind: FailureKind,
    pub stage: GenerationStage,
    pub message: String,
}

impl From<&AgentError> for TurnFailure {
    fn from(err: &AgentError) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else {
            FailureKind::Generation
        };
        Self {
            kind,
            stage: err.stage(),
            message: err.to_string(),
        }
    }
}

/// Reply for one turn, as returned to the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReply {
    pub session_id: String,
    pub reply: String,
    pub state: ConversationState,
    pub sub_state: Option<SubState>,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<TurnEvent>,
    /// Reception written by this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effect: Option<SideEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<TurnFailure>,
}

impl TurnReply {
    fn new(session_id: &str, reply: String, ctx: &DialogueContext) -> Self {
        Self {
            session_id: session_id.to_string(),
            reply,
            state: ctx.state,
            sub_state: ctx.sub_state,
            retry_count: ctx.retry_count,
            events: Vec::new(),
            side_effect: None,
            failure: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

pub struct KioskAgent {
    session_id: String,
    engine: Arc<DialogueEngine>,
    context: Mutex<DialogueContext>,
}

impl KioskAgent {
    pub fn new(session_id: impl Into<String>, engine: Arc<DialogueEngine>) -> Self {
        let context = engine.new_context();
        Self::with_context(session_id, engine, context)
    }

    /// Resume a session from a saved context
    pub fn with_context(
        session_id: impl Into<String>,
        engine: Arc<DialogueEngine>,
        context: DialogueContext,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            engine,
            context: Mutex::new(context),
        }
    }

    pub fn engine(&self) -> &Arc<DialogueEngine> {
        &self.engine
    }

    /// Run one turn to completion
    ///
    /// Never fails. A generation failure yields a "please try again" reply
    /// with the failure attached, and the context stays as it was before
    /// the turn.
    pub async fn process_turn(&self, utterance: &str) -> TurnReply {
        let mut ctx = self.context.lock().await;

        match self.engine.handle_turn(&ctx, utterance).await {
            Ok(outcome) => {
                if let Some(effect) = &outcome.side_effect {
                    self.engine.apply(effect);
                }
                *ctx = outcome.context;

                let mut reply = TurnReply::new(&self.session_id, outcome.reply, &ctx);
                reply.events = outcome.events;
                reply.side_effect = outcome.side_effect;
                reply
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    state = %ctx.state,
                    error = %err,
                    "Turn failed, keeping pre-turn state"
                );

                let mut reply =
                    TurnReply::new(&self.session_id, replies::TRY_AGAIN.to_string(), &ctx);
                reply.failure = Some(TurnFailure::from(&err));
                reply
            }
        }
    }

    pub async fn state(&self) -> ConversationState {
        self.context.lock().await.state
    }
}

#[async_trait]
impl Agent for KioskAgent {
    async fn process(&self, utterance: &str) -> TurnReply {
        self.process_turn(utterance).await
    }

    async fn snapshot(&self) -> DialogueContext {
        self.context.lock().await.clone()
    }

    async fn restore(&self, context: DialogueContext) {
        *self.context.lock().await = context;
    }

    async fn reset(&self) {
        self.context.lock().await.reset();
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

//! Deterministic backend for tests and offline runs
//!
//! Replies are popped from a FIFO queue; when it runs dry the fallback text
//! is returned. Every request is recorded for later inspection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use kiosk_config::GenerationParams;

use crate::backend::{FinishReason, GenerationResult, LlmBackend};
use crate::prompt::Message;
use crate::LlmError;

#[derive(Clone)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
    fallback: String,
    delay: Option<Duration>,
    available: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            fallback: "scripted reply".to_string(),
            delay: None,
            available: true,
        }
    }

    /// Backend pre-loaded with successful replies
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for reply in replies {
            backend.push_reply(reply);
        }
        backend
    }

    /// Text returned once the queue is empty
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Sleep before answering, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies.lock().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Requests received so far, oldest first
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn generate(
        &self,
        messages: &[Message],
        _params: &GenerationParams,
    ) -> Result<GenerationResult, LlmError> {
        self.calls.lock().push(messages.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.replies.lock().pop_front();
        let text = match next {
            Some(reply) => reply?,
            None => self.fallback.clone(),
        };

        Ok(GenerationResult {
            tokens: text.chars().count(),
            text,
            total_time_ms: 0,
            finish_reason: FinishReason::Stop,
        })
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

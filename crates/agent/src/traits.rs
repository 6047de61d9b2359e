//! Agent trait for abstraction and testability

use async_trait::async_trait;

use crate::agent::TurnReply;
use crate::dialogue::DialogueContext;

/// A conversational agent bound to one session
///
/// Turn handling is infallible at this level: failures are reported on the
/// returned [`TurnReply`] rather than as errors.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Handle one utterance
    async fn process(&self, utterance: &str) -> TurnReply;

    /// Copy of the current dialogue context
    async fn snapshot(&self) -> DialogueContext;

    /// Replace the dialogue context, e.g. to resume a saved session
    async fn restore(&self, context: DialogueContext);

    /// Return to IDLE and forget everything collected so far
    async fn reset(&self);

    fn session_id(&self) -> &str;
}

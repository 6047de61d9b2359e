//! Hospital kiosk server
//!
//! Thin HTTP turn orchestrator: routes utterances (typed or recorded) to a
//! per-session dialogue agent and returns the reply, optionally as speech.

pub mod http;
pub mod metrics;
pub mod session;
pub mod state;

pub use http::create_router;
pub use metrics::{
    init_metrics, record_generation_failure, record_health_probe, record_stt_latency,
    record_tts_latency, record_turn, record_turn_event,
};
pub use session::{Session, SessionManager, SessionSnapshot};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Max sessions reached ({0})")]
    SessionLimit(usize),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Upstream timed out after {0}ms")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<kiosk_core::Error> for ServerError {
    fn from(err: kiosk_core::Error) -> Self {
        match err {
            kiosk_core::Error::Transcription(msg) => ServerError::Transcription(msg),
            kiosk_core::Error::Synthesis(msg) => ServerError::Synthesis(msg),
            kiosk_core::Error::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            kiosk_core::Error::Timeout(ms) => ServerError::Timeout(ms),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Transcription(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Synthesis(_) => StatusCode::BAD_GATEWAY,
            ServerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        StatusCode::from(&err)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StatusCode::from(ServerError::SessionNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StatusCode::from(ServerError::from(kiosk_core::Error::Synthesis("empty".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            StatusCode::from(ServerError::from(kiosk_core::Error::Transcription("noise".into()))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            StatusCode::from(ServerError::from(kiosk_core::Error::Timeout(30000))),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}

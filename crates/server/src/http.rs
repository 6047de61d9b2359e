//! HTTP Endpoints
//!
//! REST API for the kiosk front end.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Json, Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use kiosk_agent::{FailureKind, SideEffect, TurnEvent, TurnReply};
use kiosk_config::constants::timeouts;
use kiosk_core::AudioClip;

use crate::metrics::{
    metrics_handler, record_generation_failure, record_health_probe, record_stt_latency,
    record_tts_latency, record_turn, record_turn_event,
};
use crate::session::{Session, SessionSnapshot};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let body_limit = state.settings.stt.max_audio_bytes;

    let mut router = Router::new()
        // Session endpoints
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // Turns
        .route("/api/sessions/:id/turn", post(text_turn))
        .route("/api/sessions/:id/voice", post(voice_turn))
        .route("/api/speak", post(speak))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check));

    if state.settings.observability.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// An empty origin list allows any origin; invalid entries are skipped.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        return CorsLayer::new();
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(%origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    tracing::info!("CORS configured with {} origins", parsed.len());
    base.allow_origin(parsed)
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServerError> {
    let session = state.sessions.create()?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "session_id": session.id })),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or(ServerError::SessionNotFound(id))?;
    Ok(Json(session.snapshot().await))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::SessionNotFound(id))
    }
}

#[derive(Debug, Deserialize)]
struct TurnRequest {
    text: String,
}

/// Typed utterance; unknown session ids are created on first use
async fn text_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnReply>, ServerError> {
    let session = state.sessions.get_or_create(&id)?;
    Ok(Json(run_turn(&session, &request.text).await))
}

#[derive(Debug, Serialize)]
struct VoiceTurnResponse {
    transcript: String,
    #[serde(flatten)]
    turn: TurnReply,
    /// Spoken reply; absent when synthesis failed
    audio_url: Option<String>,
}

/// Recorded utterance: transcribe, run the turn, speak the reply
async fn voice_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<VoiceTurnResponse>, ServerError> {
    let session = state.sessions.get_or_create(&id)?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("audio/webm");
    let clip = AudioClip::new(body.to_vec(), upload_name(content_type), content_type);

    let start = Instant::now();
    let transcript = state.stt.transcribe(&clip).await;
    record_stt_latency(start.elapsed(), transcript.is_ok());
    let transcript = transcript?;

    tracing::debug!(session_id = %id, text = %transcript.text, "Transcribed utterance");

    let turn = run_turn(&session, &transcript.text).await;

    let start = Instant::now();
    let audio = state.tts.synthesize(&turn.reply, state.settings.tts.speed).await;
    record_tts_latency(start.elapsed(), audio.is_ok());
    let audio_url = match audio {
        Ok(artifact) => Some(artifact.url),
        Err(e) => {
            tracing::warn!(session_id = %id, error = %e, "Reply synthesis failed");
            None
        }
    };

    Ok(Json(VoiceTurnResponse {
        transcript: transcript.text,
        turn,
        audio_url,
    }))
}

/// File name the recognizer sees, from the upload's MIME type
fn upload_name(content_type: &str) -> String {
    let subtype = content_type
        .split(';')
        .next()
        .and_then(|mime| mime.trim().split('/').nth(1))
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("webm");
    format!("audio.{subtype}")
}

async fn run_turn(session: &Session, text: &str) -> TurnReply {
    let start = Instant::now();
    let reply = session.process(text).await;
    record_turn(reply.state.as_str(), reply.is_failure(), start.elapsed());

    for event in &reply.events {
        record_turn_event(event_label(event));
    }
    if let Some(SideEffect::CommitReception { .. }) = reply.side_effect {
        record_turn_event("reception_committed");
    }
    if let Some(failure) = &reply.failure {
        let kind = match failure.kind {
            FailureKind::Generation => "generation",
            FailureKind::Timeout => "timeout",
        };
        record_generation_failure(kind, failure.stage.as_str());
    }
    reply
}

fn event_label(event: &TurnEvent) -> &'static str {
    match event {
        TurnEvent::Terminated => "terminated",
        TurnEvent::NothingHeard => "nothing_heard",
        TurnEvent::MenuNotRecognized => "menu_not_recognized",
        TurnEvent::ClassificationAmbiguous { .. } => "classification_ambiguous",
        TurnEvent::RetryBudgetExhausted { .. } => "retry_budget_exhausted",
        TurnEvent::TriageDeclined => "triage_declined",
        TurnEvent::LookupHit => "lookup_hit",
        TurnEvent::LookupMiss => "lookup_miss",
    }
}

#[derive(Debug, Deserialize)]
struct SpeakRequest {
    text: String,
    speed: Option<f32>,
}

async fn speak(
    State(state): State<AppState>,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if request.text.trim().is_empty() {
        return Err(ServerError::InvalidRequest("text must not be empty".into()));
    }

    let speed = request.speed.unwrap_or(state.settings.tts.speed);
    let start = Instant::now();
    let result = state.tts.synthesize(&request.text, speed).await;
    record_tts_latency(start.elapsed(), result.is_ok());

    let artifact = result?;
    Ok(Json(serde_json::json!({ "audio_url": artifact.url })))
}

/// Liveness probe bounded by the health timeout; a timeout counts as down
async fn probe(component: &'static str, check: impl Future<Output = bool>) -> bool {
    let healthy = tokio::time::timeout(Duration::from_millis(timeouts::HEALTH_PROBE_MS), check)
        .await
        .unwrap_or(false);
    record_health_probe(component, healthy);
    healthy
}

fn status_of(healthy: bool) -> &'static str {
    if healthy {
        "ok"
    } else {
        "unavailable"
    }
}

/// Aggregated liveness of the speech and generation collaborators
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (stt, llm, tts) = tokio::join!(
        probe("stt", state.stt.is_available()),
        probe("llm", state.llm.is_available()),
        probe("tts", state.tts.is_available()),
    );

    let all_healthy = stt && llm && tts;
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if all_healthy { "healthy" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "checks": {
                "stt": { "status": status_of(stt), "model": state.stt.model_name() },
                "llm": { "status": status_of(llm), "model": state.llm.model_name() },
                "tts": { "status": status_of(tts), "model": state.tts.model_name() },
            }
        })),
    )
}

/// Ready when there is room for a session and the model answers
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let session_count = state.sessions.count();
    let capacity_ok = session_count < state.sessions.max_sessions();
    let llm_ok = probe("llm", state.llm.is_available()).await;

    let ready = capacity_ok && llm_ok;
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "sessions": { "status": status_of(capacity_ok), "count": session_count },
                "llm": { "status": status_of(llm_ok) },
            }
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use kiosk_config::{ClassifierKind, Settings};
    use kiosk_core::{AudioArtifact, SpeechToText, TextToSpeech, Transcript};
    use kiosk_llm::ScriptedBackend;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedStt {
        text: &'static str,
        available: bool,
    }

    #[async_trait]
    impl SpeechToText for FixedStt {
        async fn transcribe(&self, audio: &AudioClip) -> kiosk_core::Result<Transcript> {
            if audio.is_empty() {
                return Err(kiosk_core::Error::Transcription("Empty audio".into()));
            }
            Ok(Transcript::new(self.text))
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct EchoTts;

    #[async_trait]
    impl TextToSpeech for EchoTts {
        async fn synthesize(&self, text: &str, _speed: f32) -> kiosk_core::Result<AudioArtifact> {
            if text.trim().is_empty() {
                return Err(kiosk_core::Error::Synthesis("Empty text".into()));
            }
            Ok(AudioArtifact::new("http://tts/audio/reply.wav"))
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct StalledTts;

    #[async_trait]
    impl TextToSpeech for StalledTts {
        async fn synthesize(&self, _text: &str, _speed: f32) -> kiosk_core::Result<AudioArtifact> {
            Err(kiosk_core::Error::Timeout(30000))
        }

        async fn is_available(&self) -> bool {
            false
        }

        fn model_name(&self) -> &str {
            "stalled"
        }
    }

    fn app_with(backend: ScriptedBackend, stt_available: bool) -> Router {
        let mut settings = Settings::default();
        settings.dialogue.classifier = ClassifierKind::Keyword;
        let state = AppState::with_components(
            settings,
            Arc::new(backend),
            Arc::new(FixedStt {
                text: "길찾기",
                available: stt_available,
            }),
            Arc::new(EchoTts),
        );
        create_router(state)
    }

    fn app() -> Router {
        app_with(ScriptedBackend::new(), true)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_text_turn_creates_session() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/sessions/lobby/turn",
                serde_json::json!({ "text": "접수" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["session_id"], "lobby");
        assert_eq!(body["state"], "ASK_NAME");
        assert_eq!(body["reply"], "접수를 시작하겠습니다. 이름을 말씀해주세요.");
        assert!(body.get("failure").is_none());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let app = app();

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/sessions", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/api/sessions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["state"], "IDLE");

        let response = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/sessions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                Request::get(format!("/api/sessions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sessions_do_not_expose_visitor_details() {
        let app = app();
        for text in ["접수", "홍길동", "네", "010-1234-5678", "네"] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/sessions/front-desk/turn",
                    serde_json::json!({ "text": text }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(Request::get("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = app
            .oneshot(
                Request::get("/api/sessions/front-desk")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["state"], "ASK_ADDRESS");
        assert!(body.get("profile").is_none());
        let raw = body.to_string();
        assert!(!raw.contains("홍길동"));
        assert!(!raw.contains("010-1234-5678"));
    }

    #[tokio::test]
    async fn test_speech_timeout_is_gateway_timeout() {
        let state = AppState::with_components(
            Settings::default(),
            Arc::new(ScriptedBackend::new()),
            Arc::new(FixedStt {
                text: "길찾기",
                available: true,
            }),
            Arc::new(StalledTts),
        );
        let response = create_router(state)
            .oneshot(json_request(
                "POST",
                "/api/speak",
                serde_json::json!({ "text": "안녕하세요" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_voice_turn_round_trip() {
        let response = app()
            .oneshot(
                Request::post("/api/sessions/lobby/voice")
                    .header(CONTENT_TYPE, "audio/webm")
                    .body(Body::from(vec![1u8, 2, 3]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["transcript"], "길찾기");
        assert_eq!(body["state"], "FIND_DIRECTION");
        assert_eq!(body["reply"], "어느 곳으로 가시나요?");
        assert_eq!(body["audio_url"], "http://tts/audio/reply.wav");
    }

    #[tokio::test]
    async fn test_empty_audio_is_unprocessable() {
        let response = app()
            .oneshot(
                Request::post("/api/sessions/lobby/voice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_generation_failure_reported_in_body() {
        let backend = ScriptedBackend::new();
        backend.push_error(kiosk_llm::LlmError::Network("refused".into()));
        let app = app_with(backend, true);

        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/sessions/s1/turn",
                serde_json::json!({ "text": "길찾기" }),
            ))
            .await
            .unwrap();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/sessions/s1/turn",
                serde_json::json!({ "text": "정형외과" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["state"], "FIND_DIRECTION");
        assert_eq!(body["failure"]["kind"], "generation");
        assert_eq!(body["failure"]["stage"], "direction");
    }

    #[tokio::test]
    async fn test_speak_rejects_empty_text() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/speak",
                serde_json::json!({ "text": "  " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/speak",
                serde_json::json!({ "text": "안녕하세요", "speed": 1.2 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["audio_url"], "http://tts/audio/reply.wav");
    }

    #[tokio::test]
    async fn test_health_reports_degraded_component() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");

        let response = app_with(ScriptedBackend::new(), false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["stt"]["status"], "unavailable");
        assert_eq!(body["checks"]["llm"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_follows_llm() {
        let response = app_with(ScriptedBackend::new().unavailable(), true)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let response = app()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_upload_name() {
        assert_eq!(upload_name("audio/webm;codecs=opus"), "audio.webm");
        assert_eq!(upload_name("audio/wav"), "audio.wav");
        assert_eq!(upload_name("garbage"), "audio.webm");
    }
}

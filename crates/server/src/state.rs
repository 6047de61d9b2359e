//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

use kiosk_agent::{DialogueEngine, ReceptionStore};
use kiosk_config::Settings;
use kiosk_core::{SpeechToText, TextToSpeech};
use kiosk_llm::{LlmBackend, LlmConfig, OllamaBackend};
use kiosk_pipeline::{HttpSpeechToText, HttpTextToSpeech};

use crate::metrics::init_metrics;
use crate::session::SessionManager;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<SessionManager>,
    pub engine: Arc<DialogueEngine>,
    pub llm: Arc<dyn LlmBackend>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Wire the HTTP collaborators named in `settings`
    pub fn new(settings: Settings) -> Result<Self, ServerError> {
        let llm = OllamaBackend::new(LlmConfig::from(&settings.llm))
            .map_err(|e| ServerError::Internal(format!("LLM client: {e}")))?;
        let stt = HttpSpeechToText::new((&settings.stt).into())
            .map_err(|e| ServerError::Internal(format!("STT client: {e}")))?;
        let tts = HttpTextToSpeech::new((&settings.tts).into())
            .map_err(|e| ServerError::Internal(format!("TTS client: {e}")))?;

        Ok(Self::with_components(
            settings,
            Arc::new(llm),
            Arc::new(stt),
            Arc::new(tts),
        ))
    }

    /// Build state around explicit collaborators
    pub fn with_components(
        settings: Settings,
        llm: Arc<dyn LlmBackend>,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
    ) -> Self {
        let store = Arc::new(ReceptionStore::new());
        let engine = Arc::new(DialogueEngine::from_settings(
            &settings,
            Arc::clone(&llm),
            store,
        ));
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&engine),
            settings.server.max_sessions,
            Duration::from_secs(settings.server.session_timeout_secs),
        ));

        Self {
            settings: Arc::new(settings),
            sessions,
            engine,
            llm,
            stt,
            tts,
            metrics: init_metrics(),
        }
    }
}

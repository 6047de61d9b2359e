//! HTTP STT Backend - Calls the Whisper recognition service
//!
//! The service accepts one encoded recording per request (multipart field
//! `file`), converts it to 16 kHz mono itself and answers `{"text": ...}`.
//! Recognized text passes through transcript normalization before it
//! reaches the dialogue.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

use kiosk_config::SttSettings;
use kiosk_core::{AudioClip, SpeechToText, Transcript};
use kiosk_text_processing::{normalize_transcript, DualForm};

use crate::PipelineError;

/// HTTP STT Backend configuration
#[derive(Debug, Clone)]
pub struct HttpSttConfig {
    /// Base URL of the recognition service
    pub url: String,
    /// Language code reported on transcripts
    pub language: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Largest accepted upload
    pub max_audio_bytes: usize,
    /// Side kept from `(A)/(B)` markers
    pub dual_form: DualForm,
}

impl Default for HttpSttConfig {
    fn default() -> Self {
        Self::from(&SttSettings::default())
    }
}

impl From<&SttSettings> for HttpSttConfig {
    fn from(settings: &SttSettings) -> Self {
        Self {
            url: settings.endpoint.trim_end_matches('/').to_string(),
            language: settings.language.clone(),
            timeout_ms: settings.timeout_ms,
            max_audio_bytes: settings.max_audio_bytes,
            dual_form: if settings.prefer_spoken_form {
                DualForm::Right
            } else {
                DualForm::Left
            },
        }
    }
}

/// Response from the recognition service
#[derive(Debug, Deserialize)]
struct SttResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP STT Backend
pub struct HttpSpeechToText {
    config: HttpSttConfig,
    client: reqwest::Client,
}

impl HttpSpeechToText {
    /// Create a new HTTP STT backend
    pub fn new(config: HttpSttConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PipelineError::Stt(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "HTTP STT backend configured for {} (language: {})",
            config.url,
            config.language
        );

        Ok(Self { config, client })
    }

    /// Reject audio the service cannot handle, before any network call
    fn check_clip(&self, audio: &AudioClip) -> Result<(), PipelineError> {
        if audio.is_empty() {
            return Err(PipelineError::Stt("Audio is empty".to_string()));
        }
        if audio.len() > self.config.max_audio_bytes {
            return Err(PipelineError::Stt(format!(
                "Audio exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                self.config.max_audio_bytes
            )));
        }
        Ok(())
    }

    /// Turn a service reply into a usable transcript
    fn finish(&self, response: SttResponse, latency_ms: u64) -> Result<Transcript, PipelineError> {
        if let Some(error) = response.error {
            return Err(PipelineError::Stt(error));
        }

        let text = normalize_transcript(&response.text, self.config.dual_form);
        if text.is_empty() {
            return Err(PipelineError::Stt("No speech recognized".to_string()));
        }

        Ok(Transcript {
            text,
            language: Some(self.config.language.clone()),
            latency_ms,
        })
    }

    async fn request(&self, audio: &AudioClip) -> Result<SttResponse, PipelineError> {
        let part = reqwest::multipart::Part::bytes(audio.data.clone())
            .file_name(audio.filename.clone())
            .mime_str(&audio.content_type)
            .map_err(|e| PipelineError::Stt(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/stt", self.config.url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PipelineError::Timeout(self.config.timeout_ms)
                } else {
                    PipelineError::Stt(format!("HTTP STT request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Stt(format!(
                "HTTP STT service returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::Stt(format!("Failed to parse STT response: {}", e)))
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe(&self, audio: &AudioClip) -> kiosk_core::Result<Transcript> {
        self.check_clip(audio)?;

        let start = Instant::now();
        let response = self.request(audio).await?;
        let transcript = self.finish(response, start.elapsed().as_millis() as u64)?;

        tracing::debug!(
            text = %transcript.text,
            latency_ms = transcript.latency_ms,
            "Transcribed utterance"
        );
        Ok(transcript)
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/health", self.config.url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        "whisper-http"
    }
}

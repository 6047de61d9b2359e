//! HTTP TTS Backend - Calls the speech synthesis service
//!
//! `POST {url}/tts` with `{"text", "speed"}` answers `{"audio_path": "<id>.wav"}`;
//! the file is then served by the same service under `/audio/<id>.wav`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use kiosk_config::constants::speech::{MAX_SPEED, MIN_SPEED};
use kiosk_config::TtsSettings;
use kiosk_core::{AudioArtifact, TextToSpeech};

use crate::PipelineError;

/// HTTP TTS Backend configuration
#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    /// Base URL of the synthesis service
    pub url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for HttpTtsConfig {
    fn default() -> Self {
        Self::from(&TtsSettings::default())
    }
}

impl From<&TtsSettings> for HttpTtsConfig {
    fn from(settings: &TtsSettings) -> Self {
        Self {
            url: settings.endpoint.trim_end_matches('/').to_string(),
            timeout_ms: settings.timeout_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    speed: f32,
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    audio_path: String,
}

/// Clamp a requested speed into the range the synthesizer supports
pub fn clamp_speed(speed: f32) -> f32 {
    if speed.is_nan() {
        return 1.0;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// HTTP TTS Backend
pub struct HttpTextToSpeech {
    config: HttpTtsConfig,
    client: reqwest::Client,
}

impl HttpTextToSpeech {
    pub fn new(config: HttpTtsConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PipelineError::Tts(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Absolute URL for a file name returned by the service
    fn artifact_for(&self, audio_path: &str) -> AudioArtifact {
        if audio_path.starts_with("http://") || audio_path.starts_with("https://") {
            return AudioArtifact::new(audio_path);
        }
        let file_name = audio_path.rsplit('/').next().unwrap_or(audio_path);
        AudioArtifact::new(format!("{}/audio/{}", self.config.url, file_name))
    }

    async fn request(&self, text: &str, speed: f32) -> Result<TtsResponse, PipelineError> {
        let response = self
            .client
            .post(format!("{}/tts", self.config.url))
            .json(&TtsRequest { text, speed })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PipelineError::Timeout(self.config.timeout_ms)
                } else {
                    PipelineError::Tts(format!("HTTP TTS request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Tts(format!(
                "HTTP TTS service returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::Tts(format!("Failed to parse TTS response: {}", e)))
    }
}

#[async_trait]
impl TextToSpeech for HttpTextToSpeech {
    async fn synthesize(&self, text: &str, speed: f32) -> kiosk_core::Result<AudioArtifact> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::Tts("Text is missing or empty".to_string()).into());
        }

        let speed = clamp_speed(speed);
        let response = self.request(text, speed).await?;
        let artifact = self.artifact_for(&response.audio_path);

        tracing::debug!(url = %artifact.url, chars = text.chars().count(), "Synthesized reply");
        Ok(artifact)
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
        "melo-tts-http"
    }
}

//! Speech processing traits

use crate::{AudioArtifact, AudioClip, Result, Transcript};
use async_trait::async_trait;

/// Speech-to-Text interface
///
/// Implementations:
/// - `HttpSpeechToText` - Whisper served over HTTP
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(HttpSpeechToText::new(config)?);
/// let transcript = stt.transcribe(&clip).await?;
/// println!("Transcribed: {}", transcript.text);
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe one recorded utterance
    ///
    /// Fails with [`crate::Error::Transcription`] when the audio is rejected
    /// or nothing intelligible was recognized.
    async fn transcribe(&self, audio: &AudioClip) -> Result<Transcript>;

    /// Liveness probe of the backing service
    async fn is_available(&self) -> bool;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-Speech interface
///
/// Implementations:
/// - `HttpTextToSpeech` - synthesis service returning a fetchable audio URL
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize text to an audio artifact
    ///
    /// Empty text is rejected with [`crate::Error::Synthesis`].
    ///
    /// # Arguments
    /// * `text` - Text to synthesize
    /// * `speed` - Playback speed multiplier
    async fn synthesize(&self, text: &str, speed: f32) -> Result<AudioArtifact>;

    /// Liveness probe of the backing service
    async fn is_available(&self) -> bool;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

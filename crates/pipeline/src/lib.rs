//! Speech collaborators for the hospital kiosk
//!
//! HTTP adapters implementing the core speech traits:
//! - [`HttpSpeechToText`]: Whisper recognition service
//! - [`HttpTextToSpeech`]: synthesis service returning fetchable audio

pub mod stt;
pub mod tts;

pub use stt::{HttpSpeechToText, HttpSttConfig};
pub use tts::{HttpTextToSpeech, HttpTtsConfig};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl From<PipelineError> for kiosk_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Stt(msg) => kiosk_core::Error::Transcription(msg),
            PipelineError::Tts(msg) => kiosk_core::Error::Synthesis(msg),
            PipelineError::Timeout(ms) => kiosk_core::Error::Timeout(ms),
        }
    }
}

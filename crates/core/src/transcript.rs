//! Speech recognition results

use serde::{Deserialize, Serialize};

/// Recognized text for one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Language reported by the recognizer, if any
    #[serde(default)]
    pub language: Option<String>,
    /// Wall time spent recognizing
    #[serde(default)]
    pub latency_ms: u64,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            latency_ms: 0,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

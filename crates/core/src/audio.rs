//! Audio payloads exchanged with the speech collaborators

use serde::{Deserialize, Serialize};

/// Encoded audio as uploaded by the kiosk front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Raw encoded bytes (webm, wav, ...)
    pub data: Vec<u8>,
    /// File name hint forwarded to the recognizer
    pub filename: String,
    /// MIME type of `data`
    pub content_type: String,
}

impl AudioClip {
    pub fn new(data: Vec<u8>, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            data,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Clip from a browser recording
    pub fn webm(data: Vec<u8>) -> Self {
        Self::new(data, "audio.webm", "audio/webm")
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// Reference to synthesized speech
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioArtifact {
    /// Where the front end can fetch the audio
    pub url: String,
}

impl AudioArtifact {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// File name component of the URL
    pub fn file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webm_clip() {
        let clip = AudioClip::webm(vec![1, 2, 3]);
        assert_eq!(clip.len(), 3);
        assert_eq!(clip.content_type, "audio/webm");
        assert!(!clip.is_empty());
    }

    #[test]
    fn test_artifact_file_name() {
        let artifact = AudioArtifact::new("/audio/2f1c.wav");
        assert_eq!(artifact.file_name(), "2f1c.wav");
        assert_eq!(AudioArtifact::new("x.wav").file_name(), "x.wav");
    }
}

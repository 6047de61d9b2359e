//! Collaborator traits
//!
//! The dialogue core talks to speech recognition and speech synthesis only
//! through these traits, so that HTTP adapters and test doubles are
//! interchangeable.

mod speech;

pub use speech::{SpeechToText, TextToSpeech};

//! Core traits and types for the hospital kiosk
//!
//! This crate provides foundational types used across all other crates:
//! - Dialogue states and the visitor data collected while routing
//! - Reception records and their lookup key
//! - Audio and transcript value types
//! - Collaborator traits for speech recognition and synthesis
//! - Error types

pub mod audio;
pub mod conversation;
pub mod error;
pub mod profile;
pub mod reception;
pub mod traits;
pub mod transcript;

pub use audio::{AudioArtifact, AudioClip};
pub use conversation::{ConversationState, Judgment, SubState};
pub use error::{Error, Result};
pub use profile::{LookupQuery, VisitorProfile};
pub use reception::{ReceptionKey, ReceptionRecord};
pub use transcript::Transcript;

pub use traits::{SpeechToText, TextToSpeech};

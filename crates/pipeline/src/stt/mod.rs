//! Speech-to-Text adapters

mod http_backend;

pub use http_backend::{HttpSpeechToText, HttpSttConfig};

//! Text-to-Speech adapters

mod http_backend;

pub use http_backend::{clamp_speed, HttpTextToSpeech, HttpTtsConfig};

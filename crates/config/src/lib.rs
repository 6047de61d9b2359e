//! Configuration management for the hospital kiosk
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (`KIOSK__` prefix, `__` separator)
//!
//! Prompt templates live in [`prompts`] and can be overridden from the same
//! files, so wording changes never need a rebuild.

pub mod constants;
pub mod prompts;
pub mod settings;

pub use prompts::PromptsConfig;
pub use settings::{
    load_settings, load_settings_from, ClassifierKind, DialogueConfig, GenerationParams, LlmSettings,
    ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings, SttSettings, TtsSettings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for kiosk_core::Error {
    fn from(err: ConfigError) -> Self {
        kiosk_core::Error::Config(err.to_string())
    }
}

//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::{dialogue, endpoints, speech, timeouts};
use crate::{ConfigError, PromptsConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Dialogue policy parameters
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Generation backend
    #[serde(default)]
    pub llm: LlmSettings,

    /// Speech recognition collaborator
    #[serde(default)]
    pub stt: SttSettings,

    /// Speech synthesis collaborator
    #[serde(default)]
    pub tts: TtsSettings,

    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_dialogue()?;
        self.validate_llm()?;
        self.validate_speech()?;

        if !self.prompts.classifier.contains(crate::prompts::UTTERANCE_PLACEHOLDER) {
            return Err(ConfigError::invalid(
                "prompts.classifier",
                "Classifier prompt must contain {text}",
            ));
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "Port must be non-zero"));
        }
        if self.server.max_sessions == 0 {
            return Err(ConfigError::invalid(
                "server.max_sessions",
                "At least one session must be allowed",
            ));
        }
        Ok(())
    }

    fn validate_dialogue(&self) -> Result<(), ConfigError> {
        let d = &self.dialogue;

        if d.max_confirmation_retries == 0 {
            return Err(ConfigError::invalid(
                "dialogue.max_confirmation_retries",
                "Retry budget must be at least 1",
            ));
        }
        if d.history_cap < dialogue::MIN_HISTORY_CAP {
            return Err(ConfigError::invalid(
                "dialogue.history_cap",
                format!(
                    "Must keep at least {} messages, got {}",
                    dialogue::MIN_HISTORY_CAP,
                    d.history_cap
                ),
            ));
        }
        if d.generation_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "dialogue.generation_timeout_ms",
                "Timeout must be non-zero",
            ));
        }
        if d.classification_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "dialogue.classification_timeout_ms",
                "Timeout must be non-zero",
            ));
        }
        if d.termination_phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "dialogue.termination_phrases",
                "At least one termination phrase is required",
            ));
        }
        if d.fallback_department.trim().is_empty() {
            return Err(ConfigError::invalid(
                "dialogue.fallback_department",
                "Fallback label must not be empty",
            ));
        }
        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        if self.llm.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("llm.endpoint", "Endpoint must not be empty"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::invalid("llm.model", "Model must not be empty"));
        }
        for (field, params) in [
            ("llm.generation", &self.llm.generation),
            ("llm.classification", &self.llm.classification),
        ] {
            if params.max_tokens == 0 {
                return Err(ConfigError::invalid(field, "max_tokens must be non-zero"));
            }
            if !(0.0..=2.0).contains(&params.temperature) {
                return Err(ConfigError::invalid(
                    field,
                    format!("temperature must be between 0.0 and 2.0, got {}", params.temperature),
                ));
            }
            if !(0.0..=1.0).contains(&params.top_p) {
                return Err(ConfigError::invalid(
                    field,
                    format!("top_p must be between 0.0 and 1.0, got {}", params.top_p),
                ));
            }
        }
        Ok(())
    }

    fn validate_speech(&self) -> Result<(), ConfigError> {
        if self.stt.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("stt.endpoint", "Endpoint must not be empty"));
        }
        if self.tts.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("tts.endpoint", "Endpoint must not be empty"));
        }
        if !(speech::MIN_SPEED..=speech::MAX_SPEED).contains(&self.tts.speed) {
            return Err(ConfigError::invalid(
                "tts.speed",
                format!(
                    "Must be between {} and {}, got {}",
                    speech::MIN_SPEED,
                    speech::MAX_SPEED,
                    self.tts.speed
                ),
            ));
        }
        if self.stt.max_audio_bytes == 0 {
            return Err(ConfigError::invalid(
                "stt.max_audio_bytes",
                "Upload limit must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum concurrent kiosk sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time after which a session is dropped
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_true() -> bool {
    true
}
fn default_max_sessions() -> usize {
    64
}
fn default_session_timeout() -> u64 {
    600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_sessions: default_max_sessions(),
            session_timeout_secs: default_session_timeout(),
        }
    }
}

/// Dialogue policy parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Negative confirmations tolerated per confirmation loop
    #[serde(default = "default_max_retries")]
    pub max_confirmation_retries: u32,

    /// Non-system messages kept in each rolling history
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_ms: u64,

    #[serde(default = "default_classification_timeout")]
    pub classification_timeout_ms: u64,

    /// Utterances that end the session from any state
    #[serde(default = "default_termination_phrases")]
    pub termination_phrases: Vec<String>,

    #[serde(default = "default_lookup_keywords")]
    pub lookup_keywords: Vec<String>,

    #[serde(default = "default_register_keywords")]
    pub register_keywords: Vec<String>,

    #[serde(default = "default_direction_keywords")]
    pub direction_keywords: Vec<String>,

    /// Date written to new reception records
    #[serde(default = "default_reception_date")]
    pub reception_date: String,

    /// Time written to new reception records
    #[serde(default = "default_reception_time")]
    pub reception_time: String,

    #[serde(default = "default_fallback_department")]
    pub fallback_department: String,

    /// How confirmation answers are classified
    #[serde(default)]
    pub classifier: ClassifierKind,
}

/// Confirmation classifier implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Few-shot prompted model
    #[default]
    Llm,
    /// Keyword lists, no model call
    Keyword,
}

fn default_max_retries() -> u32 {
    dialogue::MAX_CONFIRMATION_RETRIES
}
fn default_history_cap() -> usize {
    dialogue::HISTORY_CAP
}
fn default_generation_timeout() -> u64 {
    timeouts::GENERATION_MS
}
fn default_classification_timeout() -> u64 {
    timeouts::CLASSIFICATION_MS
}
fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
fn default_termination_phrases() -> Vec<String> {
    to_strings(dialogue::TERMINATION_PHRASES)
}
fn default_lookup_keywords() -> Vec<String> {
    to_strings(dialogue::LOOKUP_KEYWORDS)
}
fn default_register_keywords() -> Vec<String> {
    to_strings(dialogue::REGISTER_KEYWORDS)
}
fn default_direction_keywords() -> Vec<String> {
    to_strings(dialogue::DIRECTION_KEYWORDS)
}
fn default_reception_date() -> String {
    dialogue::RECEPTION_DATE.to_string()
}
fn default_reception_time() -> String {
    dialogue::RECEPTION_TIME.to_string()
}
fn default_fallback_department() -> String {
    dialogue::FALLBACK_DEPARTMENT.to_string()
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_confirmation_retries: default_max_retries(),
            history_cap: default_history_cap(),
            generation_timeout_ms: default_generation_timeout(),
            classification_timeout_ms: default_classification_timeout(),
            termination_phrases: default_termination_phrases(),
            lookup_keywords: default_lookup_keywords(),
            register_keywords: default_register_keywords(),
            direction_keywords: default_direction_keywords(),
            reception_date: default_reception_date(),
            reception_time: default_reception_time(),
            fallback_department: default_fallback_department(),
            classifier: ClassifierKind::default(),
        }
    }
}

impl DialogueConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn classification_timeout(&self) -> Duration {
        Duration::from_millis(self.classification_timeout_ms)
    }
}

/// Decoding parameters for one kind of generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl GenerationParams {
    /// Free-text triage and wayfinding replies
    pub fn conversational() -> Self {
        Self {
            max_tokens: 128,
            temperature: 0.5,
            top_p: 0.9,
            repeat_penalty: 1.2,
        }
    }

    /// Short greedy output for yes/no labels
    pub fn deterministic() -> Self {
        Self {
            max_tokens: 10,
            temperature: 0.0,
            top_p: 1.0,
            repeat_penalty: 1.0,
        }
    }
}

/// Generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Retries for transient failures
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,

    /// First backoff delay, doubled on each retry
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// How long the backend keeps the model loaded between calls
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,

    #[serde(default = "GenerationParams::conversational")]
    pub generation: GenerationParams,

    #[serde(default = "GenerationParams::deterministic")]
    pub classification: GenerationParams,
}

fn default_llm_endpoint() -> String {
    endpoints::LLM_DEFAULT.to_string()
}
fn default_llm_model() -> String {
    "bllossom-llama3-ko:8b".to_string()
}
fn default_llm_max_retries() -> u32 {
    2
}
fn default_initial_backoff() -> u64 {
    100
}
fn default_request_timeout() -> u64 {
    timeouts::HTTP_REQUEST_MS
}
fn default_keep_alive() -> String {
    "5m".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            max_retries: default_llm_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            request_timeout_ms: default_request_timeout(),
            keep_alive: default_keep_alive(),
            generation: GenerationParams::conversational(),
            classification: GenerationParams::deterministic(),
        }
    }
}

/// Speech recognition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttSettings {
    #[serde(default = "default_stt_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,

    /// Keep the right-hand reading of `(A)/(B)` transcript markers
    #[serde(default = "default_true")]
    pub prefer_spoken_form: bool,
}

fn default_stt_endpoint() -> String {
    endpoints::STT_DEFAULT.to_string()
}
fn default_language() -> String {
    "ko".to_string()
}
fn default_max_audio_bytes() -> usize {
    speech::MAX_AUDIO_BYTES
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            endpoint: default_stt_endpoint(),
            language: default_language(),
            timeout_ms: default_request_timeout(),
            max_audio_bytes: default_max_audio_bytes(),
            prefer_spoken_form: true,
        }
    }
}

/// Speech synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    /// Default playback speed
    #[serde(default = "default_speed")]
    pub speed: f32,

    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,
}

fn default_tts_endpoint() -> String {
    endpoints::TTS_DEFAULT.to_string()
}
fn default_speed() -> f32 {
    speech::DEFAULT_SPEED
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            speed: default_speed(),
            timeout_ms: default_request_timeout(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` relative to the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from files in `dir`, then `KIOSK__*` environment variables
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::from(dir.join("default")).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("KIOSK")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("dialogue.termination_phrases")
            .with_list_parse_key("server.cors_origins"),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        history_cap = settings.dialogue.history_cap,
        "Settings loaded"
    );

    Ok(settings)
}

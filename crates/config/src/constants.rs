//! Centralized constants for the kiosk
//!
//! Single source of truth for default endpoints, timeouts and dialogue
//! parameters. Settings defaults read from here.

/// Default collaborator endpoints
pub mod endpoints {
    /// Speech recognition service
    pub const STT_DEFAULT: &str = "http://localhost:8001";

    /// Ollama-compatible generation service
    pub const LLM_DEFAULT: &str = "http://localhost:11434";

    /// Speech synthesis service
    pub const TTS_DEFAULT: &str = "http://localhost:8003";
}

/// Timeouts in milliseconds
pub mod timeouts {
    /// Upper bound for one generation call, retries included
    pub const GENERATION_MS: u64 = 30_000;

    /// Upper bound for one yes/no classification
    pub const CLASSIFICATION_MS: u64 = 10_000;

    /// Per-request HTTP timeout for collaborators
    pub const HTTP_REQUEST_MS: u64 = 30_000;

    /// Health probe timeout per collaborator
    pub const HEALTH_PROBE_MS: u64 = 2_000;
}

/// Dialogue parameters
pub mod dialogue {
    /// Negative confirmations tolerated before escalating to staff
    pub const MAX_CONFIRMATION_RETRIES: u32 = 3;

    /// Non-system messages kept in a rolling generation history
    pub const HISTORY_CAP: usize = 16;

    /// Smallest usable history cap (one user/assistant pair)
    pub const MIN_HISTORY_CAP: usize = 2;

    /// Label used when no department can be read from a triage reply
    pub const FALLBACK_DEPARTMENT: &str = "해당 진료과";

    /// Placeholder reception date
    pub const RECEPTION_DATE: &str = "2025년 7월 29일";

    /// Placeholder reception time
    pub const RECEPTION_TIME: &str = "오전 10시";

    pub const TERMINATION_PHRASES: &[&str] = &["종료", "고마워", "고마워요", "감사합니다"];

    /// Checked before the registration keyword
    pub const LOOKUP_KEYWORDS: &[&str] = &["접수내역", "예약 확인", "내역 확인"];

    pub const REGISTER_KEYWORDS: &[&str] = &["접수"];

    pub const DIRECTION_KEYWORDS: &[&str] = &["길찾기", "위치", "어디야"];
}

/// Speech synthesis limits
pub mod speech {
    pub const MIN_SPEED: f32 = 0.5;
    pub const MAX_SPEED: f32 = 2.0;
    pub const DEFAULT_SPEED: f32 = 1.0;

    /// Largest audio upload forwarded to the recognizer
    pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;
}

//! Menu intent detection
//!
//! The idle menu offers three services and routes by keyword. Lookup
//! keywords are checked before the registration keyword because every
//! lookup phrase ("접수내역") also contains it.

use serde::{Deserialize, Serialize};

/// Service picked from the idle menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuIntent {
    /// Check an existing reception
    Lookup,
    /// Start a new registration
    Register,
    /// Wayfinding
    Direction,
    Unknown,
}

/// Keyword-based detector for menu choices and termination phrases
#[derive(Debug, Clone)]
pub struct MenuIntentDetector {
    lookup: Vec<String>,
    register: Vec<String>,
    direction: Vec<String>,
    termination: Vec<String>,
}

impl MenuIntentDetector {
    pub fn new(
        lookup: Vec<String>,
        register: Vec<String>,
        direction: Vec<String>,
        termination: Vec<String>,
    ) -> Self {
        let clean = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        Self {
            lookup: clean(lookup),
            register: clean(register),
            direction: clean(direction),
            termination: clean(termination),
        }
    }

    /// Classify an idle-menu utterance
    pub fn detect(&self, text: &str) -> MenuIntent {
        let text = text.trim();
        let contains_any = |keywords: &[String]| keywords.iter().any(|k| text.contains(k.as_str()));

        let intent = if contains_any(&self.lookup) {
            MenuIntent::Lookup
        } else if contains_any(&self.register) {
            MenuIntent::Register
        } else if contains_any(&self.direction) {
            MenuIntent::Direction
        } else {
            MenuIntent::Unknown
        };

        tracing::trace!(text, ?intent, "Menu intent detected");
        intent
    }

    /// Whether the utterance, as a whole, is a termination phrase
    ///
    /// Trailing punctuation is ignored; a phrase embedded in a longer
    /// sentence does not count.
    pub fn is_termination(&self, text: &str) -> bool {
        let text = text
            .trim()
            .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | '~') || c.is_whitespace());

        !text.is_empty() && self.termination.iter().any(|p| p == text)
    }
}

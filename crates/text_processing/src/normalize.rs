//! Transcript normalization
//!
//! Recognizers trained on annotated Korean corpora echo the annotation
//! syntax back: `(2시)/(두 시)` dual readings, a leading `n/` noise tag,
//! `[...]` event markers, `+` for cut-off speech and stray `/`.
//! Normalization removes all of it so the dialogue sees plain text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DUAL_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^/)]+)\)/\(([^)]+)\)").expect("valid dual-form regex"));

static LEADING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]/\s*").expect("valid leading-tag regex"));

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid bracket regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Which side of an `(A)/(B)` pair to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DualForm {
    /// Written form, e.g. `2시`
    Left,
    /// Spoken form, e.g. `두 시`
    #[default]
    Right,
}

impl DualForm {
    fn replacement(&self) -> &'static str {
        match self {
            DualForm::Left => "$1",
            DualForm::Right => "$2",
        }
    }
}

/// Strip transcription annotations and collapse whitespace
pub fn normalize_transcript(text: &str, pick: DualForm) -> String {
    let text = DUAL_FORM.replace_all(text, pick.replacement());
    let text = LEADING_TAG.replace(&text, "");
    let text = BRACKETED.replace_all(&text, "");
    let text: String = text.chars().filter(|c| *c != '+' && *c != '/').collect();
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}

//! Department extraction from triage text
//!
//! Best effort: the first run of Hangul syllables ending in "과" is taken
//! as the department. Callers always supply a fallback label.

use once_cell::sync::Lazy;
use regex::Regex;

static DEPARTMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣]+과").expect("valid department regex"));

/// First department-like token in `text`
pub fn extract_department(text: &str) -> Option<String> {
    DEPARTMENT.find(text).map(|m| m.as_str().to_string())
}

/// Department in `text`, or `fallback` when none is found
pub fn extract_department_or(text: &str, fallback: &str) -> String {
    extract_department(text).unwrap_or_else(|| fallback.to_string())
}

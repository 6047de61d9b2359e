//! Reception records and their lookup key

use serde::{Deserialize, Serialize};

/// Key under which a reception is stored
///
/// Names are trimmed; phone numbers lose spaces and hyphens so that
/// `010-1234-5678` and `01012345678` address the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceptionKey {
    name: String,
    phone: String,
}

impl ReceptionKey {
    pub fn new(name: &str, phone: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            phone: phone
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}

/// A committed registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionRecord {
    pub department: String,
    pub date: String,
    pub time: String,
}

impl ReceptionRecord {
    pub fn new(
        department: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            department: department.into(),
            date: date.into(),
            time: time.into(),
        }
    }
}

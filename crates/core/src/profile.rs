//! Visitor data collected during a session

use serde::{Deserialize, Serialize};

/// Fields gathered across one registration flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorProfile {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub symptom: String,
    /// Department extracted from the triage recommendation
    pub department: String,
}

impl VisitorProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.phone.is_empty()
            && self.address.is_empty()
            && self.symptom.is_empty()
            && self.department.is_empty()
    }
}

/// (name, phone) pair collected over the two receipt-lookup turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    pub name: String,
    pub phone: String,
}

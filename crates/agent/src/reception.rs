//! Shared in-memory reception store
//!
//! Written once per completed registration and read by receipt lookups
//! from any session. Writers are serialized by the lock and the last
//! commit for a key wins; readers always see a whole record.

use parking_lot::RwLock;
use std::collections::HashMap;

use kiosk_core::{ReceptionKey, ReceptionRecord};

#[derive(Debug, Default)]
pub struct ReceptionStore {
    records: RwLock<HashMap<ReceptionKey, ReceptionRecord>>,
}

impl ReceptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, returning the one it replaced
    pub fn put(&self, name: &str, phone: &str, record: ReceptionRecord) -> Option<ReceptionRecord> {
        self.insert(ReceptionKey::new(name, phone), record)
    }

    pub fn insert(&self, key: ReceptionKey, record: ReceptionRecord) -> Option<ReceptionRecord> {
        let previous = self.records.write().insert(key.clone(), record);
        tracing::info!(
            name = key.name(),
            replaced = previous.is_some(),
            "Reception committed"
        );
        previous
    }

    pub fn get(&self, name: &str, phone: &str) -> Option<ReceptionRecord> {
        self.records.read().get(&ReceptionKey::new(name, phone)).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

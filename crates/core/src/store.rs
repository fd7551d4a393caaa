//! Small persistence seam for session preferences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A string key/value store the orchestrator reads and writes its
/// visit markers through.
///
/// Writes are best effort: implementations should log failures rather
/// than report them, since nothing the orchestrator does depends on a
/// write succeeding.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
}

/// A [`KeyValueStore`] kept in memory. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries =
            self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_owned(), value.to_owned());
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-lifetime string key/value store, the session-storage analog.
/// Clones share the same backing map, so every cache handed the same store
/// sees the same entries. Nothing here survives the process.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: String) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }
}

//! The key-value provider contract and its in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A string key-value store.
///
/// Failures never surface as errors: `load` answers `None` and `save`
/// answers `false`, so callers can fall back to another store.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;

    fn save(&self, key: &str, value: &str) -> bool;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> bool {
        (**self).save(key, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> bool {
        (**self).save(key, value)
    }
}

/// In-process store. Counts successful saves and can be switched to reject
/// writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    saves: AtomicUsize,
    read_only: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `key` → `value`.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.values().insert(key.into(), value.into());
        store
    }

    /// Number of saves accepted so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail (`true`) or succeed (`false`).
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> bool {
        if self.read_only.load(Ordering::SeqCst) {
            return false;
        }
        self.values().insert(key.to_string(), value.to_string());
        self.saves.fetch_add(1, Ordering::SeqCst);
        true
    }
}

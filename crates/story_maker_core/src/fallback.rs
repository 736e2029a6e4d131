//! crates/story_maker_core/src/fallback.rs
//!
//! Best-effort access to a flat key-value store. Nothing in here ever returns an
//! error to the caller: failures are logged and absorbed. Do not rely on it for
//! data that cannot be lost silently.

use crate::ports::KeyValueStore;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const PROBE_KEY: &str = "story-maker:probe";

/// A wrapper around an optional [`KeyValueStore`] that never fails.
#[derive(Clone, Default)]
pub struct SafeStorage {
    store: Option<Arc<dyn KeyValueStore>>,
}

impl SafeStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A wrapper with no backing store. Reads return `None`, writes are dropped.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Checks once whether the backing store can round-trip a value.
    pub fn probe(&self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let ok = store.set(PROBE_KEY, "1").is_ok()
            && matches!(store.get(PROBE_KEY), Ok(Some(v)) if v == "1")
            && store.remove(PROBE_KEY).is_ok();
        debug!(available = ok, "Probed fallback storage");
        ok
    }

    /// Reads and deserializes the value under `key`. Any failure yields `None`.
    pub fn safe_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Fallback storage read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Fallback storage holds an unreadable value");
                None
            }
        }
    }

    /// Serializes and stores `value`. Failures are logged and swallowed.
    pub fn safe_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let Some(store) = &self.store else {
            warn!(key, "Fallback storage is disabled; value dropped");
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Could not serialize value for fallback storage");
                return;
            }
        };
        if let Err(e) = store.set(key, &raw) {
            warn!(key, error = %e, "Fallback storage write failed");
        }
    }

    pub fn safe_remove(&self, key: &str) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.remove(key) {
            warn!(key, error = %e, "Fallback storage remove failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingStore, MemoryStore};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Draft {
        title: String,
    }

    #[test]
    fn round_trips_values_through_a_working_store() {
        let storage = SafeStorage::new(Arc::new(MemoryStore::default()));
        assert!(storage.probe());

        let draft = Draft { title: "Trip".into() };
        storage.safe_set("draft", &draft);
        assert_eq!(storage.safe_get::<Draft>("draft"), Some(draft));

        storage.safe_remove("draft");
        assert_eq!(storage.safe_get::<Draft>("draft"), None);
    }

    #[test]
    fn never_fails_when_the_store_errors_on_every_call() {
        let storage = SafeStorage::new(Arc::new(FailingStore));
        assert!(!storage.probe());
        storage.safe_set("draft", &Draft { title: "x".into() });
        assert_eq!(storage.safe_get::<Draft>("draft"), None);
        storage.safe_remove("draft");
    }

    #[test]
    fn never_fails_without_a_store() {
        let storage = SafeStorage::disabled();
        assert!(!storage.is_enabled());
        assert!(!storage.probe());
        storage.safe_set("draft", &Draft { title: "x".into() });
        assert_eq!(storage.safe_get::<Draft>("draft"), None);
        storage.safe_remove("draft");
    }

    #[test]
    fn corrupt_json_reads_as_missing() {
        let store = Arc::new(MemoryStore::default());
        store.set("draft", "{not json").unwrap();
        let storage = SafeStorage::new(store);
        assert_eq!(storage.safe_get::<Draft>("draft"), None);
    }
}

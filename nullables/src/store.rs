//! Nullable storage: in-memory documents for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wog_store::{Storage, StoreError};

/// An in-memory document store.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStorage {
    documents: Mutex<HashMap<String, String>>,
    unreachable: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
}

impl NullStorage {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
            read_delay: Mutex::new(None),
        }
    }

    /// Make every read block the calling thread for `delay`, like a slow
    /// disk or network mount.
    pub fn with_read_delay(self, delay: Duration) -> Self {
        *self.read_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Pre-populate a document.
    pub fn with_document(self, key: &str, contents: &str) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert(key.to_string(), contents.to_string());
        self
    }

    /// Make every subsequent operation fail with a backend error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// Current contents of a document (for assertions).
    pub fn document(&self, key: &str) -> Option<String> {
        self.documents.lock().unwrap().get(key).cloned()
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::Relaxed) {
            Err(StoreError::Backend("null storage is unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for NullStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for NullStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.check_reachable()?;
        Ok(self.documents.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        self.check_reachable()?;
        self.documents
            .lock()
            .unwrap()
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory:{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_storage_fails() {
        let storage = NullStorage::new().with_document("files", "{}");
        assert_eq!(storage.read("files").unwrap().as_deref(), Some("{}"));
        storage.set_unreachable(true);
        assert!(storage.read("files").is_err());
        assert!(storage.write("files", "{}").is_err());
    }
}

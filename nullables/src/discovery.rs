//! Nullable discovery: fixed results or a configured failure.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use wog_store::{Discovered, Discovery, DiscoveryError};

/// A discovery source that returns pre-configured entries.
pub struct NullDiscovery {
    results: Mutex<Result<Vec<Discovered>, String>>,
    calls: AtomicUsize,
}

impl NullDiscovery {
    /// Discover the given `(path, group)` pairs, in order.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(path, group)| Discovered::new(path, group))
            .collect();
        Self {
            results: Mutex::new(Ok(entries)),
            calls: AtomicUsize::new(0),
        }
    }

    /// A discovery whose source is unreachable.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            results: Mutex::new(Err(reason.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the configured results.
    pub fn set_entries<'a>(&self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) {
        *self.results.lock().unwrap() = Ok(entries
            .into_iter()
            .map(|(path, group)| Discovered::new(path, group))
            .collect());
    }

    /// How many times `discover` ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Discovery for NullDiscovery {
    async fn discover(&self) -> Result<Vec<Discovered>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.results
            .lock()
            .unwrap()
            .clone()
            .map_err(DiscoveryError::Unreachable)
    }
}

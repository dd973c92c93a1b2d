//! Nullable connection: record messages without sending them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use wog_types::{Connection, ConnectionError};

/// A test connection that records every message sent to it.
pub struct NullConnection {
    name: String,
    sent_messages: Mutex<Vec<String>>,
    closed: AtomicBool,
    count_tx: watch::Sender<usize>,
}

impl NullConnection {
    pub fn new(name: impl Into<String>) -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            name: name.into(),
            sent_messages: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            count_tx,
        }
    }

    /// Get all sent messages (for assertions).
    pub fn sent(&self) -> Vec<String> {
        self.sent_messages.lock().unwrap().clone()
    }

    /// All sent messages parsed as JSON. Non-JSON messages become strings.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .into_iter()
            .map(|text| {
                serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
            })
            .collect()
    }

    /// Number of recorded messages.
    pub fn sent_count(&self) -> usize {
        self.sent_messages.lock().unwrap().len()
    }

    /// Make every subsequent send fail as if the peer went away.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    /// Wait until at least `count` messages were recorded.
    ///
    /// Returns `false` if that did not happen within `timeout`.
    pub async fn wait_for_messages(&self, count: usize, timeout: Duration) -> bool {
        let mut rx = self.count_tx.subscribe();
        tokio::time::timeout(timeout, async move {
            while *rx.borrow_and_update() < count {
                if rx.changed().await.is_err() {
                    return false;
                }
            }
            true
        })
        .await
        .unwrap_or(false)
    }

    /// Clear all recorded messages.
    pub fn reset(&self) {
        self.sent_messages.lock().unwrap().clear();
        self.count_tx.send_replace(0);
    }
}

impl Connection for NullConnection {
    fn send(&self, text: String) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(ConnectionError::Closed);
        }
        let len = {
            let mut sent = self.sent_messages.lock().unwrap();
            sent.push(text);
            sent.len()
        };
        self.count_tx.send_replace(len);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("null:{}", self.name)
    }
}

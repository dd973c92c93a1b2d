//! Runtime counters for one adapter instance.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing protocol and fan-out activity.
#[derive(Debug, Default)]
pub struct AdapterStats {
    registrations: AtomicU64,
    messages: AtomicU64,
    protocol_errors: AtomicU64,
    notifications: AtomicU64,
}

/// Point-in-time copy of [`AdapterStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub registrations: u64,
    pub messages: u64,
    pub protocol_errors: u64,
    pub notifications: u64,
}

impl AdapterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_notifications(&self, count: u64) {
        self.notifications.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
        }
    }
}

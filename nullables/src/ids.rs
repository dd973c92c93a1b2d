//! Nullable id generator: predictable identifiers.

use std::sync::atomic::{AtomicU64, Ordering};
use wog_utils::IdGenerator;

/// Generates `<prefix>-1`, `<prefix>-2`, ...
pub struct NullIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl NullIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }

    /// A generator that returns the same id every time (collision testing).
    pub fn constant(id: impl Into<String>) -> ConstantIdGenerator {
        ConstantIdGenerator(id.into())
    }
}

impl IdGenerator for NullIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

/// Always returns the same id.
pub struct ConstantIdGenerator(String);

impl IdGenerator for ConstantIdGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

//! Shared utilities for wog adapters.

pub mod ids;
pub mod logging;
pub mod stats;

pub use ids::{IdGenerator, NanoIdGenerator};
pub use logging::{init_logging, LogFormat};
pub use stats::{AdapterStats, StatsSnapshot};

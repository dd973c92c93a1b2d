//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators of an adapter (id generation, storage,
//! client connections, discovery) are abstracted behind traits. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod connection;
pub mod discovery;
pub mod ids;
pub mod store;

pub use connection::NullConnection;
pub use discovery::NullDiscovery;
pub use ids::NullIdGenerator;
pub use store::NullStorage;

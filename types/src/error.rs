//! Error types shared across crates.

use thiserror::Error;

/// A page selector that is neither `-1` nor a positive page number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid page {0}: expected -1 or a page number >= 1")]
pub struct PageError(pub i64);

/// Failure to deliver a message on a client connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

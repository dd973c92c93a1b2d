//! Transport-facing connection abstraction.
//!
//! A connection is owned by the serving layer (a WebSocket, a test double).
//! Adapters only ever send text on it; they never close it.

use crate::ConnectionError;

/// Outbound half of a client connection.
pub trait Connection: Send + Sync {
    /// Queue a text message for delivery to the client.
    fn send(&self, text: String) -> Result<(), ConnectionError>;

    /// Short human-readable description used in log fields.
    fn describe(&self) -> String {
        "connection".to_string()
    }
}

/// One inbound frame received from a client connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// A text payload, expected to hold a JSON control message.
    Text(String),
    /// A binary payload; never valid for the control protocol.
    Binary(Vec<u8>),
    /// The transport signalled closure.
    Close,
}

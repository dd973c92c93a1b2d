//! Outbound side of a WebSocket client.

use tokio::sync::mpsc;
use wog_types::{Connection, ConnectionError};

/// Queues outbound messages for the task that owns the socket's sink.
///
/// Sending never blocks; once the writer task is gone every send fails
/// with [`ConnectionError::Closed`].
#[derive(Clone, Debug)]
pub struct ChannelConnection {
    peer: String,
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelConnection {
    pub fn new(peer: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                peer: peer.into(),
                tx,
            },
            rx,
        )
    }
}

impl Connection for ChannelConnection {
    fn send(&self, text: String) -> Result<(), ConnectionError> {
        self.tx.send(text).map_err(|_| ConnectionError::Closed)
    }

    fn describe(&self) -> String {
        format!("ws:{}", self.peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_messages_reach_the_writer() {
        let (connection, mut rx) = ChannelConnection::new("127.0.0.1:5000");
        connection.send("one".to_string()).unwrap();
        connection.send("two".to_string()).unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));
        assert_eq!(connection.describe(), "ws:127.0.0.1:5000");
    }

    #[test]
    fn send_fails_once_writer_is_gone() {
        let (connection, rx) = ChannelConnection::new("peer");
        drop(rx);
        assert!(matches!(
            connection.send("late".to_string()),
            Err(ConnectionError::Closed)
        ));
    }
}

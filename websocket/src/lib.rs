//! WebSocket bridge for an adapter host.
//!
//! Every client connected at `/ws` becomes one registration on the host.
//! Inbound text and binary frames are handed to the host's dispatcher;
//! replies and change notifications are written back on the same socket.

pub mod connection;
pub mod error;
pub mod server;

pub use connection::ChannelConnection;
pub use error::WsError;
pub use server::WebSocketServer;

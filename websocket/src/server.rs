//! WebSocket server implementation.
//!
//! Accepts WebSocket connections at `/ws` and registers each one with the
//! adapter host. A connection lives exactly as long as its registration:
//! the client disconnecting unregisters it, and a registration removed by
//! the host (dispose) ends the connection.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{ConnectInfo, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use wog_adapter::socket::DEFAULT_FRAME_CAPACITY;
use wog_adapter::{Adapter, AdapterHost, Frame, Socket};

use crate::{ChannelConnection, WsError};

/// Serves one adapter host over WebSocket.
pub struct WebSocketServer<A: Adapter> {
    pub port: u16,
    host: Arc<AdapterHost<A>>,
}

impl<A: Adapter> WebSocketServer<A> {
    pub fn new(port: u16, host: Arc<AdapterHost<A>>) -> Self {
        Self { port, host }
    }

    pub fn host(&self) -> &Arc<AdapterHost<A>> {
        &self.host
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler::<A>))
            .with_state(self.host.clone())
    }

    /// Listen on all interfaces at the configured port. Runs until the
    /// server fails or the future is dropped.
    pub async fn start(&self) -> Result<(), WsError> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| WsError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!(%addr, adapter = self.host.name(), "WebSocket server listening");
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), WsError> {
        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}

/// Axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler<A: Adapter>(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(host): State<Arc<AdapterHost<A>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, host))
}

/// Bridge one WebSocket connection to a host registration.
///
/// A single writer task owns the sink, so replies and notifications reach
/// the client in the order they were queued. The read loop forwards frames
/// to the registration until either side goes away.
async fn handle_socket<A: Adapter>(socket: WebSocket, peer: SocketAddr, host: Arc<AdapterHost<A>>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (connection, mut outbound) = ChannelConnection::new(peer.to_string());
    let (registered, frames) = Socket::channel(Arc::new(connection), DEFAULT_FRAME_CAPACITY);
    let id = host.register_socket(registered).await;
    debug!(registration = %id, %peer, "WebSocket client connected");

    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    while let Some(msg_result) = ws_receiver.next().await {
        let frame = match msg_result {
            Ok(Message::Text(text)) => Frame::Text(text),
            Ok(Message::Binary(data)) => Frame::Binary(data),
            Ok(Message::Close(_)) => {
                debug!(registration = %id, "client sent close frame");
                break;
            }
            // Pongs are answered by the protocol layer.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => {
                warn!(registration = %id, error = %e, "WebSocket receive error");
                break;
            }
        };
        if frames.send(frame).await.is_err() {
            debug!(registration = %id, "registration gone, closing client");
            break;
        }
    }

    let _ = frames.send(Frame::Close).await;
    host.unregister_socket(&id).await;
    writer.abort();
    debug!(registration = %id, "WebSocket client disconnected");
}

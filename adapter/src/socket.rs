//! Per-connection plumbing: the socket handed to the host and the context
//! handed to an adapter while it handles one control message.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use wog_types::{Connection, Entry, EntryId, Frame, RegistrationId, Supports};

use crate::{AdapterError, Catalog, ConnectionRegistry};

/// Default capacity of the inbound frame channel created by [`Socket::channel`].
pub const DEFAULT_FRAME_CAPACITY: usize = 64;

/// A client connection as seen by the host: an outbound half and a stream
/// of inbound frames. Dropping every frame sender counts as a close.
pub struct Socket {
    pub connection: Arc<dyn Connection>,
    pub frames: mpsc::Receiver<Frame>,
}

impl Socket {
    pub fn new(connection: Arc<dyn Connection>, frames: mpsc::Receiver<Frame>) -> Self {
        Self { connection, frames }
    }

    /// Create a socket together with the sender that feeds its frames.
    pub fn channel(connection: Arc<dyn Connection>, capacity: usize) -> (Self, mpsc::Sender<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(connection, rx), tx)
    }
}

/// Everything an adapter may touch while handling a message from one
/// registration.
pub struct SocketContext {
    registration: RegistrationId,
    connection: Arc<dyn Connection>,
    catalog: Arc<Catalog>,
    supports: Supports,
    registry: Arc<RwLock<ConnectionRegistry>>,
}

impl SocketContext {
    pub(crate) fn new(
        registration: RegistrationId,
        connection: Arc<dyn Connection>,
        catalog: Arc<Catalog>,
        supports: Supports,
        registry: Arc<RwLock<ConnectionRegistry>>,
    ) -> Self {
        Self {
            registration,
            connection,
            catalog,
            supports,
            registry,
        }
    }

    pub fn registration(&self) -> &RegistrationId {
        &self.registration
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Catalog snapshot taken when the message arrived.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve an entry id, failing with [`AdapterError::NotFound`].
    pub fn entry(&self, id: &str) -> Result<&Entry, AdapterError> {
        self.catalog
            .entry(id)
            .ok_or_else(|| AdapterError::NotFound(EntryId::new(id)))
    }

    /// Serialize `payload` as JSON and send it on this connection.
    pub fn reply<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), AdapterError> {
        let text = serde_json::to_string(payload)
            .map_err(|e| AdapterError::Other(format!("failed to encode reply: {e}")))?;
        self.connection.send(text)?;
        Ok(())
    }

    /// Add `entry` to this registration's watch set.
    pub async fn watch(&self, entry: &str) -> Result<bool, AdapterError> {
        let entry = watchable(self.supports, &self.catalog, entry)?;
        let added = self.registry.write().await.watch(&self.registration, entry.clone())?;
        debug!(registration = %self.registration, entry = %entry, added, "watch");
        Ok(added)
    }

    /// Remove `entry` from this registration's watch set.
    pub async fn unwatch(&self, entry: &str) -> Result<bool, AdapterError> {
        if !self.supports.watching {
            return Err(AdapterError::Unsupported("watching"));
        }
        let removed = self.registry.write().await.unwatch(&self.registration, entry)?;
        debug!(registration = %self.registration, entry, removed, "unwatch");
        Ok(removed)
    }
}

/// Check that `entry` may be watched: the adapter must support watching and
/// the entry must exist in the current catalog.
pub(crate) fn watchable(
    supports: Supports,
    catalog: &Catalog,
    entry: &str,
) -> Result<EntryId, AdapterError> {
    if !supports.watching {
        return Err(AdapterError::Unsupported("watching"));
    }
    catalog
        .entry(entry)
        .map(|found| found.id.clone())
        .ok_or_else(|| AdapterError::NotFound(EntryId::new(entry)))
}

//! The contract every concrete adapter implements.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use wog_store::Discovered;
use wog_types::{Entry, EntryStats, Page, Supports};

use crate::{AdapterError, Catalog, ChangeNotifier, ControlMessage, SocketContext};

/// Destination for streamed entry content.
pub type Destination<'a> = &'a mut (dyn AsyncWrite + Send + Unpin);

/// A pluggable source of log entries (files, containers, services).
///
/// The host owns the catalog, the registrations and the lifecycle; an
/// adapter only discovers sources, reads them, and reacts to control
/// messages. Entries passed in are always resolved from the current
/// catalog, so unknown ids never reach an adapter.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Internal adapter name, used in logs and as the definition key.
    fn name(&self) -> &str;

    /// Static capabilities. Callable in any lifecycle state.
    fn supports(&self) -> Supports;

    /// Find every source, grouped, in the order they should be listed.
    async fn discover(&self, options: &AdapterOptions) -> Result<Vec<Discovered>, AdapterError>;

    /// Start change detection for a freshly populated catalog.
    ///
    /// Only called when [`Adapter::supports`] reports watching.
    async fn watch(&self, _catalog: Arc<Catalog>, _notifier: ChangeNotifier) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Release background work and external resources.
    async fn dispose(&self) {}

    /// Compute fresh stats for an entry.
    async fn entry_stats(&self, entry: &Entry) -> Result<EntryStats, AdapterError>;

    /// Write the content of `entry` to `destination`: one page, or
    /// everything for [`Page::All`].
    async fn stream(
        &self,
        entry: &Entry,
        page: Page,
        destination: Destination<'_>,
    ) -> Result<(), AdapterError>;

    /// React to a control message. Returns `Ok(false)` for operations this
    /// adapter does not know.
    async fn handle_socket_message(
        &self,
        socket: &SocketContext,
        message: &ControlMessage,
    ) -> Result<bool, AdapterError>;

    /// Payload sent to every registration watching a changed entry.
    fn change_notification(&self, entry: &Entry) -> Value {
        serde_json::json!({ "type": "change", "id": entry.id })
    }
}

/// Adapter-specific options passed to `init`, as a JSON object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdapterOptions(Map<String, Value>);

impl AdapterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts an object, or `null` for no options.
    pub fn from_value(value: Value) -> Result<Self, AdapterError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(AdapterError::Other(format!(
                "adapter options must be an object, got {other}"
            ))),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Deserialize an optional option.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AdapterError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| AdapterError::Other(format!("invalid adapter option \"{key}\": {e}"))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

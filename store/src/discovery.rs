//! Discovery collaborators: turn an adapter's sources into grouped entries.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::{DiscoveryError, EntryDefinitions, Storage};

/// A discovered source before the core assigns it an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discovered {
    pub path: String,
    pub group: String,
}

impl Discovered {
    pub fn new(path: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            group: group.into(),
        }
    }
}

/// Produces the full list of grouped sources, in discovery order.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn discover(&self) -> Result<Vec<Discovered>, DiscoveryError>;
}

/// Discovery backed by an entry-definition document in [`Storage`].
///
/// The document is created from `default` when it does not exist yet.
pub struct DefinitionDiscovery {
    storage: Arc<dyn Storage>,
    key: String,
    default: EntryDefinitions,
}

impl DefinitionDiscovery {
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>, default: EntryDefinitions) -> Self {
        Self {
            storage,
            key: key.into(),
            default,
        }
    }
}

#[async_trait]
impl Discovery for DefinitionDiscovery {
    async fn discover(&self) -> Result<Vec<Discovered>, DiscoveryError> {
        // Storage is synchronous; keep its I/O off the runtime threads.
        let storage = self.storage.clone();
        let key = self.key.clone();
        let default = self.default.clone();
        let definitions = tokio::task::spawn_blocking(move || {
            EntryDefinitions::load_or_create(storage.as_ref(), &key, &default)
        })
        .await
        .map_err(|e| DiscoveryError::Other(format!("definition loading task failed: {e}")))??;

        let discovered: Vec<Discovered> = definitions
            .groups()
            .flat_map(|(group, paths)| paths.iter().map(move |path| Discovered::new(path.as_str(), group)))
            .collect();
        debug!(key = %self.key, count = discovered.len(), "discovered entries from definitions");
        Ok(discovered)
    }
}

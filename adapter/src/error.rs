//! Adapter error types.

use thiserror::Error;
use wog_store::DiscoveryError;
use wog_types::{ConnectionError, EntryId, PageError, RegistrationId};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Discovery or setup failed; the catalog was left empty.
    #[error("failed to initialize adapter {adapter}: {source}")]
    Initialization {
        adapter: String,
        #[source]
        source: BoxError,
    },

    #[error("adapter is already initialized")]
    AlreadyInitialized,

    #[error("adapter has been disposed")]
    Disposed,

    #[error("entry not found: {0}")]
    NotFound(EntryId),

    #[error("unknown registration: {0}")]
    UnknownRegistration(RegistrationId),

    #[error("operation not supported by this adapter: {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Protocol(String),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    pub fn initialization(adapter: &str, source: impl Into<BoxError>) -> Self {
        AdapterError::Initialization {
            adapter: adapter.to_string(),
            source: source.into(),
        }
    }
}

/// A discovered entry set that cannot form a valid catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate entry id {0}")]
    DuplicateId(EntryId),

    #[error("entry {path} has no group")]
    MissingGroup { path: String },
}

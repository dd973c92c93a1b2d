//! Adapter runtime core.
//!
//! Every concrete log adapter (files, containers, services) plugs into the
//! same skeleton:
//! - [`Catalog`]: the discovered groups and their entries, replaced wholesale
//! - [`ConnectionRegistry`]: live client connections and their watch sets
//! - [`protocol`]: decoding of inbound control messages and error replies
//! - [`AdapterHost`]: the init → serve → dispose lifecycle around an [`Adapter`]

pub mod adapter;
pub mod catalog;
pub mod error;
pub mod events;
pub mod host;
pub mod protocol;
pub mod registry;
pub mod socket;

pub use adapter::{Adapter, AdapterOptions};
pub use catalog::Catalog;
pub use error::{AdapterError, CatalogError};
pub use events::{ChangeNotifier, EntryChanged};
pub use host::{AdapterHost, LifecycleState};
pub use protocol::{ControlMessage, ErrorReply};
pub use registry::ConnectionRegistry;
pub use socket::{Socket, SocketContext};

pub use wog_store::{Discovered, Discovery};
pub use wog_types::{
    Connection, ConnectionError, Entry, EntryId, EntryStats, Frame, Page, RegistrationId, Supports,
};

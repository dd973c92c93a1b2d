//! Storage and discovery collaborators.
//!
//! Adapters persist one entry-definition document per adapter type through
//! the [`Storage`] trait and turn it into discovered entries through the
//! [`Discovery`] trait. The adapter core depends only on the traits.

pub mod definitions;
pub mod discovery;
pub mod error;
pub mod storage;

pub use definitions::EntryDefinitions;
pub use discovery::{DefinitionDiscovery, Discovered, Discovery};
pub use error::{DiscoveryError, StoreError};
pub use storage::{FsStorage, Storage};

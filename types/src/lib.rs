//! Fundamental types for wog log adapters.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! entry and registration identifiers, entries, stats, capability flags, page
//! selectors and the transport-facing connection abstraction.

pub mod connection;
pub mod entry;
pub mod error;
pub mod id;
pub mod page;

pub use connection::{Connection, Frame};
pub use entry::{Entry, EntryStats, Supports};
pub use error::{ConnectionError, PageError};
pub use id::{EntryId, RegistrationId};
pub use page::Page;

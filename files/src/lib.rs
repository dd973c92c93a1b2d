//! Log files as adapter entries.
//!
//! Files are listed in the `files` entry-definition document, grouped by
//! name. Content is served in pages of whole lines and changes are found
//! by polling size and modification time.

pub mod adapter;
pub mod options;
pub mod reader;
pub mod watcher;

pub use adapter::{FileAdapter, DEFINITIONS_KEY};
pub use options::FileOptions;
pub use watcher::PollWatcher;

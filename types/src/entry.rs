//! Entries, entry stats and adapter capability flags.

use serde::{Deserialize, Serialize};

use crate::EntryId;

/// A single discoverable log unit.
///
/// `path` is adapter-defined: a filesystem path for the file adapter, a
/// container reference for a container adapter, and so on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique within one catalog.
    pub id: EntryId,
    /// Adapter-defined location of the source.
    pub path: String,
    /// Name of the group this entry belongs to.
    pub group: String,
}

impl Entry {
    pub fn new(id: impl Into<EntryId>, path: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            group: group.into(),
        }
    }
}

/// Size information about an entry, computed on demand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStats {
    /// Total size in bytes.
    pub size: u64,
    /// Number of newline-separated lines.
    pub lines: u64,
}

/// Features an adapter type supports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supports {
    /// Whether entries can be watched for changes.
    pub watching: bool,
}

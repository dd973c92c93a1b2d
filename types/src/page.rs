//! Page selection for content streaming.
//!
//! On the wire a page is a signed integer: `-1` selects the whole content,
//! `1..` selects a 1-based page. Everything else is rejected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU32;

use crate::PageError;

/// Wire value that requests the entire, unpaginated content.
pub const ALL_PAGES: i64 = -1;

/// Which part of an entry's content to stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Page {
    /// The entire content.
    All,
    /// A 1-based page index.
    Number(NonZeroU32),
}

impl Page {
    /// The first page.
    pub const FIRST: Self = Self::Number(NonZeroU32::MIN);

    /// Parse the wire representation.
    pub fn from_raw(raw: i64) -> Result<Self, PageError> {
        if raw == ALL_PAGES {
            return Ok(Self::All);
        }
        u32::try_from(raw)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self::Number)
            .ok_or(PageError(raw))
    }

    /// The wire representation.
    pub fn as_raw(&self) -> i64 {
        match self {
            Self::All => ALL_PAGES,
            Self::Number(n) => i64::from(n.get()),
        }
    }

    /// Zero-based line range `[start, end)` for a page of `page_size` lines,
    /// or `None` for [`Page::All`].
    pub fn line_range(&self, page_size: u64) -> Option<(u64, u64)> {
        match self {
            Self::All => None,
            Self::Number(n) => {
                let start = u64::from(n.get() - 1).saturating_mul(page_size);
                Some((start, start.saturating_add(page_size)))
            }
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<i64> for Page {
    type Error = PageError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Page {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for Page {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

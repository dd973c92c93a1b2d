//! Opaque identifiers for entries and connection registrations.
//!
//! Both are generated strings. The newtypes exist so that an entry id can
//! never be passed where a registration id is expected.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Identifies an entry for the lifetime of one catalog.
    EntryId
);

opaque_id!(
    /// Identifies one connection registration.
    RegistrationId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn display_is_the_raw_id() {
        assert_eq!(EntryId::new("abc123").to_string(), "abc123");
        assert_eq!(RegistrationId::from("r-1").to_string(), "r-1");
    }

    #[test]
    fn debug_names_the_kind() {
        assert_eq!(format!("{:?}", EntryId::new("x")), "EntryId(x)");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&EntryId::new("log-1")).unwrap();
        assert_eq!(json, "\"log-1\"");
        let back: EntryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "log-1");
    }

    #[test]
    fn set_lookup_by_str() {
        let mut set = HashSet::new();
        set.insert(EntryId::new("a"));
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
    }
}

//! The entry-definition document.
//!
//! A JSON object mapping group name to the member paths of that group:
//!
//! ```json
//! { "System": ["/var/log/syslog", "/var/log/auth.log"], "Web": ["/var/log/nginx/access.log"] }
//! ```
//!
//! Key order in the document is the group order shown to clients.

use serde_json::{Map, Value};
use tracing::info;

use crate::{Storage, StoreError};

/// Ordered group → paths mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryDefinitions {
    groups: Vec<(String, Vec<String>)>,
}

impl EntryDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group, or extend it when the name is already present.
    pub fn with_group<I, P>(mut self, name: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let name = name.into();
        let paths = paths.into_iter().map(Into::into);
        match self.groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => existing.extend(paths),
            None => self.groups.push((name, paths.collect())),
        }
        self
    }

    /// Groups with their paths, in document order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, paths)| (name.as_str(), paths.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Parse a document.
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(object) = value else {
            return Err(StoreError::InvalidDefinitions(
                "top level must be an object of group name to paths".to_string(),
            ));
        };

        let mut definitions = Self::new();
        for (group, members) in object {
            if group.trim().is_empty() {
                return Err(StoreError::InvalidDefinitions(
                    "group names must not be empty".to_string(),
                ));
            }
            let Value::Array(members) = members else {
                return Err(StoreError::InvalidDefinitions(format!(
                    "group \"{group}\" must map to an array of paths"
                )));
            };
            let mut paths = Vec::with_capacity(members.len());
            for member in members {
                match member {
                    Value::String(path) if !path.is_empty() => paths.push(path),
                    other => {
                        return Err(StoreError::InvalidDefinitions(format!(
                            "group \"{group}\" contains a non-path value: {other}"
                        )))
                    }
                }
            }
            definitions = definitions.with_group(group, paths);
        }
        Ok(definitions)
    }

    /// Render as a pretty-printed document.
    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        let object: Map<String, Value> = self
            .groups
            .iter()
            .map(|(name, paths)| {
                let paths = paths.iter().cloned().map(Value::String).collect();
                (name.clone(), Value::Array(paths))
            })
            .collect();
        Ok(serde_json::to_string_pretty(&Value::Object(object))?)
    }

    /// Read the document stored under `key`, writing `default` first when it
    /// does not exist yet.
    pub fn load_or_create(
        storage: &dyn Storage,
        key: &str,
        default: &EntryDefinitions,
    ) -> Result<Self, StoreError> {
        if let Some(text) = storage.read(key)? {
            return Self::from_json(&text);
        }
        storage.write(key, &default.to_json_pretty()?)?;
        info!(
            location = %storage.location(key),
            "created default entry definitions"
        );
        Ok(default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FsStorage;

    #[test]
    fn parse_keeps_document_order() {
        let defs =
            EntryDefinitions::from_json(r#"{ "Zeta": ["/z.log"], "Alpha": ["/a.log", "/b.log"] }"#)
                .unwrap();
        let groups: Vec<&str> = defs.groups().map(|(name, _)| name).collect();
        assert_eq!(groups, vec!["Zeta", "Alpha"]);
        let alpha = defs.groups().nth(1).unwrap().1;
        assert_eq!(alpha, ["/a.log".to_string(), "/b.log".to_string()]);
    }

    #[test]
    fn rejects_malformed_documents() {
        for text in [
            "[]",
            r#"{ "A": "/a.log" }"#,
            r#"{ "A": [1] }"#,
            r#"{ "": ["/a.log"] }"#,
            r#"{ "A": [""] }"#,
        ] {
            assert!(
                matches!(
                    EntryDefinitions::from_json(text),
                    Err(StoreError::InvalidDefinitions(_))
                ),
                "accepted {text}"
            );
        }
        assert!(matches!(
            EntryDefinitions::from_json("{ nope"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn render_and_reparse() {
        let defs = EntryDefinitions::new()
            .with_group("System", ["/var/log/syslog"])
            .with_group("Web", ["/var/log/nginx/access.log"]);
        let text = defs.to_json_pretty().unwrap();
        assert_eq!(EntryDefinitions::from_json(&text).unwrap(), defs);
    }

    #[test]
    fn with_group_merges_repeated_names() {
        let defs = EntryDefinitions::new()
            .with_group("A", ["/1"])
            .with_group("A", ["/2"]);
        assert_eq!(defs.groups().count(), 1);
        assert_eq!(defs.groups().next().unwrap().1.len(), 2);
    }

    #[test]
    fn load_or_create_writes_default_once() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let default = EntryDefinitions::new().with_group("System", ["/var/log/syslog"]);

        let first = EntryDefinitions::load_or_create(&storage, "files", &default).unwrap();
        assert_eq!(first, default);
        assert!(storage.read("files").unwrap().is_some());

        storage
            .write("files", r#"{ "Custom": ["/tmp/custom.log"] }"#)
            .unwrap();
        let second = EntryDefinitions::load_or_create(&storage, "files", &default).unwrap();
        assert_eq!(second.groups().next().unwrap().0, "Custom");
    }
}

//! Persistent document storage.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::StoreError;

/// Key-addressed text documents, one per adapter type.
pub trait Storage: Send + Sync {
    /// Read a document. Returns `Ok(None)` when it does not exist.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Create or replace a document.
    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError>;

    /// Human-readable location of a document, for log output.
    fn location(&self, key: &str) -> String;
}

/// Stores each document as `<root>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl Storage for FsStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Backend(format!("{}: {e}", path.display()))),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        // Write to a sibling temp file first so readers never see half a document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        self.root.join(format!("{key}.json")).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_document_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(storage.read("files").unwrap().is_none());
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path().join("nested"));
        storage.write("files", "{}").unwrap();
        assert_eq!(storage.read("files").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("nested/files.json").exists());
    }

    #[test]
    fn rejects_keys_that_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(matches!(
            storage.read("../etc/passwd"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(storage.write("", "{}"), Err(StoreError::InvalidKey(_))));
    }
}

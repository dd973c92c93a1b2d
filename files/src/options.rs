//! Options accepted by the file adapter at `init`.

use std::time::Duration;
use wog_adapter::{AdapterError, AdapterOptions};

pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_MAX_CONTENTS_BYTES: u64 = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOptions {
    /// Lines per page for paged reads.
    pub page_size: u64,
    /// How often watched files are checked for changes.
    pub poll_interval_ms: u64,
    /// Largest file the `contents` operation returns whole (page `-1`).
    /// Bigger files must be read page by page or through `stream`.
    pub max_contents_bytes: u64,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_contents_bytes: DEFAULT_MAX_CONTENTS_BYTES,
        }
    }
}

impl FileOptions {
    /// Read the file adapter's keys from the options passed to `init`,
    /// keeping defaults for anything absent. Unrelated keys are ignored.
    pub fn from_adapter_options(options: &AdapterOptions) -> Result<Self, AdapterError> {
        let defaults = Self::default();
        let page_size = options.get::<u64>("page_size")?.unwrap_or(defaults.page_size);
        let poll_interval_ms = options
            .get::<u64>("poll_interval_ms")?
            .unwrap_or(defaults.poll_interval_ms);
        let max_contents_bytes = options
            .get::<u64>("max_contents_bytes")?
            .unwrap_or(defaults.max_contents_bytes);

        if page_size == 0 {
            return Err(AdapterError::Other("page_size must be at least 1".to_string()));
        }
        if poll_interval_ms == 0 {
            return Err(AdapterError::Other(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if max_contents_bytes == 0 {
            return Err(AdapterError::Other(
                "max_contents_bytes must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            page_size,
            poll_interval_ms,
            max_contents_bytes,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_when_absent() {
        let options = FileOptions::from_adapter_options(&AdapterOptions::new()).unwrap();
        assert_eq!(options, FileOptions::default());
        assert_eq!(options.page_size, 100);
        assert_eq!(options.poll_interval(), Duration::from_secs(1));
        assert_eq!(options.max_contents_bytes, 1024 * 1024);
    }

    #[test]
    fn reads_known_keys_and_ignores_others() {
        let options = AdapterOptions::new()
            .with("page_size", 25)
            .with("poll_interval_ms", 250)
            .with("max_contents_bytes", 4096)
            .with("docker_socket", "/var/run/docker.sock");
        let parsed = FileOptions::from_adapter_options(&options).unwrap();
        assert_eq!(parsed.page_size, 25);
        assert_eq!(parsed.poll_interval_ms, 250);
        assert_eq!(parsed.max_contents_bytes, 4096);
    }

    #[test]
    fn rejects_zero_and_mistyped_values() {
        let zero = AdapterOptions::new().with("page_size", 0);
        assert!(FileOptions::from_adapter_options(&zero).is_err());

        let no_contents = AdapterOptions::new().with("max_contents_bytes", 0);
        assert!(FileOptions::from_adapter_options(&no_contents).is_err());

        let mistyped = AdapterOptions::from_value(json!({ "poll_interval_ms": "soon" })).unwrap();
        assert!(FileOptions::from_adapter_options(&mistyped).is_err());
    }
}

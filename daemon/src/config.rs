//! Daemon configuration with TOML file support.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wog_adapter::AdapterOptions;
use wog_utils::LogFormat;

/// Configuration for the daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; command
/// line flags are applied on top with [`DaemonConfig::apply`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the entry-definition documents.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Lines per page for paged reads.
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// How often watched files are polled for changes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Extra options handed to the adapter as-is.
    #[serde(default)]
    pub adapter: toml::Table,
}

fn default_port() -> u16 {
    7078
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./wog_data")
}

fn default_page_size() -> u64 {
    wog_files::options::DEFAULT_PAGE_SIZE
}

fn default_poll_interval_ms() -> u64 {
    wog_files::options::DEFAULT_POLL_INTERVAL_MS
}

/// Values given on the command line or through the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub log_format: Option<LogFormat>,
    pub log_level: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub page_size: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply command line values over file values.
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(dir) = overrides.storage_dir {
            self.storage_dir = dir;
        }
        if let Some(size) = overrides.page_size {
            self.page_size = size;
        }
        if let Some(interval) = overrides.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        self
    }

    /// Options for the adapter's `init`: the free-form `[adapter]` table
    /// plus the paging and polling settings, which take precedence.
    pub fn adapter_options(&self) -> anyhow::Result<AdapterOptions> {
        let table = serde_json::to_value(&self.adapter).context("invalid [adapter] table")?;
        let options = AdapterOptions::from_value(table)?
            .with("page_size", self.page_size)
            .with("poll_interval_ms", self.poll_interval_ms);
        Ok(options)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            storage_dir: default_storage_dir(),
            page_size: default_page_size(),
            poll_interval_ms: default_poll_interval_ms(),
            adapter: toml::Table::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = DaemonConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = DaemonConfig::from_toml_str("").unwrap();
        assert_eq!(config.port, 7078);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.log_format, LogFormat::Human);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = DaemonConfig::from_toml_str(
            r#"
            port = 9000
            log_format = "json"

            [adapter]
            label = "edge-01"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.adapter.get("label").and_then(|v| v.as_str()), Some("edge-01"));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(DaemonConfig::from_toml_str(r#"log_format = "xml""#).is_err());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config = DaemonConfig::from_toml_str("port = 9000\npage_size = 10").unwrap();
        let config = config.apply(Overrides {
            port: Some(9100),
            log_level: Some("debug".to_string()),
            ..Default::default()
        });
        assert_eq!(config.port, 9100);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn adapter_options_merge_table_and_settings() {
        let config = DaemonConfig::from_toml_str(
            r#"
            page_size = 25

            [adapter]
            label = "edge-01"
            page_size = 1
            "#,
        )
        .unwrap();
        let options = config.adapter_options().unwrap();
        assert_eq!(options.get::<String>("label").unwrap().as_deref(), Some("edge-01"));
        assert_eq!(options.get::<u64>("page_size").unwrap(), Some(25));
        assert_eq!(options.get::<u64>("poll_interval_ms").unwrap(), Some(1000));
    }

    #[test]
    fn from_toml_file_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = DaemonConfig::from_toml_file(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));

        let present = dir.path().join("wog.toml");
        std::fs::write(&present, "port = 1234").unwrap();
        assert_eq!(DaemonConfig::from_toml_file(&present).unwrap().port, 1234);
    }
}

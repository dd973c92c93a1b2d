//! The file adapter.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use wog_adapter::adapter::Destination;
use wog_adapter::{
    Adapter, AdapterError, AdapterOptions, Catalog, ChangeNotifier, ControlMessage, Discovered,
    Discovery, SocketContext,
};
use wog_store::{DefinitionDiscovery, EntryDefinitions, Storage};
use wog_types::{Entry, EntryStats, Page, Supports};

use crate::reader;
use crate::{FileOptions, PollWatcher};

/// Storage key of the file adapter's entry-definition document.
pub const DEFINITIONS_KEY: &str = "files";

#[derive(Serialize)]
struct EntryReply<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
}

#[derive(Serialize)]
struct StatsReply<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    #[serde(flatten)]
    stats: EntryStats,
}

#[derive(Serialize)]
struct ContentsReply<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    page: Page,
    content: String,
}

pub struct FileAdapter {
    discovery: DefinitionDiscovery,
    options: ArcSwap<FileOptions>,
    watcher: Mutex<Option<PollWatcher>>,
}

impl FileAdapter {
    /// A file adapter whose definitions default to the system log.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_defaults(storage, Self::default_definitions())
    }

    /// A file adapter that writes `defaults` when no definitions exist yet.
    pub fn with_defaults(storage: Arc<dyn Storage>, defaults: EntryDefinitions) -> Self {
        Self {
            discovery: DefinitionDiscovery::new(storage, DEFINITIONS_KEY, defaults),
            options: ArcSwap::from_pointee(FileOptions::default()),
            watcher: Mutex::new(None),
        }
    }

    pub fn default_definitions() -> EntryDefinitions {
        EntryDefinitions::new().with_group("System", ["/var/log/syslog"])
    }

    /// Options in effect, as last passed to `init`.
    pub fn options(&self) -> Arc<FileOptions> {
        self.options.load_full()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(PollWatcher::is_running)
    }

    /// Text of one page for the `contents` socket operation.
    ///
    /// The reply is JSON, so bytes that are not valid UTF-8 come back as
    /// U+FFFD. Clients that need the raw bytes use [`Adapter::stream`].
    /// The whole file (page `-1`) is buffered in memory and therefore
    /// refused above `max_contents_bytes`.
    async fn contents(&self, entry: &Entry, page: Page) -> Result<String, AdapterError> {
        let options = self.options();
        if page == Page::All {
            let size = tokio::fs::metadata(&entry.path).await?.len();
            if size > options.max_contents_bytes {
                return Err(AdapterError::Other(format!(
                    "{} is {size} bytes, over the {} byte limit for whole-file contents; request it by page or stream it",
                    entry.path, options.max_contents_bytes
                )));
            }
        }
        let bytes = reader::read_page(&entry.path, page, options.page_size).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl Adapter for FileAdapter {
    fn name(&self) -> &str {
        DEFINITIONS_KEY
    }

    fn supports(&self) -> Supports {
        Supports { watching: true }
    }

    async fn discover(&self, options: &AdapterOptions) -> Result<Vec<Discovered>, AdapterError> {
        self.options
            .store(Arc::new(FileOptions::from_adapter_options(options)?));
        let found = self.discovery.discover().await?;
        debug!(files = found.len(), "file definitions loaded");
        Ok(found)
    }

    async fn watch(&self, catalog: Arc<Catalog>, notifier: ChangeNotifier) -> Result<(), AdapterError> {
        let targets: Vec<_> = catalog
            .all_entries()
            .iter()
            .map(|entry| (entry.id.clone(), PathBuf::from(&entry.path)))
            .collect();
        let interval = self.options().poll_interval();
        info!(files = targets.len(), ?interval, "watching files");

        let watcher = PollWatcher::spawn(targets, interval, notifier);
        let previous = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(watcher);
        if let Some(previous) = previous {
            previous.stop();
        }
        Ok(())
    }

    async fn dispose(&self) {
        let watcher = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(watcher) = watcher {
            watcher.stop();
            debug!("file watcher stopped");
        }
    }

    async fn entry_stats(&self, entry: &Entry) -> Result<EntryStats, AdapterError> {
        Ok(reader::file_stats(&entry.path).await?)
    }

    async fn stream(
        &self,
        entry: &Entry,
        page: Page,
        destination: Destination<'_>,
    ) -> Result<(), AdapterError> {
        reader::copy_page(&entry.path, page, self.options().page_size, destination).await?;
        Ok(())
    }

    async fn handle_socket_message(
        &self,
        socket: &SocketContext,
        message: &ControlMessage,
    ) -> Result<bool, AdapterError> {
        match message.kind() {
            "watch" => {
                let id: String = message.field("id")?;
                socket.watch(&id).await?;
                socket.reply(&EntryReply { kind: "watch", id: &id })?;
            }
            "unwatch" => {
                let id: String = message.field("id")?;
                socket.unwatch(&id).await?;
                socket.reply(&EntryReply { kind: "unwatch", id: &id })?;
            }
            "stats" => {
                let id: String = message.field("id")?;
                let entry = socket.entry(&id)?;
                let stats = reader::file_stats(&entry.path).await?;
                socket.reply(&StatsReply {
                    kind: "stats",
                    id: &id,
                    stats,
                })?;
            }
            "contents" => {
                let id: String = message.field("id")?;
                let page = message.optional_field::<Page>("page")?.unwrap_or_default();
                let entry = socket.entry(&id)?;
                let content = self.contents(entry, page).await?;
                socket.reply(&ContentsReply {
                    kind: "contents",
                    id: &id,
                    page,
                    content,
                })?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

//! wog daemon: serves log files to WebSocket clients.

mod config;
mod shutdown;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use wog_adapter::{AdapterHost, EntryChanged};
use wog_files::FileAdapter;
use wog_store::FsStorage;
use wog_utils::{LogFormat, NanoIdGenerator};
use wog_websocket::WebSocketServer;

use crate::config::{DaemonConfig, Overrides};
use crate::shutdown::ShutdownController;

#[derive(Parser)]
#[command(name = "wog-daemon", about = "Log adapter daemon")]
struct Cli {
    /// WebSocket port.
    #[arg(long, env = "WOG_PORT")]
    port: Option<u16>,

    /// Directory holding the entry-definition documents.
    #[arg(long, env = "WOG_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Lines per page for paged reads.
    #[arg(long, env = "WOG_PAGE_SIZE")]
    page_size: Option<u64>,

    /// Polling interval for watched files, in milliseconds.
    #[arg(long, env = "WOG_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "WOG_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "WOG_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "WOG_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Discover entries and serve them until interrupted.
    Run,
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            log_format: self.log_format,
            log_level: self.log_level.clone(),
            storage_dir: self.storage_dir.clone(),
            page_size: self.page_size,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    let config = base.apply(cli.overrides());

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Run => {
            wog_utils::init_logging(config.log_format, &config.log_level);
            if let Some(path) = &cli.config {
                info!(path = %path.display(), "loaded config");
            }
            run(config).await
        }
    }
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    let storage = Arc::new(FsStorage::new(&config.storage_dir));
    let adapter = FileAdapter::new(storage);
    let host = Arc::new(AdapterHost::new(adapter, Arc::new(NanoIdGenerator::default())));

    host.init(config.adapter_options()?)
        .await
        .context("adapter initialization failed")?;
    let catalog = host.catalog();
    info!(
        adapter = host.name(),
        groups = catalog.groups().len(),
        entries = catalog.len(),
        "adapter ready"
    );
    tokio::spawn(log_changes(host.subscribe_changes()));

    let shutdown = Arc::new(ShutdownController::new());
    let mut stop = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { shutdown.wait_for_signal().await }
    });

    let server = WebSocketServer::new(config.port, host.clone());
    let served = tokio::select! {
        result = server.start() => result.context("WebSocket server stopped"),
        _ = stop.recv() => Ok(()),
    };

    info!("stopping adapter");
    host.dispose().await;
    info!(stats = ?host.stats(), "wog daemon exited");
    served
}

async fn log_changes(mut changes: broadcast::Receiver<EntryChanged>) {
    loop {
        match changes.recv().await {
            Ok(change) => {
                debug!(entry = %change.entry_id, delivered = change.delivered, "entry changed")
            }
            Err(RecvError::Lagged(n)) => warn!(skipped = n, "change log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

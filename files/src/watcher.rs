//! Change detection by polling file metadata.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};
use wog_adapter::ChangeNotifier;
use wog_types::EntryId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

async fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    Some(Fingerprint {
        len: meta.len(),
        modified: meta.modified().ok(),
    })
}

/// Background task reporting entries whose file size or modification time
/// changed since the previous poll. A file appearing or disappearing is a
/// change as well.
///
/// The task stops when the watcher is stopped or dropped, or when the
/// notifier's receiving side goes away.
#[derive(Debug)]
pub struct PollWatcher {
    task: JoinHandle<()>,
}

impl PollWatcher {
    pub fn spawn(targets: Vec<(EntryId, PathBuf)>, interval: Duration, notifier: ChangeNotifier) -> Self {
        Self {
            task: tokio::spawn(poll(targets, interval, notifier)),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for PollWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll(targets: Vec<(EntryId, PathBuf)>, interval: Duration, notifier: ChangeNotifier) {
    let mut last: HashMap<EntryId, Option<Fingerprint>> = HashMap::with_capacity(targets.len());
    for (id, path) in &targets {
        last.insert(id.clone(), fingerprint(path).await);
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if notifier.is_closed() {
            debug!("change channel closed, file watcher stopping");
            return;
        }
        for (id, path) in &targets {
            let current = fingerprint(path).await;
            if last.insert(id.clone(), current) == Some(current) {
                continue;
            }
            trace!(entry = %id, path = %path.display(), "file changed");
            if !notifier.notify(id.clone()) {
                debug!("change channel closed, file watcher stopping");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn appended_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "boot\n").unwrap();

        let (notifier, mut changes) = ChangeNotifier::channel();
        let watcher = PollWatcher::spawn(
            vec![(EntryId::new("app"), path.clone())],
            Duration::from_millis(10),
            notifier,
        );
        // Let the task take its baseline before touching the file.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "request served").unwrap();

        let changed = tokio::time::timeout(WAIT, changes.recv()).await.unwrap();
        assert_eq!(changed, Some(EntryId::new("app")));
        assert!(watcher.is_running());
        watcher.stop();
    }

    #[tokio::test]
    async fn created_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.log");

        let (notifier, mut changes) = ChangeNotifier::channel();
        let _watcher = PollWatcher::spawn(
            vec![(EntryId::new("late"), path.clone())],
            Duration::from_millis(10),
            notifier,
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        std::fs::write(&path, "hello\n").unwrap();

        let changed = tokio::time::timeout(WAIT, changes.recv()).await.unwrap();
        assert_eq!(changed, Some(EntryId::new("late")));
    }

    #[tokio::test]
    async fn unchanged_files_stay_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiet.log");
        std::fs::write(&path, "nothing happens\n").unwrap();

        let (notifier, mut changes) = ChangeNotifier::channel();
        let _watcher = PollWatcher::spawn(
            vec![(EntryId::new("quiet"), path)],
            Duration::from_millis(10),
            notifier,
        );
        let outcome = tokio::time::timeout(Duration::from_millis(100), changes.recv()).await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn stops_when_receiver_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orphan.log");

        let (notifier, changes) = ChangeNotifier::channel();
        let watcher = PollWatcher::spawn(
            vec![(EntryId::new("orphan"), path.clone())],
            Duration::from_millis(10),
            notifier,
        );
        drop(changes);
        tokio::time::sleep(Duration::from_millis(30)).await;
        std::fs::write(&path, "x").unwrap();

        for _ in 0..200 {
            if !watcher.is_running() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("watcher kept running without a receiver");
    }
}

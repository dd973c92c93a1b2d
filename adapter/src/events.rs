//! Change events raised by adapters.

use tokio::sync::mpsc;
use wog_types::EntryId;

/// Published to the serving layer after a change was fanned out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryChanged {
    pub entry_id: EntryId,
    /// Number of registrations the notification was delivered to.
    pub delivered: usize,
}

/// Handed to an adapter so it can report changed entries to the host.
#[derive(Clone, Debug)]
pub struct ChangeNotifier {
    tx: mpsc::UnboundedSender<EntryId>,
}

impl ChangeNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EntryId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report that `entry` changed. Returns `false` once the host stopped
    /// listening (after dispose).
    pub fn notify(&self, entry: EntryId) -> bool {
        self.tx.send(entry).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_until_receiver_drops() {
        let (notifier, mut rx) = ChangeNotifier::channel();
        assert!(notifier.notify(EntryId::new("log-1")));
        assert_eq!(rx.recv().await, Some(EntryId::new("log-1")));
        drop(rx);
        assert!(notifier.is_closed());
        assert!(!notifier.notify(EntryId::new("log-1")));
    }
}

//! Bounded hand-off between action-log producers and the single consumer.
//!
//! Producers call [`ActionLogSender::try_enqueue`], which never suspends and
//! reports overflow as `false` instead of blocking. The consumer side is a
//! cancellable [`ActionLogReceiver::dequeue`]. When the queue is full the
//! offered entry is the one refused; entries already accepted are never
//! evicted.

use tokio::sync::{mpsc, watch};

use crate::models::action_log::ActionLog;

/// Creates a fixed-capacity queue, returning the producer and consumer halves.
/// The sender is cheap to clone; exactly one receiver exists.
pub fn bounded(capacity: usize) -> (ActionLogSender, ActionLogReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ActionLogSender { tx }, ActionLogReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct ActionLogSender {
    tx: mpsc::Sender<ActionLog>,
}

impl ActionLogSender {
    /// Attempts to add `entry` without ever blocking. Returns `false` when the
    /// queue is at capacity (or the consumer is gone); the caller decides what
    /// rejection means.
    pub fn try_enqueue(&self, entry: ActionLog) -> bool {
        self.tx.try_send(entry).is_ok()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

#[derive(Debug)]
pub struct ActionLogReceiver {
    rx: mpsc::Receiver<ActionLog>,
}

impl ActionLogReceiver {
    /// Suspends until an entry is available, returning the oldest one.
    /// Returns `None` once `shutdown` fires (or its sender is dropped), or
    /// when the channel is closed and drained.
    pub async fn dequeue(&mut self, shutdown: &mut watch::Receiver<bool>) -> Option<ActionLog> {
        tokio::select! {
            entry = self.rx.recv() => entry,
            _ = shutdown.changed() => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    use crate::types::ActionLogId;

    fn entry(action_name: &str) -> ActionLog {
        ActionLog {
            id: ActionLogId::new(),
            action_name: action_name.to_string(),
            description: format!("test entry {action_name}"),
            user_id: None,
            payload: None,
            executed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn try_enqueue_rejects_newest_when_full() {
        let (tx, _rx) = bounded(2);
        assert!(tx.try_enqueue(entry("a")));
        assert!(tx.try_enqueue(entry("b")));
        assert!(!tx.try_enqueue(entry("c")));
    }

    #[tokio::test]
    async fn dequeue_returns_entries_in_fifo_order() {
        let (tx, mut rx) = bounded(8);
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
        for name in ["a", "b", "c"] {
            assert!(tx.try_enqueue(entry(name)));
        }
        for expected in ["a", "b", "c"] {
            let got = rx.dequeue(&mut shutdown_rx).await.expect("entry");
            assert_eq!(got.action_name, expected);
        }
    }

    #[tokio::test]
    async fn accepted_entries_survive_an_overflow() {
        let (tx, mut rx) = bounded(1);
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
        assert!(tx.try_enqueue(entry("kept")));
        assert!(!tx.try_enqueue(entry("rejected")));
        let got = rx.dequeue(&mut shutdown_rx).await.expect("entry");
        assert_eq!(got.action_name, "kept");
    }

    #[tokio::test]
    async fn dequeue_unblocks_promptly_on_shutdown() {
        let (_tx, mut rx) = bounded(4);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = shutdown_tx.send(true);
        });

        let result = tokio::time::timeout(Duration::from_secs(1), rx.dequeue(&mut shutdown_rx))
            .await
            .expect("dequeue should return before the timeout");
        assert!(result.is_none());
    }
}

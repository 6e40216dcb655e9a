//! The single background consumer of the action-log queue.
//!
//! Dequeues one entry at a time and persists it through the store seam. A
//! failed persist is reported and skipped; only the shutdown signal stops the
//! loop. Entries still queued at shutdown are dropped, consistent with the
//! pipeline's lossy-under-pressure contract.

use std::sync::Arc;

use tokio::sync::watch;

use crate::services::action_log_queue::ActionLogReceiver;
use crate::services::action_log_store::ActionLogStore;

pub struct ActionLogWorker {
    receiver: ActionLogReceiver,
    store: Arc<dyn ActionLogStore>,
    shutdown: watch::Receiver<bool>,
}

impl ActionLogWorker {
    pub fn new(
        receiver: ActionLogReceiver,
        store: Arc<dyn ActionLogStore>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            receiver,
            store,
            shutdown,
        }
    }

    /// Runs until the shutdown signal fires. Spawn this once at startup:
    ///
    /// ```ignore
    /// let handle = tokio::spawn(worker.run());
    /// ```
    pub async fn run(mut self) {
        tracing::info!("action log worker started");
        loop {
            if *self.shutdown.borrow() {
                break;
            }
            let Some(entry) = self.receiver.dequeue(&mut self.shutdown).await else {
                break;
            };
            if let Err(err) = self.store.insert(&entry).await {
                // One bad entry must never stop the pipeline; it is lost
                // (at-most-once), the next one gets a clean attempt.
                tracing::warn!(
                    error = ?err,
                    action_log_id = %entry.id,
                    action_name = %entry.action_name,
                    "failed to persist action log entry; continuing"
                );
            }
        }
        tracing::info!("action log worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::models::action_log::ActionLog;
    use crate::services::action_log_queue;
    use crate::services::action_log_store::MockActionLogStore;
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

    async fn wait_for_len(seen: &Arc<Mutex<Vec<String>>>, len: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while seen.lock().unwrap().len() < len {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {len} persisted entries"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn worker_persists_entries_in_acceptance_order() {
        let (tx, rx) = action_log_queue::bounded(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let mut store = MockActionLogStore::new();
        store.expect_insert().returning(move |entry| {
            captured.lock().unwrap().push(entry.action_name.clone());
            Ok(())
        });

        let handle = tokio::spawn(ActionLogWorker::new(rx, Arc::new(store), shutdown_rx).run());
        for name in ["a", "b", "c"] {
            assert!(tx.try_enqueue(entry(name)));
        }

        wait_for_len(&seen, 3).await;
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);

        let _ = shutdown_tx.send(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop")
            .expect("worker task should not panic");
    }

    #[tokio::test]
    async fn a_failed_persist_does_not_stop_the_worker() {
        let (tx, rx) = action_log_queue::bounded(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let mut store = MockActionLogStore::new();
        store.expect_insert().returning(move |entry| {
            if entry.action_name == "poison" {
                Err(anyhow::anyhow!("database unavailable"))
            } else {
                captured.lock().unwrap().push(entry.action_name.clone());
                Ok(())
            }
        });

        let handle = tokio::spawn(ActionLogWorker::new(rx, Arc::new(store), shutdown_rx).run());
        for name in ["before", "poison", "after"] {
            assert!(tx.try_enqueue(entry(name)));
        }

        wait_for_len(&seen, 2).await;
        assert_eq!(*seen.lock().unwrap(), vec!["before", "after"]);

        let _ = shutdown_tx.send(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop")
            .expect("worker task should not panic");
    }

    #[tokio::test]
    async fn each_entry_reaches_the_store_exactly_once() {
        let (tx, rx) = action_log_queue::bounded(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let mut store = MockActionLogStore::new();
        store.expect_insert().returning(move |entry| {
            captured.lock().unwrap().push(entry.id.to_string());
            Ok(())
        });

        let handle = tokio::spawn(ActionLogWorker::new(rx, Arc::new(store), shutdown_rx).run());
        for name in ["a", "b", "c", "d"] {
            assert!(tx.try_enqueue(entry(name)));
        }

        wait_for_len(&seen, 4).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let ids = seen.lock().unwrap().clone();
        assert_eq!(ids.len(), 4);
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 4);

        let _ = shutdown_tx.send(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop")
            .expect("worker task should not panic");
    }

    #[tokio::test]
    async fn shutdown_stops_a_worker_blocked_in_dequeue() {
        let (_tx, rx) = action_log_queue::bounded(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let store = MockActionLogStore::new();

        let handle = tokio::spawn(ActionLogWorker::new(rx, Arc::new(store), shutdown_rx).run());
        tokio::time::sleep(Duration::from_millis(10)).await;

        let _ = shutdown_tx.send(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop within bounded time")
            .expect("worker task should not panic");
    }
}

//! Producer facade for the action-log pipeline.
//!
//! [`ActionLogRecorder::record`] is the only call the rest of the application
//! makes to audit an action. It is synchronous, never blocks on I/O, and never
//! fails from the caller's point of view: an overflowing queue costs the
//! triggering entry and a warning, nothing else.

use chrono::Utc;
use serde_json::Value;
use sqlx::types::Json;

use crate::models::action_log::ActionLog;
use crate::services::action_log_queue::ActionLogSender;
use crate::types::{ActionLogId, UserId};

pub const MAX_ACTION_NAME_CHARS: usize = 120;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Caller-supplied draft of an audit entry. The recorder assigns identity and
/// timestamp and enforces the field bounds.
#[derive(Debug, Clone)]
pub struct NewActionLog {
    pub action_name: String,
    pub description: String,
    pub user_id: Option<UserId>,
    pub payload: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ActionLogRecorder {
    sender: ActionLogSender,
    max_payload_bytes: usize,
}

impl ActionLogRecorder {
    pub fn new(sender: ActionLogSender, max_payload_bytes: usize) -> Self {
        Self {
            sender,
            max_payload_bytes,
        }
    }

    /// Records an action, fire-and-forget. Returns immediately regardless of
    /// queue fullness or consumer speed; a rejected entry is reported via
    /// `tracing::warn!` and dropped.
    pub fn record(&self, draft: NewActionLog) {
        let entry = self.build_entry(draft);
        let action_name = entry.action_name.clone();
        if !self.sender.try_enqueue(entry) {
            tracing::warn!(
                action_name = %action_name,
                "action log queue is full; dropping entry"
            );
        }
    }

    fn build_entry(&self, draft: NewActionLog) -> ActionLog {
        let payload = draft.payload.and_then(|value| {
            let serialized_len = serde_json::to_vec(&value).map(|b| b.len()).unwrap_or(0);
            if serialized_len > self.max_payload_bytes {
                tracing::warn!(
                    action_name = %draft.action_name,
                    payload_bytes = serialized_len,
                    max_payload_bytes = self.max_payload_bytes,
                    "action log payload exceeds the size cap; recording entry without it"
                );
                None
            } else {
                Some(Json(value))
            }
        });

        ActionLog {
            id: ActionLogId::new(),
            action_name: truncate_chars(&draft.action_name, MAX_ACTION_NAME_CHARS),
            description: truncate_chars(&draft.description, MAX_DESCRIPTION_CHARS),
            user_id: draft.user_id,
            payload,
            executed_at: Utc::now(),
        }
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        value.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, Instant};
    use tokio::sync::watch;

    use crate::services::action_log_queue;

    fn draft(action_name: &str) -> NewActionLog {
        NewActionLog {
            action_name: action_name.to_string(),
            description: "did a thing".to_string(),
            user_id: None,
            payload: None,
        }
    }

    #[tokio::test]
    async fn record_assigns_id_and_timestamp() {
        let (tx, mut rx) = action_log_queue::bounded(4);
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let recorder = ActionLogRecorder::new(tx, 1024);

        let before = Utc::now();
        recorder.record(draft("record_create"));

        let entry = rx.dequeue(&mut shutdown_rx).await.expect("entry");
        assert_eq!(entry.action_name, "record_create");
        assert!(entry.executed_at >= before);
        assert!(entry.executed_at <= Utc::now());
    }

    #[tokio::test]
    async fn record_truncates_overlong_fields() {
        let (tx, mut rx) = action_log_queue::bounded(4);
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let recorder = ActionLogRecorder::new(tx, 1024);

        let mut long_draft = draft("x");
        long_draft.action_name = "n".repeat(MAX_ACTION_NAME_CHARS + 50);
        long_draft.description = "d".repeat(MAX_DESCRIPTION_CHARS + 50);
        recorder.record(long_draft);

        let entry = rx.dequeue(&mut shutdown_rx).await.expect("entry");
        assert_eq!(entry.action_name.chars().count(), MAX_ACTION_NAME_CHARS);
        assert_eq!(entry.description.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[tokio::test]
    async fn record_drops_oversized_payload_but_keeps_the_entry() {
        let (tx, mut rx) = action_log_queue::bounded(4);
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let recorder = ActionLogRecorder::new(tx, 64);

        let mut with_payload = draft("record_export");
        with_payload.payload = Some(json!({ "blob": "p".repeat(1024) }));
        recorder.record(with_payload);

        let entry = rx.dequeue(&mut shutdown_rx).await.expect("entry");
        assert_eq!(entry.action_name, "record_export");
        assert!(entry.payload.is_none());
    }

    #[tokio::test]
    async fn record_keeps_payload_under_the_cap() {
        let (tx, mut rx) = action_log_queue::bounded(4);
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let recorder = ActionLogRecorder::new(tx, 10 * 1024);

        let payload = json!({ "record_id": "rec-1", "fields": ["dob", "allergies"] });
        let mut with_payload = draft("record_update");
        with_payload.payload = Some(payload.clone());
        recorder.record(with_payload);

        let entry = rx.dequeue(&mut shutdown_rx).await.expect("entry");
        assert_eq!(entry.payload.map(|value| value.0), Some(payload));
    }

    #[tokio::test]
    async fn record_returns_quickly_with_a_saturated_queue() {
        let (tx, _rx) = action_log_queue::bounded(1);
        let recorder = ActionLogRecorder::new(tx, 1024);
        recorder.record(draft("first"));

        // No consumer is draining; every further record must still return.
        let start = Instant::now();
        for _ in 0..1000 {
            recorder.record(draft("overflow"));
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};

use crate::types::{ActionLogId, UserId};

/// One immutable audit record describing a single application action.
///
/// Created once by the recorder, moved through the queue by value, and never
/// mutated afterwards. `executed_at` is the primary ordering key on reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActionLog {
    pub id: ActionLogId,
    pub action_name: String,
    pub description: String,
    pub user_id: Option<UserId>,
    pub payload: Option<Json<Value>>,
    pub executed_at: DateTime<Utc>,
}

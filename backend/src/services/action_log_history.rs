use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::action_log::ActionLog;
use crate::repositories::action_log::{self, ActionLogFilters};
use crate::types::ActionLogId;

/// One page of persisted history plus pagination metadata.
#[derive(Debug, Clone)]
pub struct ActionLogPage {
    pub items: Vec<ActionLog>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Read path over the durable store. Shares nothing with the write pipeline
/// beyond the entry shape and the table.
#[derive(Debug, Clone)]
pub struct ActionLogHistoryService {
    pool: PgPool,
}

impl ActionLogHistoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns one page of entries matching all supplied filters, newest
    /// first. Callers are expected to pass `page >= 1` and `per_page >= 1`
    /// (the HTTP layer clamps). An empty page with accurate metadata is a
    /// valid result, not an error.
    pub async fn get_history(
        &self,
        filters: &ActionLogFilters,
        page: i64,
        per_page: i64,
    ) -> Result<ActionLogPage, sqlx::Error> {
        let offset = (page - 1) * per_page;
        let (items, total) =
            action_log::list_action_logs(&self.pool, filters, per_page, offset).await?;
        let total_pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Ok(ActionLogPage {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    pub async fn fetch(&self, id: ActionLogId) -> Result<Option<ActionLog>, sqlx::Error> {
        action_log::fetch_action_log(&self.pool, id).await
    }

    pub async fn delete_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        action_log::delete_action_logs_before(&self.pool, cutoff).await
    }
}

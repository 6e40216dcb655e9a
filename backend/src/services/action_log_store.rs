use async_trait::async_trait;
use sqlx::PgPool;

#[cfg(test)]
use mockall::automock;

use crate::models::action_log::ActionLog;
use crate::repositories::action_log;

/// Durable sink for action log entries, object-safe so the worker can run
/// against Postgres in production and a mock in tests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActionLogStore: Send + Sync {
    /// Persists one entry. Implementations acquire whatever handle they need
    /// for this single call and release it before returning.
    async fn insert(&self, entry: &ActionLog) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct PgActionLogStore {
    pool: PgPool,
}

impl PgActionLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActionLogStore for PgActionLogStore {
    async fn insert(&self, entry: &ActionLog) -> anyhow::Result<()> {
        // A fresh connection per entry: a slow or failed persist cannot hold
        // state across iterations of the consumer loop.
        let mut conn = self.pool.acquire().await?;
        action_log::insert_action_log(&mut *conn, entry).await?;
        Ok(())
    }
}

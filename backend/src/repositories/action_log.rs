use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::models::action_log::ActionLog;
use crate::types::{ActionLogId, UserId};

/// Optional, conjunctive filters for the history read path. Absent filters
/// exclude nothing.
#[derive(Debug, Clone, Default)]
pub struct ActionLogFilters {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub user_id: Option<UserId>,
    pub action_name: Option<String>,
}

/// Inserts a single entry. Generic over the executor so the consumer worker
/// can run it on a connection acquired for exactly one entry.
pub async fn insert_action_log(
    executor: impl PgExecutor<'_>,
    log: &ActionLog,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO action_logs \
         (id, action_name, description, user_id, payload, executed_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(log.id.to_string())
    .bind(&log.action_name)
    .bind(&log.description)
    .bind(log.user_id.as_ref().map(|id| id.to_string()))
    .bind(&log.payload)
    .bind(log.executed_at)
    .execute(executor)
    .await
    .map(|_| ())
}

pub async fn fetch_action_log(
    pool: &PgPool,
    id: ActionLogId,
) -> Result<Option<ActionLog>, sqlx::Error> {
    sqlx::query_as::<_, ActionLog>(
        "SELECT id, action_name, description, user_id, payload, executed_at \
         FROM action_logs WHERE id = $1",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await
}

pub async fn list_action_logs(
    pool: &PgPool,
    filters: &ActionLogFilters,
    per_page: i64,
    offset: i64,
) -> Result<(Vec<ActionLog>, i64), sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, action_name, description, user_id, payload, executed_at FROM action_logs",
    );
    let mut has_clause = false;
    apply_action_log_filters(&mut builder, &mut has_clause, filters);
    builder.push(" ORDER BY executed_at DESC, id DESC");
    builder
        .push(" LIMIT ")
        .push_bind(per_page)
        .push(" OFFSET ")
        .push_bind(offset);
    let items = builder.build_query_as::<ActionLog>().fetch_all(pool).await?;

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM action_logs");
    let mut count_has_clause = false;
    apply_action_log_filters(&mut count_builder, &mut count_has_clause, filters);
    let total = count_builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

pub async fn delete_action_logs_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM action_logs WHERE executed_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

fn apply_action_log_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    filters: &ActionLogFilters,
) {
    if let Some(start) = filters.start_date.as_ref() {
        push_clause(builder, has_clause);
        builder.push("executed_at >= ").push_bind(start.to_owned());
    }
    if let Some(end) = filters.end_date.as_ref() {
        push_clause(builder, has_clause);
        builder.push("executed_at <= ").push_bind(end.to_owned());
    }
    if let Some(user_id) = filters.user_id.as_ref() {
        push_clause(builder, has_clause);
        builder.push("user_id = ").push_bind(user_id.to_string());
    }
    if let Some(action_name) = filters.action_name.as_ref() {
        push_clause(builder, has_clause);
        builder
            .push("action_name = ")
            .push_bind(action_name.to_string());
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    if *has_clause {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_clause = true;
    }
}

use chrono::{Duration, Utc};
use medrec_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::action_log,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let cutoff = Utc::now() - Duration::days(config.action_log_retention_days);
    let deleted = action_log::delete_action_logs_before(&pool, cutoff).await?;
    if deleted > 0 {
        tracing::info!("Deleted {} expired action log entries", deleted);
    }

    sqlx::query("VACUUM (ANALYZE) action_logs")
        .execute(&pool)
        .await?;

    Ok(())
}

use axum::{http::Method, middleware as axum_middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use medrec_backend::{
    config::Config,
    db::connection::{create_pool, DbPool},
    docs, handlers, middleware,
    services::{
        action_log::ActionLogRecorder, action_log_queue, action_log_store::PgActionLogStore,
        action_log_worker::ActionLogWorker,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medrec_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        action_log_queue_capacity = config.action_log_queue_capacity,
        action_log_max_payload_bytes = config.action_log_max_payload_bytes,
        action_log_retention_days = config.action_log_retention_days,
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool: DbPool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Assemble the action log pipeline: bounded queue, fire-and-forget
    // recorder for producers, and the single consumer worker.
    let (log_tx, log_rx) = action_log_queue::bounded(config.action_log_queue_capacity);
    let recorder = ActionLogRecorder::new(log_tx, config.action_log_max_payload_bytes);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let store = Arc::new(PgActionLogStore::new(pool.clone()));
    let worker_handle = tokio::spawn(ActionLogWorker::new(log_rx, store, shutdown_rx).run());

    let state = AppState::new(pool, config, recorder);

    // Build admin routes (the administrative read surface over the log store)
    let admin_routes = Router::new()
        .route(
            "/api/admin/action-logs",
            get(handlers::admin::action_logs::list_action_logs),
        )
        .route(
            "/api/admin/action-logs/{id}",
            get(handlers::admin::action_logs::get_action_log_detail),
        );

    // Compose app with shared layers (CORS/Trace) and shared state
    let app = Router::new()
        .merge(admin_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", docs::ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::action_log,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::OPTIONS])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The server has drained; stop the consumer. Entries still queued are
    // dropped by design.
    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

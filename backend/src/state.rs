use crate::{config::Config, db::connection::DbPool, services::action_log::ActionLogRecorder};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub action_log: ActionLogRecorder,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config, action_log: ActionLogRecorder) -> Self {
        Self {
            pool,
            config,
            action_log,
        }
    }
}

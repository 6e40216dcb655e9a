pub mod action_log;
pub mod action_log_history;
pub mod action_log_queue;
pub mod action_log_store;
pub mod action_log_worker;

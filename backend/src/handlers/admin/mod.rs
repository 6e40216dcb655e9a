pub mod action_logs;

pub mod activity_logs;
pub mod analytics;
pub mod auth;
pub mod campaigns;
pub mod comments;
pub mod config;
pub mod daily_metrics;
pub mod error;
pub mod leads;
pub mod notifications;
pub mod reports;
pub mod schema;
pub mod state;
pub mod tasks;
pub mod users;

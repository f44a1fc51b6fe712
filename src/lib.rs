/// Teamhub - team collaboration server
///
/// Accounts and sessions, teams with per-team roles, invitations, shared
/// calendar entries, and a client library for session-aware front ends.

pub mod account;
pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod invitations;
pub mod jobs;
pub mod mailer;
pub mod metrics;
pub mod navigation;
pub mod profile;
pub mod rate_limit;
pub mod server;
pub mod teams;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{AppError, AppResult};

pub mod access;
pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod middleware;

pub use app::{build_router, AppState};
pub use config::AppConfig;

//! Article Board Library
//!
//! This library provides the Article Board server: user registration and
//! cookie sessions, ownership-checked article management, SQLite persistence
//! and the HTTP page routes.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::{ArticleService, AuthService, BoardError, Config};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for the library
pub type Result<T> = anyhow::Result<T>;

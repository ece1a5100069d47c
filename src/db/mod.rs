//! Database module
//!
//! This module provides the document-store layer:
//! - Database connection pool management
//! - Repository pattern implementations for users, articles and sessions
//! - Database migrations
//! - Data models

pub mod manager;
pub mod models;
pub mod repository;
pub mod migrations;

pub use manager::DatabaseManager;
pub use models::{Article, Session, User};
pub use repository::{ArticleRepository, Repository, SessionRepository, UserRepository};

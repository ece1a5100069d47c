pub mod articles;

pub use articles::*;

use crate::core::services::{ArticleService, AuthService};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub article_service: Arc<ArticleService>,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

//! Authentication module
//!
//! This module provides authentication functionality including:
//! - User registration, login and logout
//! - Signed session tokens naming server-side sessions
//! - Password hashing and verification
//! - Session resolution and login-required middleware

pub mod jwt;
pub mod password;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use jwt::{generate_token, validate_token, Claims};
pub use password::{hash_password, verify_password, PasswordHasher};
pub use middleware::{ensure_authenticated, resolve_session, AuthUser, CurrentUser};
pub use models::SessionUser;

//! Core business logic module
//!
//! This module provides the core application layer including:
//! - Authentication and article services
//! - Configuration management
//! - Structured logging system
//! - Error handling and form validation

pub mod services;
pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod utils;

pub use services::{ArticleService, AuthService, SessionSettings};
pub use config::Config;
pub use logging::Logger;
pub use error::{BoardError, ErrorResponse, Result};
pub use validation::{FieldError, ValidationErrors};
pub use utils::retry_once;

//! Authentication request models and session identity

use serde::{Deserialize, Serialize};

/// Registration form (`POST /user/register`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Password confirmation
    #[serde(default)]
    pub password2: String,
}

/// Login form (`POST /user/login`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    #[serde(skip_serializing)]
    pub session_id: String,
    pub id: String,
    pub username: String,
    pub name: String,
}

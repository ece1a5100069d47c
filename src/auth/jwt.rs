//! Signed session tokens
//!
//! The session cookie carries a JWT naming the server-side session; the
//! signature stops clients from forging session ids.

use crate::core::error::{BoardError, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Session id
    pub sid: String,
    pub user_id: String,
    /// Expiry as a unix timestamp
    pub exp: usize,
}

/// Generate a token for a session expiring at `expires_at` (unix seconds)
pub fn generate_token(session_id: &str, user_id: &str, expires_at: i64, secret: &str) -> Result<String> {
    let exp = usize::try_from(expires_at)
        .map_err(|_| BoardError::TokenError("Session expiry is before the epoch".to_string()))?;

    let claims = Claims {
        sid: session_id.to_string(),
        user_id: user_id.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| BoardError::TokenError(format!("Failed to generate token: {}", e)))
}

/// Validate a token's signature and expiry and extract claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| BoardError::TokenError(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

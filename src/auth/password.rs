//! Password hashing and verification using bcrypt

use crate::core::error::{BoardError, Result};

/// Hash a password using bcrypt with a fresh random salt
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| BoardError::HashError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash
///
/// `Ok(false)` is a mismatch; `Err` means the hash could not be checked at all.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| BoardError::HashError(format!("Failed to verify password: {}", e)))
}

/// Salted password hasher with a fixed work factor
///
/// bcrypt is deliberately slow, so both operations run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| BoardError::TaskError(format!("Hashing task panicked: {}", e)))?
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| BoardError::TaskError(format!("Verification task panicked: {}", e)))?
    }
}

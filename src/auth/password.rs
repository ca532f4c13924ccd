//! Password validation and hashing.
//!
//! `PasswordHash` holds a salted bcrypt hash and is the only form in which a
//! password is ever stored.

use std::fmt::Display;

use bcrypt::{hash, verify, BcryptError};
use thiserror::Error;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    TooShort,

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] BcryptError),
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, sqlx::Type)]
#[sqlx(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default bcrypt cost.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Validate `raw_password` and hash it with the given bcrypt `cost`.
    ///
    /// Hashing is deliberately slow; call this from a blocking task.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, PasswordError> {
        if raw_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort);
        }

        Ok(Self(hash(raw_password, cost)?))
    }

    /// Wrap an existing hash without checking it.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Check that `raw_password` matches the stored hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn short_passwords_are_rejected() {
        let result = PasswordHash::from_raw_password("hunter2", TEST_COST);

        assert!(matches!(result, Err(PasswordError::TooShort)));
    }

    #[test]
    fn hash_verifies_the_original_password_only() {
        let hash = PasswordHash::from_raw_password("correct horse battery", TEST_COST).unwrap();

        assert!(hash.verify("correct horse battery").unwrap());
        assert!(!hash.verify("wrong horse battery").unwrap());
    }

    #[test]
    fn hash_never_contains_the_raw_password() {
        let hash = PasswordHash::from_raw_password("correct horse battery", TEST_COST).unwrap();

        assert!(!hash.as_str().contains("correct horse battery"));
    }
}

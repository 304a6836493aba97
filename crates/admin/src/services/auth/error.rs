//! Admin authentication error types.

use thiserror::Error;

use storekeep_core::PasswordError;

use crate::db::RepositoryError;
use crate::services::crypto::CryptoError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username was blank.
    #[error("username is required")]
    UsernameRequired,

    /// Password does not satisfy the complexity policy.
    #[error("weak password: {0}")]
    WeakPassword(#[from] PasswordError),

    /// An admin with this username already exists.
    #[error("admin user already exists")]
    UserAlreadyExists,

    /// Hashing the password failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Encryption or decryption failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Session claims could not be serialized.
    #[error("session payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

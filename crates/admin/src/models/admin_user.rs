//! Admin user and persistent login token types.

use chrono::{DateTime, Utc};

use storekeep_core::{AdminId, AuthTokenId};

/// An admin user as stored.
///
/// The username is only ever held encrypted here; callers decrypt it with the
/// field cipher when they need to compare it.
#[derive(Clone)]
pub struct AdminUser {
    /// Unique admin ID.
    pub id: AdminId,
    /// AES-256-GCM ciphertext of the username (base64url).
    pub username_ciphertext: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}

impl std::fmt::Debug for AdminUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUser")
            .field("id", &self.id)
            .field("password_hash", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// A persistent "remember me" token.
///
/// Only the SHA-256 of the validator is stored; the plaintext validator lives
/// in the client's cookie.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub id: AuthTokenId,
    pub admin_id: AdminId,
    /// Random lookup key (hex).
    pub selector: String,
    /// SHA-256 of the validator (hex).
    pub hashed_validator: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    /// Whether the token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

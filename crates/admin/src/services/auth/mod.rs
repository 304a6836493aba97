//! Admin authentication service.
//!
//! Password login against argon2id hashes, plus the two ways a login is
//! carried between requests:
//!
//! - **Persistent tokens** ("remember me"): a random selector/validator pair.
//!   Only the SHA-256 of the validator is stored. A validator mismatch is
//!   treated as a stolen token and the row is deleted.
//! - **Session payloads**: encrypted `{sub, exp}` claims held entirely in the
//!   cookie.

mod error;

pub use error::AuthError;

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::instrument;

use storekeep_core::{AdminId, validate_password};

use crate::db::Stores;
use crate::models::{AdminUser, AuthCookie, SessionClaims};
use crate::services::crypto::{FieldCipher, constant_time_eq, random_hex, sha256_hex};

/// Random bytes in a token selector.
const SELECTOR_BYTES: usize = 16;
/// Random bytes in a token validator.
const VALIDATOR_BYTES: usize = 32;
/// Lifetime of a persistent login token, in days.
pub const AUTH_TOKEN_TTL_DAYS: i64 = 30;

/// Result of checking a username/password pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(AdminId),
    PasswordMismatch,
    UnknownUser,
}

/// A freshly issued persistent token. The validator is never stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub selector: String,
    pub validator: String,
}

impl IssuedToken {
    /// The cookie carrying this token.
    #[must_use]
    pub fn cookie(&self) -> AuthCookie {
        AuthCookie::DbToken {
            selector: self.selector.clone(),
            validator: self.validator.clone(),
        }
    }
}

/// Admin authentication service.
pub struct AuthService<'a> {
    stores: &'a Stores,
    cipher: &'a FieldCipher,
    session_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(stores: &'a Stores, cipher: &'a FieldCipher, session_ttl: Duration) -> Self {
        Self {
            stores,
            cipher,
            session_ttl,
        }
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Check a username/password pair.
    ///
    /// Usernames are encrypted with a random nonce, so there is no index to
    /// look them up by; every admin row is decrypted and compared.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the admin list cannot be loaded.
    #[instrument(skip_all)]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, AuthError> {
        let Some(admin) = self.find_by_username(username.trim()).await? else {
            tracing::info!("Login attempt for unknown admin");
            return Ok(AuthOutcome::UnknownUser);
        };

        if verify_password(password, &admin.password_hash) {
            tracing::info!(admin_id = %admin.id, "Admin authenticated");
            Ok(AuthOutcome::Authenticated(admin.id))
        } else {
            tracing::warn!(admin_id = %admin.id, "Admin password mismatch");
            Ok(AuthOutcome::PasswordMismatch)
        }
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UsernameRequired` for a blank username,
    /// `AuthError::WeakPassword` if the password fails the policy, and
    /// `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip_all)]
    pub async fn register_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminUser, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::UsernameRequired);
        }
        validate_password(password)?;

        if self.find_by_username(username).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let ciphertext = self.cipher.encrypt(username)?;
        let hash = hash_password(password)?;
        let admin = self.stores.admins.create_admin(&ciphertext, &hash).await?;

        tracing::info!(admin_id = %admin.id, "Registered admin");
        Ok(admin)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, AuthError> {
        for admin in self.stores.admins.list_admins().await? {
            match self.cipher.decrypt(&admin.username_ciphertext) {
                Ok(plain) if plain == username => return Ok(Some(admin)),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(admin_id = %admin.id, error = %e, "Undecryptable admin username");
                }
            }
        }
        Ok(None)
    }

    // =========================================================================
    // Persistent Tokens
    // =========================================================================

    /// Issue a persistent login token for an admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token cannot be stored.
    #[instrument(skip(self))]
    pub async fn create_auth_token(&self, admin_id: AdminId) -> Result<IssuedToken, AuthError> {
        let selector = random_hex(SELECTOR_BYTES);
        let validator = random_hex(VALIDATOR_BYTES);
        let expires_at = Utc::now() + chrono::Duration::days(AUTH_TOKEN_TTL_DAYS);

        self.stores
            .tokens
            .insert_token(admin_id, &selector, &sha256_hex(&validator), expires_at)
            .await?;

        Ok(IssuedToken {
            selector,
            validator,
        })
    }

    /// Resolve a persistent token to its admin.
    ///
    /// Expired tokens and tokens presented with the wrong validator are
    /// deleted, so a failed check consumes the selector.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token store fails.
    #[instrument(skip(self, validator))]
    pub async fn validate_auth_token(
        &self,
        selector: &str,
        validator: &str,
    ) -> Result<Option<AdminId>, AuthError> {
        let Some(token) = self.stores.tokens.find_token(selector).await? else {
            return Ok(None);
        };

        if token.is_expired(Utc::now()) {
            self.stores.tokens.delete_token(selector).await?;
            tracing::info!(admin_id = %token.admin_id, "Removed expired auth token");
            return Ok(None);
        }

        if !constant_time_eq(&token.hashed_validator, &sha256_hex(validator)) {
            self.stores.tokens.delete_token(selector).await?;
            tracing::warn!(
                admin_id = %token.admin_id,
                "Auth token validator mismatch, token revoked"
            );
            return Ok(None);
        }

        Ok(Some(token.admin_id))
    }

    /// Delete a persistent token (logout).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn revoke_auth_token(&self, selector: &str) -> Result<(), AuthError> {
        if self.stores.tokens.delete_token(selector).await? {
            tracing::info!("Revoked auth token");
        }
        Ok(())
    }

    // =========================================================================
    // Session Payloads
    // =========================================================================

    /// Seal `{sub, exp}` claims for a session cookie.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Crypto` or `AuthError::Payload` if sealing fails.
    pub fn create_session_payload(&self, admin_id: AdminId) -> Result<String, AuthError> {
        let ttl = i64::try_from(self.session_ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            sub: i64::from(admin_id.as_i32()),
            exp: Utc::now().timestamp().saturating_add(ttl),
        };
        self.seal_claims(&claims)
    }

    fn seal_claims(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        let json = serde_json::to_string(claims)?;
        Ok(self.cipher.encrypt(&json)?)
    }

    /// Open a session payload, returning the admin id if it is intact and
    /// unexpired.
    #[must_use]
    pub fn validate_session_payload(&self, blob: &str) -> Option<AdminId> {
        let json = self.cipher.decrypt(blob).ok()?;
        let claims: SessionClaims = serde_json::from_str(&json).ok()?;

        if claims.exp <= Utc::now().timestamp() {
            return None;
        }
        let sub = i32::try_from(claims.sub).ok().filter(|id| *id > 0)?;
        Some(AdminId::new(sub))
    }

    // =========================================================================
    // Cookies
    // =========================================================================

    /// Resolve either cookie format to an admin id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if a token lookup fails.
    pub async fn resolve_cookie(&self, cookie: &AuthCookie) -> Result<Option<AdminId>, AuthError> {
        match cookie {
            AuthCookie::DbToken {
                selector,
                validator,
            } => self.validate_auth_token(selector, validator).await,
            AuthCookie::SessionPayload(blob) => Ok(self.validate_session_payload(blob)),
        }
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash. Unparseable hashes never match.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

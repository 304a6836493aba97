//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! sk-cli admin create -u root -p 'S3cret!pass'
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for admin database
//! - `ADMIN_ENCRYPTION_KEY` - Base64 AES-256 key used to encrypt usernames

use secrecy::SecretString;
use thiserror::Error;

use storekeep_admin::db::{Stores, create_pool};
use storekeep_admin::services::{AuthError, AuthService, CryptoError, FieldCipher};
use storekeep_core::AdminId;

use super::migrate::{MigrationError, database_url};

/// The CLI only registers admins and never issues session payloads.
const UNUSED_SESSION_TTL: std::time::Duration = std::time::Duration::from_secs(0);

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Connection(#[from] MigrationError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid encryption key: {0}")]
    Key(#[from] CryptoError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new admin user.
///
/// The password must satisfy the login policy; the username is stored
/// encrypted.
///
/// # Errors
///
/// Returns `AdminError` if configuration is missing, the password is weak,
/// or the username is taken.
pub async fn create_user(username: &str, password: &str) -> Result<AdminId, AdminError> {
    let database_url = database_url()?;
    let key = std::env::var("ADMIN_ENCRYPTION_KEY")
        .map_err(|_| AdminError::MissingEnvVar("ADMIN_ENCRYPTION_KEY"))?;
    let cipher = FieldCipher::from_base64_key(&key)?;

    tracing::info!("Connecting to admin database...");
    let pool = create_pool(&SecretString::from(database_url)).await?;
    let stores = Stores::postgres(pool);

    let admin = AuthService::new(&stores, &cipher, UNUSED_SESSION_TTL)
        .register_admin(username, password)
        .await?;

    tracing::info!(admin_id = %admin.id, "Admin user created successfully");
    Ok(admin.id)
}

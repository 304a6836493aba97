//! Authentication cookie formats.
//!
//! The auth cookie carries one of two values:
//!
//! - `db_token:<selector>:<validator>` for persistent "remember me" logins,
//!   resolved against the token table.
//! - `session_payload:<ciphertext>` for ordinary logins, an encrypted
//!   [`SessionClaims`] blob that is never stored server-side.

use serde::{Deserialize, Serialize};

/// Name of the admin authentication cookie.
pub const AUTH_COOKIE_NAME: &str = "sk_admin_auth";

const DB_TOKEN_PREFIX: &str = "db_token:";
const SESSION_PAYLOAD_PREFIX: &str = "session_payload:";

/// Claims sealed inside a session payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin id.
    pub sub: i64,
    /// Expiry as unix seconds.
    pub exp: i64,
}

/// A parsed auth cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCookie {
    DbToken { selector: String, validator: String },
    SessionPayload(String),
}

impl AuthCookie {
    /// Parse a raw cookie value. Unknown or malformed values yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(rest) = raw.strip_prefix(DB_TOKEN_PREFIX) {
            let (selector, validator) = rest.split_once(':')?;
            if selector.is_empty() || validator.is_empty() {
                return None;
            }
            return Some(Self::DbToken {
                selector: selector.to_string(),
                validator: validator.to_string(),
            });
        }

        let blob = raw.strip_prefix(SESSION_PAYLOAD_PREFIX)?;
        if blob.is_empty() {
            return None;
        }
        Some(Self::SessionPayload(blob.to_string()))
    }

    /// Render the cookie value.
    #[must_use]
    pub fn to_value(&self) -> String {
        match self {
            Self::DbToken {
                selector,
                validator,
            } => format!("{DB_TOKEN_PREFIX}{selector}:{validator}"),
            Self::SessionPayload(blob) => format!("{SESSION_PAYLOAD_PREFIX}{blob}"),
        }
    }

    /// Whether this is a persistent "remember me" cookie.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::DbToken { .. })
    }
}

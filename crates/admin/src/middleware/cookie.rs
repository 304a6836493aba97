//! `Set-Cookie` values for the admin auth cookie.

use axum::http::HeaderValue;
use cookie::{Cookie, SameSite};

use crate::error::AppError;
use crate::models::{AUTH_COOKIE_NAME, AuthCookie};
use crate::services::AUTH_TOKEN_TTL_DAYS;

fn base(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build()
}

fn to_header(cookie: &Cookie<'_>) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))
}

/// `Set-Cookie` value carrying an auth cookie.
///
/// Remember-me tokens persist for the token lifetime; session payloads are
/// session cookies.
///
/// # Errors
///
/// Returns `AppError::Internal` if the value is not a valid header.
pub fn auth_cookie_header(cookie: &AuthCookie, secure: bool) -> Result<HeaderValue, AppError> {
    let mut built = base(cookie.to_value(), secure);
    if cookie.is_persistent() {
        built.set_max_age(cookie::time::Duration::days(AUTH_TOKEN_TTL_DAYS));
    }
    to_header(&built)
}

/// `Set-Cookie` value that removes the auth cookie.
///
/// # Errors
///
/// Returns `AppError::Internal` if the value is not a valid header.
pub fn clear_auth_cookie_header(secure: bool) -> Result<HeaderValue, AppError> {
    let mut built = base(String::new(), secure);
    built.make_removal();
    to_header(&built)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_has_no_max_age() {
        let header = auth_cookie_header(&AuthCookie::SessionPayload("abc".into()), false).unwrap();
        let value = header.to_str().unwrap();
        assert!(value.starts_with("sk_admin_auth=session_payload:abc"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Path=/"));
        assert!(!value.contains("Max-Age"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_remember_me_cookie_persists() {
        let cookie = AuthCookie::DbToken {
            selector: "sel".into(),
            validator: "val".into(),
        };
        let header = auth_cookie_header(&cookie, true).unwrap();
        let value = header.to_str().unwrap();
        assert!(value.starts_with("sk_admin_auth=db_token:sel:val"));
        assert!(value.contains("Max-Age=2592000"));
        assert!(value.contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires() {
        let header = clear_auth_cookie_header(false).unwrap();
        let value = header.to_str().unwrap();
        assert!(value.starts_with("sk_admin_auth=;"));
        assert!(value.contains("Max-Age=0"));
    }
}

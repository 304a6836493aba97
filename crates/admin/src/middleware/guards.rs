//! Per-route guard chain.
//!
//! Each route declares an ordered slice of [`Guard`]s. The dispatcher runs
//! them in order and stops at the first verdict that is not [`Verdict::Allow`].

use std::str::FromStr;

use serde::Deserialize;

use storekeep_core::validate_password;

use crate::error::{AppError, FieldErrors, set_sentry_user};
use crate::routing::AdminRequest;
use crate::state::AppState;

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Redirect {
        to: &'static str,
        clear_cookie: bool,
    },
    InvalidCredentials(FieldErrors),
}

/// A request guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Require a valid auth cookie and attach the admin to the request.
    Authorize,
    /// Send admins who are already logged in to the dashboard.
    AlreadyLoggedIn,
    /// Check the login form before it reaches the handler.
    ValidateCredentials,
}

/// Unknown guard key.
#[derive(Debug, thiserror::Error)]
#[error("unknown guard: {0}")]
pub struct UnknownGuard(String);

/// Parse a guard from its key. The route table declares guards as slices;
/// the keys are the names guards go by in logs.
impl FromStr for Guard {
    type Err = UnknownGuard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorize" => Ok(Self::Authorize),
            "already_logged_in" => Ok(Self::AlreadyLoggedIn),
            "validate" => Ok(Self::ValidateCredentials),
            other => Err(UnknownGuard(other.to_string())),
        }
    }
}

impl Guard {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Authorize => "authorize",
            Self::AlreadyLoggedIn => "already_logged_in",
            Self::ValidateCredentials => "validate",
        }
    }

    /// Run this guard against a request.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the token store cannot be reached.
    pub async fn check(self, state: &AppState, req: &mut AdminRequest) -> Result<Verdict, AppError> {
        match self {
            Self::Authorize => {
                let admin_id = match req.auth_cookie() {
                    Some(cookie) => state.auth().resolve_cookie(&cookie).await?,
                    None => None,
                };
                let Some(admin_id) = admin_id else {
                    tracing::debug!(path = %req.path(), "Unauthenticated request");
                    return Ok(Verdict::Redirect {
                        to: "/login",
                        clear_cookie: true,
                    });
                };
                req.set_admin_id(admin_id);
                set_sentry_user(admin_id.as_i32());
                Ok(Verdict::Allow)
            }
            Self::AlreadyLoggedIn => {
                if let Some(cookie) = req.auth_cookie()
                    && state.auth().resolve_cookie(&cookie).await?.is_some()
                {
                    return Ok(Verdict::Redirect {
                        to: "/admin",
                        clear_cookie: false,
                    });
                }
                Ok(Verdict::Allow)
            }
            Self::ValidateCredentials => {
                let form: LoginForm = req.form().await.unwrap_or_default();
                let errors = validate_login_form(&form);
                if errors.is_empty() {
                    Ok(Verdict::Allow)
                } else {
                    Ok(Verdict::InvalidCredentials(errors))
                }
            }
        }
    }
}

/// Run guards in order, returning the first verdict that is not `Allow`.
///
/// # Errors
///
/// Propagates the first guard error.
pub async fn run_guards(
    guards: &[Guard],
    state: &AppState,
    req: &mut AdminRequest,
) -> Result<Verdict, AppError> {
    for guard in guards {
        let verdict = guard.check(state, req).await?;
        if verdict != Verdict::Allow {
            tracing::debug!(guard = guard.key(), "Guard stopped request");
            return Ok(verdict);
        }
    }
    Ok(Verdict::Allow)
}

/// Submitted login form.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub remember: Option<String>,
}

impl LoginForm {
    /// Whether the "remember me" box was ticked.
    #[must_use]
    pub fn remember_me(&self) -> bool {
        self.remember
            .as_deref()
            .is_some_and(|v| matches!(v, "on" | "1" | "true" | "yes"))
    }
}

/// Per-field errors for a login form. Empty when the form is acceptable.
#[must_use]
pub fn validate_login_form(form: &LoginForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if form.username.trim().is_empty() {
        errors.add("username", "Username is required");
    }
    if form.password.is_empty() {
        errors.add("password", "Password is required");
    } else if let Err(e) = validate_password(&form.password) {
        errors.add("password", capitalize(&e.to_string()));
    }
    errors
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

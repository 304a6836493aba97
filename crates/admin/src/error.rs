//! Unified error handling for admin.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::categories::CategoryError;
use crate::services::products::ProductError;

/// Per-field validation messages for a re-rendered form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field, keeping the first one reported.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input from the client.
    #[error("{0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Operation conflicts with existing data (e.g. category in use).
    #[error("{0}")]
    Conflict(String),

    /// Request body exceeded the configured limit.
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Login form failed validation or authentication.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(FieldErrors),

    /// No valid login on a protected route.
    #[error("Unauthorized")]
    Unauthorized,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCredentials(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::SEE_OTHER,
            Self::Repository(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::Validation(msg) => Self::Validation(msg),
            CategoryError::NotFound => Self::NotFound("Category not found".to_string()),
            CategoryError::InUse => {
                Self::Conflict("Category or one of its subcategories is in use".to_string())
            }
            CategoryError::Repository(e) => Self::Repository(e),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Validation(msg) => Self::Validation(msg),
            ProductError::Upload(e) => Self::Validation(e.to_string()),
            ProductError::NotFound => Self::NotFound("Product not found".to_string()),
            ProductError::Storage(e) => Self::Internal(format!("image storage failed: {e}")),
            ProductError::Repository(e) => Self::Repository(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Repository(e) => Self::Repository(e),
            AuthError::UsernameRequired
            | AuthError::WeakPassword(_)
            | AuthError::UserAlreadyExists => Self::Validation(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Repository(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        if matches!(self, Self::Unauthorized) {
            return (self.status(), [(header::LOCATION, "/login")]).into_response();
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Repository(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::InvalidCredentials(_) => "Invalid credentials".to_string(),
            _ => self.to_string(),
        };
        let fields = match &self {
            Self::InvalidCredentials(fields) => Some(fields),
            _ => None,
        };

        let body = ErrorBody {
            error: &message,
            fields,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Set the Sentry user context from an admin ID.
pub fn set_sentry_user(admin_id: i32) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Category not found".to_string());
        assert_eq!(err.to_string(), "Category not found");

        let err = AppError::Validation("Title is required".to_string());
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::PayloadTooLarge),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).map(|v| v.as_bytes()),
            Some(b"/login".as_slice())
        );
    }

    #[test]
    fn test_category_error_mapping() {
        assert!(matches!(
            AppError::from(CategoryError::InUse),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(CategoryError::NotFound),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());
        errors.add("password", "too short");
        errors.add("password", "missing digit");
        assert_eq!(errors.get("password"), Some("too short"));
        assert_eq!(errors.to_string(), "invalid fields: password");
    }
}

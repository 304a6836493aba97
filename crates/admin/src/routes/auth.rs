//! Authentication route handlers for admin.
//!
//! Password login with two cookie flavours: a persistent database token when
//! "remember me" is ticked, an encrypted session payload otherwise.

use askama::Template;
use axum::{
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use super::render;
use crate::error::{AppError, FieldErrors, clear_sentry_user, set_sentry_user};
use crate::middleware::{LoginForm, auth_cookie_header, clear_auth_cookie_header};
use crate::models::AuthCookie;
use crate::routing::AdminRequest;
use crate::services::AuthOutcome;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate<'a> {
    username: &'a str,
    errors: &'a FieldErrors,
}

/// GET /login
pub async fn login_page(_state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    Ok(render_login(&req, &FieldErrors::new()).await)
}

/// Render the login form, echoing the submitted username.
pub async fn render_login(req: &AdminRequest, errors: &FieldErrors) -> Response {
    let form: LoginForm = if req.body().is_empty() {
        LoginForm::default()
    } else {
        req.form().await.unwrap_or_default()
    };

    render(&LoginTemplate {
        username: form.username.trim(),
        errors,
    })
    .unwrap_or_else(IntoResponse::into_response)
}

/// POST /login
#[instrument(skip_all)]
pub async fn login(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let form: LoginForm = req.form().await?;
    let auth = state.auth();

    let admin_id = match auth.authenticate(&form.username, &form.password).await? {
        AuthOutcome::Authenticated(admin_id) => admin_id,
        AuthOutcome::PasswordMismatch | AuthOutcome::UnknownUser => {
            let mut errors = FieldErrors::new();
            errors.add("form", BAD_CREDENTIALS);
            return Err(AppError::InvalidCredentials(errors));
        }
    };

    let cookie = if form.remember_me() {
        auth.create_auth_token(admin_id).await?.cookie()
    } else {
        AuthCookie::SessionPayload(auth.create_session_payload(admin_id)?)
    };

    set_sentry_user(admin_id.as_i32());
    tracing::info!(admin_id = %admin_id, remember = cookie.is_persistent(), "Admin logged in");

    let mut response = Redirect::to("/admin").into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, auth_cookie_header(&cookie, req.is_secure())?);
    Ok(response)
}

/// GET /logout
pub async fn logout(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    if let Some(AuthCookie::DbToken { selector, .. }) = req.auth_cookie() {
        state.auth().revoke_auth_token(&selector).await?;
    }
    clear_sentry_user();

    let mut response = Redirect::to("/login").into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, clear_auth_cookie_header(req.is_secure())?);
    Ok(response)
}

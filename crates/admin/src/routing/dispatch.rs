//! Fallback handler that routes every admin request through the table.

use axum::{
    Json,
    body::to_bytes,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

use super::AdminRequest;
use crate::error::AppError;
use crate::middleware::{Verdict, clear_auth_cookie_header, run_guards};
use crate::routes::auth::render_login;
use crate::state::AppState;

/// Match the request against the route table, run the route's guards and
/// invoke its handler.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let Some(matched) = state.routes().find(&parts.method, parts.uri.path()) else {
        tracing::debug!(method = %parts.method, path = %parts.uri.path(), "No route matched");
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response();
    };
    let guards = matched.route.guards();
    let handler = matched.route.handler();
    let params = matched.params;

    let Ok(body) = to_bytes(body, state.config().max_body_bytes).await else {
        return AppError::PayloadTooLarge.into_response();
    };

    let secure = state.config().serves_https() || forwarded_https(&parts.headers);
    let mut req = AdminRequest::new(parts, body, secure);
    req.set_params(params);

    match run_guards(guards, &state, &mut req).await {
        Ok(Verdict::Allow) => {}
        Ok(Verdict::Redirect { to, clear_cookie }) => {
            return redirect(to, clear_cookie.then_some(secure));
        }
        Ok(Verdict::InvalidCredentials(errors)) => return render_login(&req, &errors).await,
        Err(e) => return e.into_response(),
    }

    match handler(state, req.clone()).await {
        Ok(response) => response,
        Err(AppError::InvalidCredentials(errors)) => render_login(&req, &errors).await,
        Err(AppError::Unauthorized) => redirect("/login", None),
        Err(e) => e.into_response(),
    }
}

/// 303 redirect, optionally clearing the auth cookie.
fn redirect(to: &str, clear_cookie_secure: Option<bool>) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Some(secure) = clear_cookie_secure {
        match clear_auth_cookie_header(secure) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => return e.into_response(),
        }
    }
    response
}

fn forwarded_https(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_https() {
        let mut headers = HeaderMap::new();
        assert!(!forwarded_https(&headers));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("HTTPS"));
        assert!(forwarded_https(&headers));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        assert!(!forwarded_https(&headers));
    }

    #[test]
    fn test_redirect_clears_cookie() {
        let response = redirect("/login", Some(false));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(response.headers().contains_key(header::SET_COOKIE));

        let response = redirect("/admin", None);
        assert!(!response.headers().contains_key(header::SET_COOKIE));
    }
}

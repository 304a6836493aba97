//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check (axum route)
//! GET    /health/ready              - Readiness check (axum route)
//! GET    /static/*                  - Static assets (axum route)
//! GET    /uploads/*                 - Product images (axum route)
//!
//! # Everything below goes through the dispatcher
//!
//! # Pages
//! GET    /                          - Landing page
//! GET    /admin                     - Dashboard shell            [authorize]
//!
//! # Auth
//! GET    /login                     - Login form                 [already_logged_in]
//! POST   /login                     - Log in                     [validate, already_logged_in]
//! GET    /logout                    - Log out
//!
//! # API                                                          [authorize]
//! GET    /api/dashboard             - Catalog counters
//! GET    /api/categories            - Category list
//! POST   /api/createCategory        - Create category
//! PUT    /api/update/{id}           - Update category
//! DELETE /api/delete/{id}           - Delete category and descendants
//! GET    /api/products              - Product list
//! GET    /api/products/{id}         - Product detail
//! POST   /api/createProduct         - Create product (multipart)
//! PUT    /api/updateProduct/{id}    - Update product (multipart)
//! POST   /api/products/delete       - Batch delete
//! POST   /api/products/enable       - Batch enable
//! POST   /api/products/disable      - Batch disable
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod pages;
pub mod products;

use askama::Template;
use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::services::ServeDir;

use crate::error::AppError;
use crate::handler;
use crate::middleware::{Guard, with_security_headers};
use crate::routing::{RouteError, RouteTable, dispatch};
use crate::state::AppState;

const AUTHORIZE: &[Guard] = &[Guard::Authorize];

/// Build the dispatcher's route table.
///
/// # Errors
///
/// Returns `RouteError` if a pattern fails to compile or is registered twice.
pub fn route_table() -> Result<RouteTable, RouteError> {
    let mut table = RouteTable::new();
    table
        // Pages
        .add(Method::GET, "/", &[], handler!(pages::index))?
        .add(Method::GET, "/admin", AUTHORIZE, handler!(pages::dashboard))?
        // Auth
        .add(
            Method::GET,
            "/login",
            &[Guard::AlreadyLoggedIn],
            handler!(auth::login_page),
        )?
        .add(
            Method::POST,
            "/login",
            &[Guard::ValidateCredentials, Guard::AlreadyLoggedIn],
            handler!(auth::login),
        )?
        .add(Method::GET, "/logout", &[], handler!(auth::logout))?
        // Dashboard
        .add(Method::GET, "/api/dashboard", AUTHORIZE, handler!(dashboard::stats))?
        // Categories
        .add(Method::GET, "/api/categories", AUTHORIZE, handler!(categories::index))?
        .add(
            Method::POST,
            "/api/createCategory",
            AUTHORIZE,
            handler!(categories::create),
        )?
        .add(Method::PUT, "/api/update/{id}", AUTHORIZE, handler!(categories::update))?
        .add(
            Method::DELETE,
            "/api/delete/{id}",
            AUTHORIZE,
            handler!(categories::delete),
        )?
        // Products
        .add(Method::GET, "/api/products", AUTHORIZE, handler!(products::index))?
        .add(
            Method::POST,
            "/api/products/delete",
            AUTHORIZE,
            handler!(products::delete_many),
        )?
        .add(
            Method::POST,
            "/api/products/enable",
            AUTHORIZE,
            handler!(products::enable),
        )?
        .add(
            Method::POST,
            "/api/products/disable",
            AUTHORIZE,
            handler!(products::disable),
        )?
        .add(Method::GET, "/api/products/{id}", AUTHORIZE, handler!(products::show))?
        .add(
            Method::POST,
            "/api/createProduct",
            AUTHORIZE,
            handler!(products::create),
        )?
        .add(
            Method::PUT,
            "/api/updateProduct/{id}",
            AUTHORIZE,
            handler!(products::update),
        )?;
    Ok(table)
}

/// Build the axum router: health checks and static files as plain routes,
/// everything else through the dispatcher.
pub fn app(state: AppState) -> Router {
    let max_body_bytes = state.config().max_body_bytes;
    let uploads = ServeDir::new(state.config().upload_dir.clone());

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest_service("/static", ServeDir::new("crates/admin/static"))
        .nest_service("/uploads", uploads)
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(max_body_bytes));

    with_security_headers(router).with_state(state)
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// GET /health/ready
async fn ready(State(state): State<AppState>) -> Response {
    match state.stores().categories.count_categories().await {
        Ok(_) => (StatusCode::OK, "ready").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
        }
    }
}

/// Render an askama template as HTML.
pub(crate) fn render<T: Template>(template: &T) -> Result<Response, AppError> {
    template
        .render()
        .map(|html| Html(html).into_response())
        .map_err(|e| AppError::Internal(format!("template error: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::tests::test_config;
    use crate::db::Stores;

    #[test]
    fn test_route_table_guards() {
        let table = route_table().unwrap();

        let open = [(Method::GET, "/"), (Method::GET, "/logout")];
        for route in table.routes() {
            let key = (route.method().clone(), route.pattern());
            if open.iter().any(|(m, p)| *m == key.0 && *p == key.1) {
                assert!(route.guards().is_empty(), "{route:?}");
            } else if route.pattern().starts_with("/api/") || route.pattern() == "/admin" {
                assert_eq!(route.guards(), AUTHORIZE, "{route:?}");
            }
        }

        let login = table.find(&Method::POST, "/login").unwrap();
        assert_eq!(
            login.route.guards(),
            &[Guard::ValidateCredentials, Guard::AlreadyLoggedIn]
        );
    }

    #[test]
    fn test_batch_paths_do_not_hit_product_detail() {
        let table = route_table().unwrap();
        let matched = table.find(&Method::POST, "/api/products/delete").unwrap();
        assert_eq!(matched.route.pattern(), "/api/products/delete");
        assert!(matched.params.is_empty());
    }

    #[tokio::test]
    async fn test_health_outside_dispatcher() {
        let state = AppState::new(test_config(), Stores::memory()).unwrap();
        let response = app(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

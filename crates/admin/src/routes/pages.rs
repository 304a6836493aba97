//! HTML page handlers.

use askama::Template;
use axum::response::Response;
use tracing::instrument;

use super::render;
use crate::error::AppError;
use crate::routing::AdminRequest;
use crate::state::AppState;

/// Landing page template.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

/// Dashboard shell. Catalog data is loaded by `static/admin.js` from the API.
#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    admin_id: i32,
}

/// GET /
pub async fn index(_state: AppState, _req: AdminRequest) -> Result<Response, AppError> {
    render(&IndexTemplate)
}

/// GET /admin
#[instrument(skip_all)]
pub async fn dashboard(_state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let admin_id = req.require_admin()?;
    render(&DashboardTemplate {
        admin_id: admin_id.as_i32(),
    })
}

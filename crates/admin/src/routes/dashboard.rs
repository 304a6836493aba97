//! Dashboard counters.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AppError;
use crate::routing::AdminRequest;
use crate::state::AppState;

/// GET /api/dashboard
pub async fn stats(state: AppState, _req: AdminRequest) -> Result<Response, AppError> {
    let categories = state.stores().categories.count_categories().await?;
    let stats = state.products().stats().await?;

    Ok(Json(json!({
        "categories": categories,
        "products": stats.products,
        "enabled_products": stats.enabled_products,
        "featured_products": stats.featured_products,
    }))
    .into_response())
}

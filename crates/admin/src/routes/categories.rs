//! Category API handlers.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use storekeep_core::CategoryId;

use crate::error::AppError;
use crate::models::CategoryInput;
use crate::routing::AdminRequest;
use crate::state::AppState;

/// GET /api/categories
pub async fn index(state: AppState, _req: AdminRequest) -> Result<Response, AppError> {
    let categories = state.categories().list().await?;
    Ok(Json(json!({ "categories": categories })).into_response())
}

/// POST /api/createCategory
#[instrument(skip_all)]
pub async fn create(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let input: CategoryInput = read_body(&req).await?;
    let category = state.categories().create(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Category created", "category": category })),
    )
        .into_response())
}

/// PUT /api/update/{id}
#[instrument(skip_all, fields(id = req.param("id")))]
pub async fn update(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let id = category_id(&req)?;
    let input: CategoryInput = read_body(&req).await?;
    let category = state.categories().update(id, &input).await?;

    Ok(Json(json!({ "message": "Category updated", "category": category })).into_response())
}

/// DELETE /api/delete/{id}
#[instrument(skip_all, fields(id = req.param("id")))]
pub async fn delete(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let id = category_id(&req)?;
    let deleted = state.categories().delete(id).await?;

    Ok(Json(json!({ "message": "Category deleted", "deleted": deleted })).into_response())
}

fn category_id(req: &AdminRequest) -> Result<CategoryId, AppError> {
    req.param("id")
        .and_then(CategoryId::parse_positive)
        .ok_or_else(|| AppError::Validation("Invalid category id".to_string()))
}

/// Read a JSON body, or a URL-encoded form when the client sent one.
pub(crate) async fn read_body<T: DeserializeOwned>(req: &AdminRequest) -> Result<T, AppError> {
    let is_form = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form { req.form().await } else { req.json() }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;
    use std::collections::HashMap;

    fn request(content_type: &str, body: &str) -> AdminRequest {
        let (parts, ()) = Request::builder()
            .method("PUT")
            .uri("/api/update/x")
            .header("content-type", content_type)
            .body(())
            .unwrap()
            .into_parts();
        AdminRequest::new(parts, Bytes::from(body.to_string()), false)
    }

    #[tokio::test]
    async fn test_read_body_json_and_form() {
        let json: CategoryInput = read_body(&request("application/json", r#"{"title":"Tea"}"#))
            .await
            .unwrap();
        assert_eq!(json.title.as_deref(), Some("Tea"));

        let form: CategoryInput = read_body(&request(
            "application/x-www-form-urlencoded",
            "title=Green+Tea&code=GT",
        ))
        .await
        .unwrap();
        assert_eq!(form.title.as_deref(), Some("Green Tea"));
        assert_eq!(form.code.as_deref(), Some("GT"));
    }

    #[test]
    fn test_category_id_must_be_positive() {
        let mut req = request("application/json", "");
        for bad in ["abc", "0", "-3"] {
            req.set_params(HashMap::from([("id".to_string(), bad.to_string())]));
            assert!(matches!(category_id(&req), Err(AppError::Validation(_))));
        }
        req.set_params(HashMap::from([("id".to_string(), "7".to_string())]));
        assert_eq!(category_id(&req).unwrap(), CategoryId::new(7));
    }
}

//! Product API handlers.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::instrument;

use storekeep_core::ProductId;

use crate::error::AppError;
use crate::routing::AdminRequest;
use crate::services::{ImageUpload, ProductForm, parse_ids};
use crate::state::AppState;

/// Multipart field carrying the product image.
const IMAGE_FIELD: &str = "image";

/// GET /api/products
pub async fn index(state: AppState, _req: AdminRequest) -> Result<Response, AppError> {
    let products = state.products().list().await?;
    Ok(Json(json!({ "products": products })).into_response())
}

/// GET /api/products/{id}
pub async fn show(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let product = state.products().get(product_id(&req)?).await?;
    Ok(Json(json!({ "product": product })).into_response())
}

/// POST /api/createProduct
#[instrument(skip_all)]
pub async fn create(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let form = read_product_form(&req).await?;
    let product = state.products().create(&form).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product created", "product": product })),
    )
        .into_response())
}

/// PUT /api/updateProduct/{id}
#[instrument(skip_all, fields(id = req.param("id")))]
pub async fn update(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let id = product_id(&req)?;
    let form = read_product_form(&req).await?;
    let product = state.products().update(id, &form).await?;

    Ok(Json(json!({ "message": "Product updated", "product": product })).into_response())
}

/// POST /api/products/delete
#[instrument(skip_all)]
pub async fn delete_many(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    let ids = batch_ids(&req)?;
    let deleted = state.products().delete_many(&ids).await?;

    Ok(Json(json!({ "message": "Products deleted", "deleted": deleted })).into_response())
}

/// POST /api/products/enable
pub async fn enable(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    toggle(&state, &req, true).await
}

/// POST /api/products/disable
pub async fn disable(state: AppState, req: AdminRequest) -> Result<Response, AppError> {
    toggle(&state, &req, false).await
}

#[instrument(skip(state, req))]
async fn toggle(state: &AppState, req: &AdminRequest, enabled: bool) -> Result<Response, AppError> {
    let ids = batch_ids(req)?;
    let updated = state.products().set_enabled(&ids, enabled).await?;
    let message = if enabled {
        "Products enabled"
    } else {
        "Products disabled"
    };

    Ok(Json(json!({ "message": message, "updated": updated })).into_response())
}

fn product_id(req: &AdminRequest) -> Result<ProductId, AppError> {
    req.param("id")
        .and_then(ProductId::parse_positive)
        .ok_or_else(|| AppError::Validation("Invalid product id".to_string()))
}

fn batch_ids(req: &AdminRequest) -> Result<Vec<ProductId>, AppError> {
    let body: Value = req.json()?;
    Ok(parse_ids(body.get("ids"))?)
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(e.body_text())
}

/// Collect the multipart fields of a product form. An empty file part
/// counts as no image.
async fn read_product_form(req: &AdminRequest) -> Result<ProductForm, AppError> {
    let mut multipart = req.multipart().await?;
    let mut form = ProductForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if !bytes.is_empty() {
                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.set_field(&name, value);
        }
    }

    Ok(form)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_request(parts: &[(&str, Option<(&str, &str)>, &str)]) -> AdminRequest {
        let mut body = Vec::new();
        for (name, file, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((file_name, content_type)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let (parts, ()) = Request::builder()
            .method("POST")
            .uri("/api/createProduct")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(())
            .unwrap()
            .into_parts();
        AdminRequest::new(parts, Bytes::from(body), false)
    }

    #[tokio::test]
    async fn test_read_product_form() {
        let req = multipart_request(&[
            ("sku", None, "TEA-1"),
            ("price", None, "4.50"),
            ("is_featured", None, "on"),
            ("image", Some(("leaf.png", "image/png")), "not really a png"),
        ]);
        let form = read_product_form(&req).await.unwrap();
        assert_eq!(form.sku.as_deref(), Some("TEA-1"));
        assert_eq!(form.price.as_deref(), Some("4.50"));
        assert_eq!(form.is_featured, Some(true));
        let image = form.image.unwrap();
        assert_eq!(image.file_name.as_deref(), Some("leaf.png"));
        assert_eq!(image.content_type.as_deref(), Some("image/png"));
        assert_eq!(&image.bytes[..], b"not really a png");
    }

    #[tokio::test]
    async fn test_empty_file_part_is_no_image() {
        let req = multipart_request(&[
            ("title", None, "Sencha"),
            ("image", Some(("", "application/octet-stream")), ""),
        ]);
        let form = read_product_form(&req).await.unwrap();
        assert_eq!(form.title.as_deref(), Some("Sencha"));
        assert!(form.image.is_none());
    }

    #[tokio::test]
    async fn test_non_multipart_body_rejected() {
        let (parts, ()) = Request::builder()
            .method("POST")
            .uri("/api/createProduct")
            .header("content-type", "application/json")
            .body(())
            .unwrap()
            .into_parts();
        let req = AdminRequest::new(parts, Bytes::from_static(b"{}"), false);
        assert!(matches!(
            read_product_form(&req).await,
            Err(AppError::Validation(_))
        ));
    }
}

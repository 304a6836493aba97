//! Product catalog service.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use storekeep_core::{CategoryId, Price, PriceError, ProductId};

use crate::db::{RepositoryError, Stores};
use crate::models::{NewProduct, Product, ProductListing, ProductStats};
use crate::services::uploads::{ImageUpload, ImageUploader, UploadError};

/// Errors from product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("product not found")]
    NotFound,

    /// Writing or removing an image file failed.
    #[error("image storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

const DUPLICATE_SKU: &str = "A product with this SKU already exists";
const BAD_IDS: &str = "ids must be a non-empty list of positive integers";

/// Raw product fields from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub sku: Option<String>,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub category_id: Option<String>,
    pub price: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub is_enabled: Option<bool>,
    pub is_featured: Option<bool>,
    pub image: Option<ImageUpload>,
}

impl ProductForm {
    /// Set a text field by its form name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "sku" => self.sku = Some(value),
            "title" => self.title = Some(value),
            "brand" => self.brand = Some(value),
            "category_id" => self.category_id = Some(value),
            "price" => self.price = Some(value),
            "short_description" => self.short_description = Some(value),
            "description" => self.description = Some(value),
            "is_enabled" => self.is_enabled = Some(parse_flag(&value)),
            "is_featured" => self.is_featured = Some(parse_flag(&value)),
            _ => {}
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Product catalog service.
pub struct ProductService<'a> {
    stores: &'a Stores,
    uploader: &'a ImageUploader,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(stores: &'a Stores, uploader: &'a ImageUploader) -> Self {
        Self { stores, uploader }
    }

    /// All products with their category titles.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if a query fails.
    pub async fn list(&self) -> Result<Vec<ProductListing>, ProductError> {
        let titles: HashMap<CategoryId, String> = self
            .stores
            .categories
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.title))
            .collect();

        let products = self.stores.products.list_products().await?;
        Ok(products
            .into_iter()
            .map(|product| ProductListing {
                category_title: titles.get(&product.category_id).cloned(),
                product,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `ProductError::NotFound` for an unknown id.
    pub async fn get(&self, id: ProductId) -> Result<Product, ProductError> {
        self.stores
            .products
            .get_product(id)
            .await?
            .ok_or(ProductError::NotFound)
    }

    /// Dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the query fails.
    pub async fn stats(&self) -> Result<ProductStats, ProductError> {
        Ok(self.stores.products.product_stats().await?)
    }

    /// Create a product, storing its image if one was uploaded.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` or `ProductError::Upload` for bad
    /// input. No file is left behind when creation fails.
    #[instrument(skip_all)]
    pub async fn create(&self, form: &ProductForm) -> Result<Product, ProductError> {
        let mut product = self.validate(form, None).await?;
        let stored = self.store_image(form).await?;
        product.image_path.clone_from(&stored);

        match self.stores.products.insert_product(&product).await {
            Ok(created) => {
                tracing::info!(product_id = %created.id, sku = %created.sku, "Created product");
                Ok(created)
            }
            Err(e) => {
                if let Some(name) = &stored {
                    self.uploader.remove(name).await;
                }
                Err(sku_conflict(e))
            }
        }
    }

    /// Update a product, replacing its image if a new one was uploaded.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` for an unknown id, and validation or
    /// upload errors for bad input.
    #[instrument(skip(self, form))]
    pub async fn update(&self, id: ProductId, form: &ProductForm) -> Result<Product, ProductError> {
        let existing = self.get(id).await?;
        let mut product = self.validate(form, Some(&existing)).await?;
        let stored = self.store_image(form).await?;
        product.image_path = stored.clone().or_else(|| existing.image_path.clone());

        match self.stores.products.update_product(id, &product).await {
            Ok(updated) => {
                if stored.is_some()
                    && let Some(old) = &existing.image_path
                {
                    self.uploader.remove(old).await;
                }
                tracing::info!(product_id = %id, "Updated product");
                Ok(updated)
            }
            Err(e) => {
                if let Some(name) = &stored {
                    self.uploader.remove(name).await;
                }
                Err(match e {
                    RepositoryError::NotFound => ProductError::NotFound,
                    other => sku_conflict(other),
                })
            }
        }
    }

    /// Delete products and their image files. Returns the ids removed.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_many(&self, ids: &[ProductId]) -> Result<Vec<ProductId>, ProductError> {
        let deleted = self.stores.products.delete_products(ids).await?;
        for product in &deleted {
            if let Some(name) = &product.image_path {
                self.uploader.remove(name).await;
            }
        }

        tracing::info!(requested = ids.len(), deleted = deleted.len(), "Deleted products");
        Ok(deleted.into_iter().map(|p| p.id).collect())
    }

    /// Enable or disable products. Returns the number updated.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the update fails.
    #[instrument(skip(self))]
    pub async fn set_enabled(&self, ids: &[ProductId], enabled: bool) -> Result<u64, ProductError> {
        let updated = self
            .stores
            .products
            .set_products_enabled(ids, enabled)
            .await?;
        tracing::info!(updated, enabled, "Toggled products");
        Ok(updated)
    }

    async fn store_image(&self, form: &ProductForm) -> Result<Option<String>, ProductError> {
        let Some(upload) = form.image.as_ref().filter(|u| !u.bytes.is_empty()) else {
            return Ok(None);
        };
        let image = self.uploader.validate(upload)?;
        Ok(Some(self.uploader.store(&image).await?))
    }

    async fn validate(
        &self,
        form: &ProductForm,
        existing: Option<&Product>,
    ) -> Result<NewProduct, ProductError> {
        let sku = required(form.sku.as_deref(), "SKU")?;
        let title = required(form.title.as_deref(), "Title")?;
        let brand = required(form.brand.as_deref(), "Brand")?;

        let price = required(form.price.as_deref(), "Price")?
            .parse::<Price>()
            .map_err(|e| {
                ProductError::Validation(match e {
                    PriceError::NotANumber => "Price must be a number".to_string(),
                    PriceError::Negative => "Price must not be negative".to_string(),
                })
            })?;

        let category_id = CategoryId::parse_positive(&required(
            form.category_id.as_deref(),
            "Category",
        )?)
        .ok_or_else(|| ProductError::Validation("Category is invalid".to_string()))?;
        if self
            .stores
            .categories
            .get_category(category_id)
            .await?
            .is_none()
        {
            return Err(ProductError::Validation(
                "Category does not exist".to_string(),
            ));
        }

        if let Some(other) = self.stores.products.find_product_by_sku(&sku).await?
            && existing.is_none_or(|p| p.id != other.id)
        {
            return Err(ProductError::Validation(DUPLICATE_SKU.to_string()));
        }

        Ok(NewProduct {
            sku,
            title,
            brand,
            category_id,
            price,
            short_description: optional(
                form.short_description.as_deref(),
                existing.map(|p| p.short_description.as_str()),
            ),
            description: optional(
                form.description.as_deref(),
                existing.map(|p| p.description.as_str()),
            ),
            image_path: None,
            is_enabled: form
                .is_enabled
                .unwrap_or_else(|| existing.is_none_or(|p| p.is_enabled)),
            is_featured: form
                .is_featured
                .unwrap_or_else(|| existing.is_some_and(|p| p.is_featured)),
        })
    }
}

fn required(value: Option<&str>, label: &str) -> Result<String, ProductError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ProductError::Validation(format!("{label} is required"))),
    }
}

/// A sent value replaces the stored one, even when blank.
fn optional(value: Option<&str>, stored: Option<&str>) -> String {
    value.or(stored).unwrap_or_default().trim().to_string()
}

fn sku_conflict(err: RepositoryError) -> ProductError {
    match err {
        RepositoryError::Conflict(_) => ProductError::Validation(DUPLICATE_SKU.to_string()),
        other => ProductError::Repository(other),
    }
}

/// Parse the `ids` of a batch request.
///
/// Accepts integers and numeric strings. Every id must be positive and the
/// list non-empty; duplicates are dropped.
///
/// # Errors
///
/// Returns `ProductError::Validation` for anything else.
pub fn parse_ids(value: Option<&Value>) -> Result<Vec<ProductId>, ProductError> {
    let invalid = || ProductError::Validation(BAD_IDS.to_string());
    let items = value.and_then(Value::as_array).ok_or_else(invalid)?;
    if items.is_empty() {
        return Err(invalid());
    }

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = match item {
            Value::Number(n) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .filter(|n| *n > 0)
                .map(ProductId::new),
            Value::String(s) => ProductId::parse_positive(s),
            _ => None,
        }
        .ok_or_else(invalid)?;

        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

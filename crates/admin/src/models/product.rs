//! Product catalog types.

use serde::Serialize;

use storekeep_core::{CategoryId, Price, ProductId};

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub title: String,
    pub brand: String,
    pub category_id: CategoryId,
    pub price: Price,
    pub short_description: String,
    pub description: String,
    /// File name inside the upload directory.
    pub image_path: Option<String>,
    pub is_enabled: bool,
    pub is_featured: bool,
}

/// Validated product fields, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub sku: String,
    pub title: String,
    pub brand: String,
    pub category_id: CategoryId,
    pub price: Price,
    pub short_description: String,
    pub description: String,
    pub image_path: Option<String>,
    pub is_enabled: bool,
    pub is_featured: bool,
}

impl NewProduct {
    /// Materialize as a product with the given id.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            sku: self.sku,
            title: self.title,
            brand: self.brand,
            category_id: self.category_id,
            price: self.price,
            short_description: self.short_description,
            description: self.description,
            image_path: self.image_path,
            is_enabled: self.is_enabled,
            is_featured: self.is_featured,
        }
    }
}

/// A product annotated with its category title for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub category_title: Option<String>,
}

/// Product counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProductStats {
    pub products: i64,
    pub enabled_products: i64,
    pub featured_products: i64,
}

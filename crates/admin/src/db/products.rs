//! Product queries for [`PgStore`].

use async_trait::async_trait;
use rust_decimal::Decimal;

use storekeep_core::{CategoryId, Price, ProductId};

use super::{PgStore, ProductStore, RepositoryError, map_constraint_error};
use crate::models::{NewProduct, Product, ProductStats};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    sku: String,
    title: String,
    brand: String,
    category_id: i32,
    price: Decimal,
    short_description: String,
    description: String,
    image_path: Option<String>,
    is_enabled: bool,
    is_featured: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            sku: row.sku,
            title: row.title,
            brand: row.brand,
            category_id: CategoryId::new(row.category_id),
            price,
            short_description: row.short_description,
            description: row.description,
            image_path: row.image_path,
            is_enabled: row.is_enabled,
            is_featured: row.is_featured,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    products: i64,
    enabled_products: i64,
    featured_products: i64,
}

const COLUMNS: &str = "id, sku, title, brand, category_id, price, short_description, \
                       description, image_path, is_enabled, is_featured";

fn id_values<T: Copy + Into<i32>>(ids: &[T]) -> Vec<i32> {
    ids.iter().map(|&id| id.into()).collect()
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM catalog.product ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM catalog.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM catalog.product WHERE sku = $1"
        ))
        .bind(sku)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO catalog.product
                (sku, title, brand, category_id, price, short_description,
                 description, image_path, is_enabled, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "
        ))
        .bind(&product.sku)
        .bind(&product.title)
        .bind(&product.brand)
        .bind(product.category_id)
        .bind(product.price.amount())
        .bind(&product.short_description)
        .bind(&product.description)
        .bind(product.image_path.as_deref())
        .bind(product.is_enabled)
        .bind(product.is_featured)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint_error(e, "product"))?;

        row.try_into()
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE catalog.product
            SET sku = $2, title = $3, brand = $4, category_id = $5, price = $6,
                short_description = $7, description = $8, image_path = $9,
                is_enabled = $10, is_featured = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .bind(&product.sku)
        .bind(&product.title)
        .bind(&product.brand)
        .bind(product.category_id)
        .bind(product.price.amount())
        .bind(&product.short_description)
        .bind(&product.description)
        .bind(product.image_path.as_deref())
        .bind(product.is_enabled)
        .bind(product.is_featured)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_constraint_error(e, "product"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn delete_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM catalog.product WHERE id = ANY($1) RETURNING {COLUMNS}"
        ))
        .bind(id_values(ids))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn set_products_enabled(
        &self,
        ids: &[ProductId],
        enabled: bool,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.product
            SET is_enabled = $2, updated_at = NOW()
            WHERE id = ANY($1)
            ",
        )
        .bind(id_values(ids))
        .bind(enabled)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn product_stats(&self) -> Result<ProductStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT COUNT(*) AS products,
                   COUNT(*) FILTER (WHERE is_enabled) AS enabled_products,
                   COUNT(*) FILTER (WHERE is_featured) AS featured_products
            FROM catalog.product
            ",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(ProductStats {
            products: row.products,
            enabled_products: row.enabled_products,
            featured_products: row.featured_products,
        })
    }

    async fn any_product_in_categories(
        &self,
        ids: &[CategoryId],
    ) -> Result<bool, RepositoryError> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM catalog.product WHERE category_id = ANY($1))",
        )
        .bind(id_values(ids))
        .fetch_one(self.pool())
        .await?;

        Ok(in_use)
    }
}

//! Persistence for the admin backend.
//!
//! # Schemas
//!
//! - `admin.admin_user` - Admin accounts (usernames encrypted at rest)
//! - `admin.auth_token` - Persistent "remember me" tokens
//! - `catalog.category` - Category tree, parent linked by title
//! - `catalog.product` - Products, each in exactly one category
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p storekeep-cli -- migrate
//! ```
//!
//! Services talk to the repository traits below, never to a concrete store.
//! [`PgStore`] backs production; [`MemoryStore`] backs tests and local runs
//! without a database.

pub mod admin_users;
pub mod auth_tokens;
pub mod categories;
pub mod memory;
pub mod products;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use storekeep_core::{AdminId, CategoryId, ProductId};

use crate::models::{
    AdminUser, AuthToken, Category, CategoryDraft, NewProduct, Product, ProductStats,
};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
pub(crate) fn map_constraint_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict(format!("{what} is referenced elsewhere"));
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Repository Traits
// =============================================================================

/// Admin account storage.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// All admins, oldest first.
    async fn list_admins(&self) -> Result<Vec<AdminUser>, RepositoryError>;

    async fn get_admin(&self, id: AdminId) -> Result<Option<AdminUser>, RepositoryError>;

    async fn create_admin(
        &self,
        username_ciphertext: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError>;
}

/// Persistent login token storage.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_token(
        &self,
        admin_id: AdminId,
        selector: &str,
        hashed_validator: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken, RepositoryError>;

    async fn find_token(&self, selector: &str) -> Result<Option<AuthToken>, RepositoryError>;

    /// Delete a token by selector. Returns whether a row was removed.
    async fn delete_token(&self, selector: &str) -> Result<bool, RepositoryError>;
}

/// Category tree storage.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories ordered by title.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// Case-insensitive title lookup.
    async fn find_category_by_title(
        &self,
        title: &str,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Case-insensitive code lookup.
    async fn find_category_by_code(&self, code: &str)
    -> Result<Option<Category>, RepositoryError>;

    async fn count_categories(&self) -> Result<i64, RepositoryError>;

    async fn insert_category(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError>;

    /// Overwrite a category. When `rename_from` is set, every row whose parent
    /// is that old title is repointed at the new title in the same unit of work.
    ///
    /// Returns `RepositoryError::NotFound` if `id` does not exist.
    async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
        rename_from: Option<&str>,
    ) -> Result<Category, RepositoryError>;

    /// Delete the given categories atomically, in the order given.
    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<u64, RepositoryError>;
}

/// Product catalog storage.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError>;

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Returns `RepositoryError::NotFound` if `id` does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError>;

    /// Delete products, returning the rows that were removed.
    async fn delete_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Set `is_enabled` on the given products. Returns the number updated.
    async fn set_products_enabled(
        &self,
        ids: &[ProductId],
        enabled: bool,
    ) -> Result<u64, RepositoryError>;

    async fn product_stats(&self) -> Result<ProductStats, RepositoryError>;

    /// Whether any product belongs to one of the given categories.
    async fn any_product_in_categories(
        &self,
        ids: &[CategoryId],
    ) -> Result<bool, RepositoryError>;
}

// =============================================================================
// Store Bundle
// =============================================================================

/// `PostgreSQL`-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Handles to every repository, shared by the application state.
#[derive(Clone)]
pub struct Stores {
    pub admins: Arc<dyn AdminStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub products: Arc<dyn ProductStore>,
}

impl Stores {
    /// All repositories backed by one `PostgreSQL` pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_shared(Arc::new(PgStore::new(pool)))
    }

    /// All repositories backed by one fresh in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::from_shared(Arc::new(MemoryStore::new()))
    }

    /// All repositories backed by the same store instance.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: AdminStore + TokenStore + CategoryStore + ProductStore + 'static,
    {
        Self {
            admins: store.clone(),
            tokens: store.clone(),
            categories: store.clone(),
            products: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

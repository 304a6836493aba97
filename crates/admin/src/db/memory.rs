//! In-memory store for tests and database-free local runs.
//!
//! Implements every repository trait over plain vectors behind one
//! `parking_lot::RwLock`, so multi-row operations (rename cascade, subtree
//! delete) happen under a single write lock. Uniqueness rules mirror the
//! `PostgreSQL` indexes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use storekeep_core::{AdminId, AuthTokenId, CategoryId, ProductId};

use super::{AdminStore, CategoryStore, ProductStore, RepositoryError, TokenStore};
use crate::models::{
    AdminUser, AuthToken, Category, CategoryDraft, NewProduct, Product, ProductStats,
};

#[derive(Default)]
struct Tables {
    admins: Vec<AdminUser>,
    tokens: Vec<AuthToken>,
    categories: Vec<Category>,
    products: Vec<Product>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn category_conflict(&self, draft: &CategoryDraft, except: Option<CategoryId>) -> bool {
        self.categories
            .iter()
            .filter(|c| Some(c.id) != except)
            .any(|c| c.has_title(&draft.title) || draft.code.eq_ignore_case(c.code.as_str()))
    }

    fn sku_conflict(&self, sku: &str, except: Option<ProductId>) -> bool {
        self.products
            .iter()
            .any(|p| p.sku == sku && Some(p.id) != except)
    }
}

/// In-memory implementation of every repository trait.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn list_admins(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        Ok(self.tables.read().admins.clone())
    }

    async fn get_admin(&self, id: AdminId) -> Result<Option<AdminUser>, RepositoryError> {
        Ok(self.tables.read().admins.iter().find(|a| a.id == id).cloned())
    }

    async fn create_admin(
        &self,
        username_ciphertext: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let mut tables = self.tables.write();
        let admin = AdminUser {
            id: AdminId::new(tables.next_id()),
            username_ciphertext: username_ciphertext.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.admins.push(admin.clone());
        Ok(admin)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(
        &self,
        admin_id: AdminId,
        selector: &str,
        hashed_validator: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.tokens.iter().any(|t| t.selector == selector) {
            return Err(RepositoryError::Conflict(
                "auth token already exists".to_string(),
            ));
        }
        let token = AuthToken {
            id: AuthTokenId::new(tables.next_id()),
            admin_id,
            selector: selector.to_string(),
            hashed_validator: hashed_validator.to_string(),
            expires_at,
        };
        tables.tokens.push(token.clone());
        Ok(token)
    }

    async fn find_token(&self, selector: &str) -> Result<Option<AuthToken>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .tokens
            .iter()
            .find(|t| t.selector == selector)
            .cloned())
    }

    async fn delete_token(&self, selector: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write();
        let before = tables.tokens.len();
        tables.tokens.retain(|t| t.selector != selector);
        Ok(tables.tokens.len() < before)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.tables.read().categories.clone();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_category_by_title(
        &self,
        title: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .categories
            .iter()
            .find(|c| c.has_title(title))
            .cloned())
    }

    async fn find_category_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .categories
            .iter()
            .find(|c| c.code.eq_ignore_case(code))
            .cloned())
    }

    async fn count_categories(&self) -> Result<i64, RepositoryError> {
        Ok(i64::try_from(self.tables.read().categories.len()).unwrap_or(i64::MAX))
    }

    async fn insert_category(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.category_conflict(draft, None) {
            return Err(RepositoryError::Conflict("category already exists".to_string()));
        }
        let category = draft.clone().into_category(CategoryId::new(tables.next_id()));
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
        rename_from: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write();
        if !tables.categories.iter().any(|c| c.id == id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.category_conflict(draft, Some(id)) {
            return Err(RepositoryError::Conflict("category already exists".to_string()));
        }

        let updated = draft.clone().into_category(id);
        for category in &mut tables.categories {
            if category.id == id {
                *category = updated.clone();
            } else if let Some(old_title) = rename_from
                && category.is_child_of(old_title)
            {
                category.parent = Some(draft.title.clone());
            }
        }
        Ok(updated)
    }

    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.products.iter().any(|p| ids.contains(&p.category_id)) {
            return Err(RepositoryError::Conflict(
                "category is referenced elsewhere".to_string(),
            ));
        }
        let before = tables.categories.len();
        tables.categories.retain(|c| !ids.contains(&c.id));
        Ok(u64::try_from(before - tables.categories.len()).unwrap_or(0))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.tables.read().products.clone();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .products
            .iter()
            .find(|p| p.sku == sku)
            .cloned())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.sku_conflict(&product.sku, None) {
            return Err(RepositoryError::Conflict("product already exists".to_string()));
        }
        if !tables.categories.iter().any(|c| c.id == product.category_id) {
            return Err(RepositoryError::Conflict(
                "product is referenced elsewhere".to_string(),
            ));
        }
        let created = product.clone().into_product(ProductId::new(tables.next_id()));
        tables.products.push(created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.sku_conflict(&product.sku, Some(id)) {
            return Err(RepositoryError::Conflict("product already exists".to_string()));
        }
        let slot = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = product.clone().into_product(id);
        Ok(slot.clone())
    }

    async fn delete_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let mut tables = self.tables.write();
        let (deleted, kept): (Vec<_>, Vec<_>) = tables
            .products
            .drain(..)
            .partition(|p| ids.contains(&p.id));
        tables.products = kept;
        Ok(deleted)
    }

    async fn set_products_enabled(
        &self,
        ids: &[ProductId],
        enabled: bool,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write();
        let mut updated = 0;
        for product in tables.products.iter_mut().filter(|p| ids.contains(&p.id)) {
            product.is_enabled = enabled;
            updated += 1;
        }
        Ok(updated)
    }

    async fn product_stats(&self) -> Result<ProductStats, RepositoryError> {
        let tables = self.tables.read();
        let count = |f: fn(&Product) -> bool| {
            i64::try_from(tables.products.iter().filter(|p| f(p)).count()).unwrap_or(i64::MAX)
        };
        Ok(ProductStats {
            products: count(|_| true),
            enabled_products: count(|p| p.is_enabled),
            featured_products: count(|p| p.is_featured),
        })
    }

    async fn any_product_in_categories(
        &self,
        ids: &[CategoryId],
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .tables
            .read()
            .products
            .iter()
            .any(|p| ids.contains(&p.category_id)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use storekeep_core::CategoryCode;

    fn draft(title: &str, code: &str, parent: Option<&str>) -> CategoryDraft {
        CategoryDraft {
            title: title.to_string(),
            code: CategoryCode::parse(code).unwrap(),
            description: String::new(),
            parent: parent.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_case_insensitive_duplicates() {
        let store = MemoryStore::new();
        store.insert_category(&draft("Shoes", "SHO", None)).await.unwrap();

        let dup_title = store.insert_category(&draft("shoes", "XX", None)).await;
        assert!(matches!(dup_title, Err(RepositoryError::Conflict(_))));

        let dup_code = store.insert_category(&draft("Boots", "sho", None)).await;
        assert!(matches!(dup_code, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_rename_cascades_to_children() {
        let store = MemoryStore::new();
        let shoes = store.insert_category(&draft("Shoes", "SHO", None)).await.unwrap();
        store
            .insert_category(&draft("Boots", "BOO", Some("Shoes")))
            .await
            .unwrap();

        store
            .update_category(shoes.id, &draft("Footwear", "FOO", None), Some("Shoes"))
            .await
            .unwrap();

        let boots = store.find_category_by_title("Boots").await.unwrap().unwrap();
        assert_eq!(boots.parent.as_deref(), Some("Footwear"));
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let store = MemoryStore::new();
        let result = store
            .update_category(CategoryId::new(99), &draft("X", "X", None), None)
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_token_delete_reports_removal() {
        let store = MemoryStore::new();
        store
            .insert_token(AdminId::new(1), "sel", "hash", Utc::now())
            .await
            .unwrap();
        assert!(store.delete_token("sel").await.unwrap());
        assert!(!store.delete_token("sel").await.unwrap());
    }
}

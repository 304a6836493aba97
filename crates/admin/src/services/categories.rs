//! Category tree service.
//!
//! Categories reference their parent by title. This service keeps that tree
//! consistent:
//!
//! - titles and codes are unique, ignoring case
//! - a parent must exist and may not be the category itself or one of its
//!   descendants
//! - renaming a category repoints its children
//! - a subtree can only be deleted when no product uses any of it

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;
use tracing::instrument;

use storekeep_core::{CategoryCode, CategoryCodeError, CategoryId};

use crate::db::{RepositoryError, Stores};
use crate::models::{Category, CategoryDraft, CategoryInput};

/// Errors from category operations.
#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("{0}")]
    Validation(String),

    #[error("category not found")]
    NotFound,

    /// The category or a descendant is referenced by a product.
    #[error("category is in use")]
    InUse,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

const DUPLICATE: &str = "A category with this title or code already exists";

/// Category tree service.
pub struct CategoryService<'a> {
    stores: &'a Stores,
}

impl<'a> CategoryService<'a> {
    #[must_use]
    pub const fn new(stores: &'a Stores) -> Self {
        Self { stores }
    }

    /// All categories ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, CategoryError> {
        Ok(self.stores.categories.list_categories().await?)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Validation` for missing fields, duplicates, or
    /// an unknown parent. Nothing is written in that case.
    #[instrument(skip_all)]
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, CategoryError> {
        let mut draft = validate(input)?;
        let categories = self.stores.categories.as_ref();

        if categories.find_category_by_title(&draft.title).await?.is_some() {
            return Err(CategoryError::Validation(
                "A category with this title already exists".to_string(),
            ));
        }
        if categories
            .find_category_by_code(draft.code.as_str())
            .await?
            .is_some()
        {
            return Err(CategoryError::Validation(
                "A category with this code already exists".to_string(),
            ));
        }
        if let Some(parent) = &draft.parent {
            let parent = categories
                .find_category_by_title(parent)
                .await?
                .ok_or_else(|| {
                    CategoryError::Validation("Parent category does not exist".to_string())
                })?;
            draft.parent = Some(parent.title);
        }

        let category = categories
            .insert_category(&draft)
            .await
            .map_err(conflict_as_validation)?;

        tracing::info!(category_id = %category.id, title = %category.title, "Created category");
        Ok(category)
    }

    /// Update a category, cascading a title change to its children.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` for an unknown id and
    /// `CategoryError::Validation` when the change is empty, collides with
    /// another category, or would put the category under itself.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, CategoryError> {
        let categories = self.stores.categories.as_ref();
        let existing = categories
            .get_category(id)
            .await?
            .ok_or(CategoryError::NotFound)?;

        let mut draft = validate(input)?;
        if let Some(parent_title) = draft.parent.clone() {
            let all = categories.list_categories().await?;
            let tree = Tree::new(&all);
            let parent = tree.by_title(&parent_title).ok_or_else(|| {
                CategoryError::Validation("Parent category does not exist".to_string())
            })?;
            if parent.id == id {
                return Err(CategoryError::Validation(
                    "A category cannot be its own parent".to_string(),
                ));
            }
            if tree.has_ancestor(parent, id) {
                return Err(CategoryError::Validation(
                    "A category cannot be moved under one of its subcategories".to_string(),
                ));
            }
            draft.parent = Some(parent.title.clone());
        }

        if draft.is_unchanged_from(&existing) {
            return Err(CategoryError::Validation("No changes to save".to_string()));
        }

        if let Some(other) = categories.find_category_by_title(&draft.title).await?
            && other.id != id
        {
            return Err(CategoryError::Validation(
                "A category with this title already exists".to_string(),
            ));
        }
        if let Some(other) = categories.find_category_by_code(draft.code.as_str()).await?
            && other.id != id
        {
            return Err(CategoryError::Validation(
                "A category with this code already exists".to_string(),
            ));
        }

        let rename_from = (existing.title != draft.title).then_some(existing.title.as_str());
        let category = categories
            .update_category(id, &draft, rename_from)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CategoryError::NotFound,
                other => conflict_as_validation(other),
            })?;

        tracing::info!(
            category_id = %id,
            renamed = rename_from.is_some(),
            "Updated category"
        );
        Ok(category)
    }

    /// Delete a category and all of its descendants.
    ///
    /// Returns the ids removed, deepest first.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` for an unknown id and
    /// `CategoryError::InUse` if a product uses any category in the subtree.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<Vec<CategoryId>, CategoryError> {
        let categories = self.stores.categories.as_ref();
        let target = categories
            .get_category(id)
            .await?
            .ok_or(CategoryError::NotFound)?;

        let all = categories.list_categories().await?;
        let mut subtree = Tree::new(&all).subtree(&target);

        if self
            .stores
            .products
            .any_product_in_categories(&subtree)
            .await?
        {
            return Err(CategoryError::InUse);
        }

        subtree.reverse();
        categories
            .delete_categories(&subtree)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CategoryError::InUse,
                other => CategoryError::Repository(other),
            })?;

        tracing::info!(category_id = %id, removed = subtree.len(), "Deleted category subtree");
        Ok(subtree)
    }
}

/// Validate raw input into a draft. Blank parents mean "no parent".
fn validate(input: &CategoryInput) -> Result<CategoryDraft, CategoryError> {
    let title = input.title.as_deref().unwrap_or_default().trim();
    if title.is_empty() {
        return Err(CategoryError::Validation("Title is required".to_string()));
    }

    let code = CategoryCode::parse(input.code.as_deref().unwrap_or_default()).map_err(|e| {
        CategoryError::Validation(match e {
            CategoryCodeError::Empty => "Code is required".to_string(),
            CategoryCodeError::TooLong => "Code must be at most 4 characters".to_string(),
        })
    })?;

    let parent = input
        .parent
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    Ok(CategoryDraft {
        title: title.to_string(),
        code,
        description: input
            .description
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string(),
        parent,
    })
}

fn conflict_as_validation(err: RepositoryError) -> CategoryError {
    match err {
        RepositoryError::Conflict(_) => CategoryError::Validation(DUPLICATE.to_string()),
        other => CategoryError::Repository(other),
    }
}

/// Read-only view of the category list for tree walks.
struct Tree<'c> {
    all: &'c [Category],
    by_title: HashMap<String, &'c Category>,
}

impl<'c> Tree<'c> {
    fn new(all: &'c [Category]) -> Self {
        let by_title = all.iter().map(|c| (c.title.to_lowercase(), c)).collect();
        Self { all, by_title }
    }

    fn by_title(&self, title: &str) -> Option<&'c Category> {
        self.by_title.get(&title.trim().to_lowercase()).copied()
    }

    /// Whether `ancestor` appears on the parent chain above `start`.
    ///
    /// The walk is bounded by the number of categories; running past the
    /// bound means the stored chain already loops and is treated as a match.
    fn has_ancestor(&self, start: &Category, ancestor: CategoryId) -> bool {
        let mut current = start;
        for _ in 0..=self.all.len() {
            if current.id == ancestor {
                return true;
            }
            match current.parent.as_deref().and_then(|p| self.by_title(p)) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        true
    }

    /// Breadth-first ids of `root` and every transitive child.
    fn subtree(&self, root: &Category) -> Vec<CategoryId> {
        let mut visited = HashSet::from([root.id]);
        let mut order = vec![root.id];
        let mut queue = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            for child in self.all.iter().filter(|c| c.is_child_of(&node.title)) {
                if visited.insert(child.id) {
                    order.push(child.id);
                    queue.push_back(child);
                }
            }
        }
        order
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::NewProduct;
    use storekeep_core::Price;

    fn input(title: &str, code: &str, parent: Option<&str>) -> CategoryInput {
        CategoryInput {
            title: Some(title.to_string()),
            code: Some(code.to_string()),
            description: None,
            parent: parent.map(str::to_string),
        }
    }

    async fn add_product(stores: &Stores, category_id: CategoryId) {
        stores
            .products
            .insert_product(&NewProduct {
                sku: format!("SKU-{category_id}"),
                title: "Thing".to_string(),
                brand: "Acme".to_string(),
                category_id,
                price: Price::ZERO,
                short_description: String::new(),
                description: String::new(),
                image_path: None,
                is_enabled: true,
                is_featured: false,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        service.create(&input("Shoes", "SHO", None)).await.unwrap();
        service
            .create(&input("Boots", "BOO", Some("shoes")))
            .await
            .unwrap();

        let listed = service.list().await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Boots", "Shoes"]);
        // Parent stored with the canonical title
        assert_eq!(listed[0].parent.as_deref(), Some("Shoes"));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates_without_writing() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        service.create(&input("Shoes", "SHO", None)).await.unwrap();

        for bad in [input("SHOES", "X", None), input("Hats", "sho", None)] {
            let result = service.create(&bad).await;
            assert!(matches!(result, Err(CategoryError::Validation(_))));
        }
        assert_eq!(stores.categories.count_categories().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_validates_fields_and_parent() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);

        for bad in [
            input("  ", "SHO", None),
            input("Shoes", "", None),
            input("Shoes", "SHOES", None),
            input("Shoes", "SHO", Some("Missing")),
        ] {
            assert!(matches!(
                service.create(&bad).await,
                Err(CategoryError::Validation(_))
            ));
        }
        assert_eq!(stores.categories.count_categories().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_parent_means_root() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        let created = service
            .create(&input("Shoes", "SHO", Some("  ")))
            .await
            .unwrap();
        assert_eq!(created.parent, None);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        let result = service
            .update(CategoryId::new(42), &input("Shoes", "SHO", None))
            .await;
        assert!(matches!(result, Err(CategoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_rejects_no_change() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        let shoes = service.create(&input("Shoes", "SHO", None)).await.unwrap();

        let result = service.update(shoes.id, &input("shoes", "sho", None)).await;
        assert!(matches!(result, Err(CategoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_same_parent_in_other_case() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        service.create(&input("Shoes", "SHO", None)).await.unwrap();
        let boots = service
            .create(&input("Boots", "BOO", Some("Shoes")))
            .await
            .unwrap();

        let result = service
            .update(boots.id, &input("Boots", "BOO", Some("shoes")))
            .await;
        assert!(matches!(result, Err(CategoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_collisions() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        service.create(&input("Shoes", "SHO", None)).await.unwrap();
        let hats = service.create(&input("Hats", "HAT", None)).await.unwrap();

        let title_clash = service.update(hats.id, &input("shoes", "HAT", None)).await;
        assert!(matches!(title_clash, Err(CategoryError::Validation(_))));

        let code_clash = service.update(hats.id, &input("Hats", "SHO", None)).await;
        assert!(matches!(code_clash, Err(CategoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_self_and_descendant_parent() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        let shoes = service.create(&input("Shoes", "SHO", None)).await.unwrap();
        service
            .create(&input("Boots", "BOO", Some("Shoes")))
            .await
            .unwrap();
        service
            .create(&input("Hiking", "HIK", Some("Boots")))
            .await
            .unwrap();
        let before = service.list().await.unwrap();

        let own = service
            .update(shoes.id, &input("Shoes", "SHO", Some("Shoes")))
            .await;
        assert!(matches!(own, Err(CategoryError::Validation(_))));

        let grandchild = service
            .update(shoes.id, &input("Shoes", "SHO", Some("Hiking")))
            .await;
        assert!(matches!(grandchild, Err(CategoryError::Validation(_))));

        assert_eq!(service.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_allows_move_to_unrelated_parent() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        service.create(&input("Shoes", "SHO", None)).await.unwrap();
        let hats = service.create(&input("Hats", "HAT", None)).await.unwrap();

        let moved = service
            .update(hats.id, &input("Hats", "HAT", Some("Shoes")))
            .await
            .unwrap();
        assert_eq!(moved.parent.as_deref(), Some("Shoes"));
    }

    #[tokio::test]
    async fn test_rename_cascades_to_children() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        let shoes = service.create(&input("Shoes", "SHO", None)).await.unwrap();
        service
            .create(&input("Boots", "BOO", Some("Shoes")))
            .await
            .unwrap();
        service
            .create(&input("Sandals", "SAN", Some("Shoes")))
            .await
            .unwrap();

        service
            .update(shoes.id, &input("Footwear", "FOO", None))
            .await
            .unwrap();

        let children: Vec<Category> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.title != "Footwear")
            .collect();
        assert_eq!(children.len(), 2);
        assert!(
            children
                .iter()
                .all(|c| c.parent.as_deref() == Some("Footwear"))
        );
    }

    #[tokio::test]
    async fn test_delete_removes_subtree() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        let shoes = service.create(&input("Shoes", "SHO", None)).await.unwrap();
        let boots = service
            .create(&input("Boots", "BOO", Some("Shoes")))
            .await
            .unwrap();
        let hiking = service
            .create(&input("Hiking", "HIK", Some("Boots")))
            .await
            .unwrap();
        service.create(&input("Hats", "HAT", None)).await.unwrap();

        let deleted = service.delete(shoes.id).await.unwrap();
        assert_eq!(deleted, vec![hiking.id, boots.id, shoes.id]);

        let remaining: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(remaining, vec!["Hats".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_blocked_when_descendant_in_use() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        let shoes = service.create(&input("Shoes", "SHO", None)).await.unwrap();
        let boots = service
            .create(&input("Boots", "BOO", Some("Shoes")))
            .await
            .unwrap();
        add_product(&stores, boots.id).await;

        assert!(matches!(
            service.delete(shoes.id).await,
            Err(CategoryError::InUse)
        ));
        assert!(matches!(
            service.delete(boots.id).await,
            Err(CategoryError::InUse)
        ));
        assert_eq!(stores.categories.count_categories().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let stores = Stores::memory();
        let service = CategoryService::new(&stores);
        assert!(matches!(
            service.delete(CategoryId::new(5)).await,
            Err(CategoryError::NotFound)
        ));
    }

    #[test]
    fn test_ancestor_walk_terminates_on_corrupt_loop() {
        let code = CategoryCode::parse("A").unwrap();
        let looped = vec![
            Category {
                id: CategoryId::new(1),
                title: "A".to_string(),
                code: code.clone(),
                description: String::new(),
                parent: Some("B".to_string()),
            },
            Category {
                id: CategoryId::new(2),
                title: "B".to_string(),
                code,
                description: String::new(),
                parent: Some("A".to_string()),
            },
        ];
        let tree = Tree::new(&looped);
        assert!(tree.has_ancestor(&looped[0], CategoryId::new(99)));
        assert_eq!(tree.subtree(&looped[0]).len(), 2);
    }
}

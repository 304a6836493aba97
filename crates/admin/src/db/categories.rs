//! Category queries for [`PgStore`].
//!
//! Title and code uniqueness is enforced by `lower(...)` unique indexes, and
//! every lookup here compares case-insensitively to match.

use async_trait::async_trait;

use storekeep_core::{CategoryCode, CategoryId};

use super::{CategoryStore, PgStore, RepositoryError, map_constraint_error};
use crate::models::{Category, CategoryDraft};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    title: String,
    code: String,
    description: String,
    parent: Option<String>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let code = CategoryCode::parse(&row.code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid code for category {}: {e}", row.id))
        })?;

        Ok(Self {
            id: CategoryId::new(row.id),
            title: row.title,
            code,
            description: row.description,
            parent: row.parent,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, title, code, description, parent FROM catalog.category";

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!("{SELECT_COLUMNS} ORDER BY title"))
            .fetch_all(self.pool())
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_category_by_title(
        &self,
        title: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "{SELECT_COLUMNS} WHERE lower(title) = lower($1)"
        ))
        .bind(title.trim())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_category_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "{SELECT_COLUMNS} WHERE lower(code) = lower($1)"
        ))
        .bind(code.trim())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn count_categories(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog.category")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    async fn insert_category(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO catalog.category (title, code, description, parent)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, code, description, parent
            ",
        )
        .bind(&draft.title)
        .bind(draft.code.as_str())
        .bind(&draft.description)
        .bind(draft.parent.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint_error(e, "category"))?;

        row.try_into()
    }

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
        rename_from: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE catalog.category
            SET title = $2, code = $3, description = $4, parent = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, code, description, parent
            ",
        )
        .bind(id)
        .bind(&draft.title)
        .bind(draft.code.as_str())
        .bind(&draft.description)
        .bind(draft.parent.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "category"))?
        .ok_or(RepositoryError::NotFound)?;

        if let Some(old_title) = rename_from {
            let moved = sqlx::query(
                r"
                UPDATE catalog.category
                SET parent = $1, updated_at = NOW()
                WHERE lower(parent) = lower($2) AND id <> $3
                ",
            )
            .bind(&draft.title)
            .bind(old_title)
            .bind(id)
            .execute(&mut *tx)
            .await?;

            tracing::debug!(
                category_id = %id,
                children = moved.rows_affected(),
                "Cascaded category rename to children"
            );
        }

        tx.commit().await?;
        row.try_into()
    }

    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        let mut deleted = 0;

        for id in ids {
            let result = sqlx::query("DELETE FROM catalog.category WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_constraint_error(e, "category"))?;
            deleted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(deleted)
    }
}

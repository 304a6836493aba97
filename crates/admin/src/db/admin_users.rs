//! Admin user queries for [`PgStore`].

use async_trait::async_trait;

use storekeep_core::AdminId;

use super::{AdminStore, PgStore, RepositoryError, map_constraint_error};
use crate::models::AdminUser;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: i32,
    username_ciphertext: String,
    password_hash: String,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        if !row.password_hash.starts_with("$argon2") {
            return Err(RepositoryError::DataCorruption(format!(
                "admin {} has a non-argon2 password hash",
                row.id
            )));
        }

        Ok(Self {
            id: AdminId::new(row.id),
            username_ciphertext: row.username_ciphertext,
            password_hash: row.password_hash,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

#[async_trait]
impl AdminStore for PgStore {
    async fn list_admins(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, username_ciphertext, password_hash
            FROM admin.admin_user
            ORDER BY id
            ",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_admin(&self, id: AdminId) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, username_ciphertext, password_hash
            FROM admin.admin_user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create_admin(
        &self,
        username_ciphertext: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            INSERT INTO admin.admin_user (username_ciphertext, password_hash)
            VALUES ($1, $2)
            RETURNING id, username_ciphertext, password_hash
            ",
        )
        .bind(username_ciphertext)
        .bind(password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint_error(e, "admin"))?;

        row.try_into()
    }
}

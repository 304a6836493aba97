//! Persistent login token queries for [`PgStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storekeep_core::{AdminId, AuthTokenId};

use super::{PgStore, RepositoryError, TokenStore, map_constraint_error};
use crate::models::AuthToken;

#[derive(Debug, sqlx::FromRow)]
struct AuthTokenRow {
    id: i32,
    admin_id: i32,
    selector: String,
    hashed_validator: String,
    expires_at: DateTime<Utc>,
}

impl From<AuthTokenRow> for AuthToken {
    fn from(row: AuthTokenRow) -> Self {
        Self {
            id: AuthTokenId::new(row.id),
            admin_id: AdminId::new(row.admin_id),
            selector: row.selector,
            hashed_validator: row.hashed_validator,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert_token(
        &self,
        admin_id: AdminId,
        selector: &str,
        hashed_validator: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken, RepositoryError> {
        let row = sqlx::query_as::<_, AuthTokenRow>(
            r"
            INSERT INTO admin.auth_token (admin_id, selector, hashed_validator, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, admin_id, selector, hashed_validator, expires_at
            ",
        )
        .bind(admin_id)
        .bind(selector)
        .bind(hashed_validator)
        .bind(expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint_error(e, "auth token"))?;

        Ok(row.into())
    }

    async fn find_token(&self, selector: &str) -> Result<Option<AuthToken>, RepositoryError> {
        let row = sqlx::query_as::<_, AuthTokenRow>(
            r"
            SELECT id, admin_id, selector, hashed_validator, expires_at
            FROM admin.auth_token
            WHERE selector = $1
            ",
        )
        .bind(selector)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_token(&self, selector: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.auth_token WHERE selector = $1")
            .bind(selector)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{AdminsRepo, RepoError};
use crate::domain::entities::AdminRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    username: String,
    password: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AdminRow> for AdminRecord {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AdminsRepo for PostgresRepositories {
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminRecord>, RepoError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT id, username, password, created_at, updated_at
            FROM admin
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdminRecord::from))
    }

    async fn create_if_none(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<AdminRecord>, RepoError> {
        let result = sqlx::query_as::<_, AdminRow>(
            r#"
            INSERT INTO admin (username, password)
            SELECT $1, $2
            WHERE NOT EXISTS (SELECT 1 FROM admin)
            RETURNING id, username, password, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error);

        match result {
            Ok(row) => Ok(row.map(AdminRecord::from)),
            // a concurrent bootstrap won the race
            Err(RepoError::Duplicate { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn upsert_first_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminRecord, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let first_id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM admin ORDER BY id LIMIT 1 FOR UPDATE",
        )
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let row = match first_id {
            Some(id) => sqlx::query_as::<_, AdminRow>(
                r#"
                UPDATE admin
                SET username = $2, password = $3, updated_at = NOW()
                WHERE id = $1
                RETURNING id, username, password, created_at, updated_at
                "#,
            )
            .bind(id)
            .bind(username)
            .bind(password_hash),
            None => sqlx::query_as::<_, AdminRow>(
                r#"
                INSERT INTO admin (username, password)
                VALUES ($1, $2)
                RETURNING id, username, password, created_at, updated_at
                "#,
            )
            .bind(username)
            .bind(password_hash),
        }
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{NewsletterRepo, RepoError};
use crate::domain::entities::NewsletterRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(crate) struct NewsletterRow {
    id: i64,
    email: String,
    name: Option<String>,
    is_active: bool,
    subscribed_at: OffsetDateTime,
}

impl From<NewsletterRow> for NewsletterRecord {
    fn from(row: NewsletterRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            is_active: row.is_active,
            subscribed_at: row.subscribed_at,
        }
    }
}

#[async_trait]
impl NewsletterRepo for PostgresRepositories {
    async fn find_by_email(&self, email: &str) -> Result<Option<NewsletterRecord>, RepoError> {
        let row = sqlx::query_as::<_, NewsletterRow>(
            "SELECT id, email, name, is_active, subscribed_at FROM newsletters WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(NewsletterRecord::from))
    }

    async fn create_subscription(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<NewsletterRecord, RepoError> {
        let row = sqlx::query_as::<_, NewsletterRow>(
            r#"
            INSERT INTO newsletters (email, name, is_active)
            VALUES ($1, $2, TRUE)
            RETURNING id, email, name, is_active, subscribed_at
            "#,
        )
        .bind(email)
        .bind(name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn reactivate(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<Option<NewsletterRecord>, RepoError> {
        let row = sqlx::query_as::<_, NewsletterRow>(
            r#"
            UPDATE newsletters
            SET is_active = TRUE, name = COALESCE($2, name)
            WHERE email = $1 AND is_active = FALSE
            RETURNING id, email, name, is_active, subscribed_at
            "#,
        )
        .bind(email)
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(NewsletterRecord::from))
    }
}

use async_trait::async_trait;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError};
use crate::domain::entities::PostRecord;

use super::super::{PostgresRepositories, map_sqlx_error};
use super::types::PostRow;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            title,
            slug,
            content,
            excerpt,
            cover_image,
            published,
            reading_time,
            author_id,
        } = params;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (
                title, slug, content, excerpt, cover_image,
                published, reading_time, author_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, slug, content, excerpt, cover_image,
                      published, views, reading_time, author_id, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(slug)
        .bind(content)
        .bind(excerpt)
        .bind(cover_image)
        .bind(published)
        .bind(reading_time)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}

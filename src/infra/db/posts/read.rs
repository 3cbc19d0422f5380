use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::{PostRecord, PostWithAuthor};

use super::super::{PostgresRepositories, map_sqlx_error, util::contains_pattern};
use super::types::{POST_COLUMNS, PostRow, PostWithAuthorRow};

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_published(&self, limit: Option<u32>) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(" FROM posts p WHERE p.published = TRUE ORDER BY p.created_at DESC, p.id DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(limit));
        }

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<PostWithAuthor>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, a.username AS author_name \
             FROM posts p \
             LEFT JOIN admin a ON a.id = p.author_id \
             WHERE p.slug = $1 AND p.published = TRUE"
        );

        let row = sqlx::query_as::<_, PostWithAuthorRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostWithAuthor::from))
    }

    async fn increment_views(&self, id: i64) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn search_published(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE p.published = TRUE \
               AND (p.title LIKE $1 OR p.content LIKE $1 OR p.excerpt LIKE $1) \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2"
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(contains_pattern(query))
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

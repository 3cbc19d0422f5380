use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CommentOrder, CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(crate) struct CommentRow {
    id: i64,
    post_id: i64,
    author_name: String,
    author_email: String,
    content: String,
    approved: bool,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_name: row.author_name,
            author_email: row.author_email,
            content: row.content,
            approved: row.approved,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (post_id, author_name, author_email, content, approved)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, post_id, author_name, author_email, content, approved, created_at
            "#,
        )
        .bind(params.post_id)
        .bind(params.author_name)
        .bind(params.author_email)
        .bind(params.content)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn list_approved(
        &self,
        post_id: i64,
        order: CommentOrder,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let sql = match order {
            CommentOrder::OldestFirst => {
                "SELECT id, post_id, author_name, author_email, content, approved, created_at \
                 FROM comments WHERE post_id = $1 AND approved = TRUE \
                 ORDER BY created_at ASC, id ASC"
            }
            CommentOrder::NewestFirst => {
                "SELECT id, post_id, author_name, author_email, content, approved, created_at \
                 FROM comments WHERE post_id = $1 AND approved = TRUE \
                 ORDER BY created_at DESC, id DESC"
            }
        };

        let rows = sqlx::query_as::<_, CommentRow>(sql)
            .bind(post_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }
}

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{MediaRepo, RepoError};
use crate::domain::entities::MediaRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: i64,
    filename: String,
    url: String,
    mime_type: Option<String>,
    size: Option<i64>,
    created_at: OffsetDateTime,
}

impl From<MediaRow> for MediaRecord {
    fn from(row: MediaRow) -> Self {
        Self {
            id: row.id,
            filename: row.filename,
            url: row.url,
            mime_type: row.mime_type,
            size: row.size,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MediaRepo for PostgresRepositories {
    async fn list_media(&self) -> Result<Vec<MediaRecord>, RepoError> {
        let rows = sqlx::query_as::<_, MediaRow>(
            r#"
            SELECT id, filename, url, mime_type, size, created_at
            FROM media
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MediaRecord::from).collect())
    }
}

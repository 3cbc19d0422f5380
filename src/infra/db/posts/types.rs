use time::OffsetDateTime;

use crate::domain::entities::{PostRecord, PostWithAuthor};

pub(crate) const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.content, p.excerpt, p.cover_image, \
     p.published, p.views, p.reading_time, p.author_id, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) content: String,
    pub(crate) excerpt: Option<String>,
    pub(crate) cover_image: Option<String>,
    pub(crate) published: bool,
    pub(crate) views: i64,
    pub(crate) reading_time: i32,
    pub(crate) author_id: Option<i64>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            cover_image: row.cover_image,
            published: row.published,
            views: row.views,
            reading_time: row.reading_time,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostWithAuthorRow {
    #[sqlx(flatten)]
    pub(crate) post: PostRow,
    pub(crate) author_name: Option<String>,
}

impl From<PostWithAuthorRow> for PostWithAuthor {
    fn from(row: PostWithAuthorRow) -> Self {
        Self {
            post: row.post.into(),
            author_name: row.author_name,
        }
    }
}

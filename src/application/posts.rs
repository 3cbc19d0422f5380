//! Public post reads, keyword search, and manual authoring.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::repos::{
    CommentOrder, CommentsRepo, CreatePostParams, PostsRepo, PostsWriteRepo, RepoError,
};
use crate::domain::entities::{CommentRecord, PostRecord, PostWithAuthor};
use crate::domain::posts::reading_time_minutes;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug_async};

pub const SEARCH_MIN_CHARS: usize = 2;
pub const SEARCH_RESULT_LIMIT: u32 = 10;
pub const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0}")]
    Validation(String),
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A published post as shown on its page, after the view was counted.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub post: PostWithAuthor,
    /// Approved comments, newest first.
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: Option<bool>,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            comments,
        }
    }

    pub async fn list_published(&self, limit: Option<u32>) -> Result<Vec<PostRecord>, PostError> {
        if let Some(limit) = limit
            && !(1..=MAX_LIST_LIMIT).contains(&limit)
        {
            return Err(PostError::Validation(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}"
            )));
        }
        Ok(self.reader.list_published(limit).await?)
    }

    /// Load a published post and count the view.
    pub async fn view(&self, slug: &str) -> Result<PostPage, PostError> {
        let mut post = self
            .reader
            .find_published_by_slug(slug)
            .await?
            .ok_or(PostError::NotFound)?;

        post.post.views = self.reader.increment_views(post.post.id).await?;
        let comments = self
            .comments
            .list_approved(post.post.id, CommentOrder::NewestFirst)
            .await?;

        Ok(PostPage { post, comments })
    }

    /// Case-sensitive substring search over published posts. The query is
    /// used as given; anything shorter than [`SEARCH_MIN_CHARS`] returns
    /// nothing without hitting storage.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<PostRecord>, PostError> {
        let query = query.unwrap_or_default();
        if query.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }
        Ok(self
            .reader
            .search_published(query, SEARCH_RESULT_LIMIT)
            .await?)
    }

    pub async fn create(&self, input: NewPost, author_id: i64) -> Result<PostRecord, PostError> {
        let title = non_blank(input.title)
            .ok_or_else(|| PostError::Validation("title and content are required".into()))?;
        let content = non_blank(input.content)
            .ok_or_else(|| PostError::Validation("title and content are required".into()))?;

        let slug = self.unique_slug(&title).await?;
        let reading_time = reading_time_minutes(&content);

        let record = self
            .writer
            .create_post(CreatePostParams {
                title,
                slug,
                content,
                excerpt: non_blank(input.excerpt),
                cover_image: non_blank(input.cover_image),
                published: input.published.unwrap_or(false),
                reading_time,
                author_id: Some(author_id),
            })
            .await?;

        info!(
            target = "lekha::posts",
            post_id = record.id,
            slug = %record.slug,
            published = record.published,
            "post created"
        );
        Ok(record)
    }

    async fn unique_slug(&self, title: &str) -> Result<String, PostError> {
        let reader = self.reader.clone();
        let result = generate_unique_slug_async(title, |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move { reader.slug_exists(&candidate).await.map(|exists| !exists) }
        })
        .await;

        match result {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(SlugError::EmptyInput | SlugError::Unrepresentable { .. })) => {
                let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
                Ok(format!("post-{millis}"))
            }
            Err(SlugAsyncError::Slug(err)) => Err(PostError::Slug(err)),
            Err(SlugAsyncError::Predicate(err)) => Err(PostError::Repo(err)),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

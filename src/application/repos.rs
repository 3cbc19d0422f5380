//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, OffsetDateTime};

use crate::domain::entities::{
    AdminRecord, CategoryRecord, CommentRecord, MediaRecord, NewsletterRecord, PostRecord,
    PostWithAuthor,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait AdminsRepo: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminRecord>, RepoError>;

    /// Insert an admin only while the table is empty.
    ///
    /// Returns `None` when any admin already exists.
    async fn create_if_none(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<AdminRecord>, RepoError>;

    /// Overwrite the credentials of the first admin by id, inserting a row
    /// when none exists.
    async fn upsert_first_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub reading_time: i32,
    pub author_id: Option<i64>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Published posts, newest first.
    async fn list_published(&self, limit: Option<u32>) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<PostWithAuthor>, RepoError>;

    /// Atomically bump the view counter and return the new value.
    async fn increment_views(&self, id: i64) -> Result<i64, RepoError>;

    /// Case-insensitive substring match over title, content, and excerpt of
    /// published posts.
    async fn search_published(&self, query: &str, limit: u32)
    -> Result<Vec<PostRecord>, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOrder {
    OldestFirst,
    NewestFirst,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Persist an unapproved comment. A missing post surfaces as
    /// [`RepoError::InvalidInput`].
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn list_approved(
        &self,
        post_id: i64,
        order: CommentOrder,
    ) -> Result<Vec<CommentRecord>, RepoError>;
}

#[async_trait]
pub trait NewsletterRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<NewsletterRecord>, RepoError>;

    async fn create_subscription(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<NewsletterRecord, RepoError>;

    /// Flip an inactive subscription back on, replacing the name only when
    /// one is given. Returns `None` when the row is missing or already active.
    async fn reactivate(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<Option<NewsletterRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// Every category, ordered by name.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait MediaRepo: Send + Sync {
    /// All media rows, newest first.
    async fn list_media(&self) -> Result<Vec<MediaRecord>, RepoError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyticsTotals {
    pub posts: i64,
    pub views: i64,
    pub comments: i64,
    pub newsletters: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopPostRecord {
    pub id: i64,
    pub title: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyBucket {
    /// First day of the month the bucket covers.
    pub month_start: Date,
    pub posts: i64,
    pub views: i64,
}

#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn totals(&self) -> Result<AnalyticsTotals, RepoError>;

    async fn top_posts(&self, limit: u32) -> Result<Vec<TopPostRecord>, RepoError>;

    async fn recent_posts(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError>;

    async fn recent_comments(&self, limit: u32) -> Result<Vec<CommentRecord>, RepoError>;

    async fn recent_subscribers(&self, limit: u32) -> Result<Vec<NewsletterRecord>, RepoError>;

    /// Posts created and views held by those posts, per month, oldest first.
    async fn monthly_buckets(
        &self,
        since: Option<OffsetDateTime>,
    ) -> Result<Vec<MonthlyBucket>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    /// Round-trip to the store.
    async fn ping(&self) -> Result<(), RepoError>;
}

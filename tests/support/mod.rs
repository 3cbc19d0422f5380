//! In-memory stand-ins for the Postgres repositories and the completion provider.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use serde_json::Value;
use time::{Date, Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tower::ServiceExt;

use lekha::application::analytics::AnalyticsService;
use lekha::application::auth::{AuthService, BootstrapCredentials, TokenIssuer};
use lekha::application::categories::CategoryService;
use lekha::application::comments::CommentService;
use lekha::application::completion::{CompletionClient, CompletionError, CompletionRequest};
use lekha::application::generation::GenerationService;
use lekha::application::media::MediaService;
use lekha::application::newsletter::NewsletterService;
use lekha::application::posts::PostService;
use lekha::application::repos::{
    AdminsRepo, AnalyticsRepo, AnalyticsTotals, CategoriesRepo, CommentOrder, CommentsRepo,
    CreateCommentParams, CreatePostParams, HealthRepo, MediaRepo, MonthlyBucket, NewsletterRepo,
    PostsRepo, PostsWriteRepo, RepoError, TopPostRecord,
};
use lekha::domain::entities::{
    AdminRecord, CategoryRecord, CommentRecord, MediaRecord, NewsletterRecord, PostRecord,
    PostWithAuthor,
};
use lekha::infra::http::{self, ApiState};

pub const TEST_SECRET: &[u8] = b"integration-test-secret";
pub const BOOTSTRAP_USERNAME: &str = "a";
pub const BOOTSTRAP_PASSWORD: &str = "a";

#[derive(Default)]
pub struct StoreState {
    pub admins: Vec<AdminRecord>,
    pub posts: Vec<PostRecord>,
    pub comments: Vec<CommentRecord>,
    pub newsletters: Vec<NewsletterRecord>,
    pub categories: Vec<CategoryRecord>,
    pub media: Vec<MediaRecord>,
    /// Number of times the search query reached the store.
    pub search_calls: usize,
    next_id: i64,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub state: Mutex<StoreState>,
}

impl MemoryStore {
    pub async fn insert_post(&self, title: &str, slug: &str, published: bool) -> PostRecord {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let now = OffsetDateTime::now_utc() + Duration::seconds(id);
        let post = PostRecord {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
            content: format!("<p>{title} body</p>"),
            excerpt: Some(format!("{title} excerpt")),
            cover_image: None,
            published,
            views: 0,
            reading_time: 1,
            author_id: None,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        post
    }

    pub async fn insert_category(&self, name: &str, slug: &str) -> CategoryRecord {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let category = CategoryRecord {
            id,
            name: name.into(),
            slug: slug.into(),
            description: None,
            created_at: OffsetDateTime::now_utc(),
        };
        state.categories.push(category.clone());
        category
    }

    pub async fn insert_comment(&self, post_id: i64, author: &str, approved: bool) -> CommentRecord {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let comment = CommentRecord {
            id,
            post_id,
            author_name: author.to_string(),
            author_email: format!("{author}@example.com"),
            content: format!("comment by {author}"),
            approved,
            created_at: OffsetDateTime::now_utc() + Duration::seconds(id),
        };
        state.comments.push(comment.clone());
        comment
    }

    pub async fn deactivate_subscriber(&self, email: &str) {
        let mut state = self.state.lock().await;
        if let Some(row) = state.newsletters.iter_mut().find(|row| row.email == email) {
            row.is_active = false;
        }
    }

    pub async fn post_views(&self, slug: &str) -> i64 {
        let state = self.state.lock().await;
        state
            .posts
            .iter()
            .find(|post| post.slug == slug)
            .map(|post| post.views)
            .unwrap_or_default()
    }
}

fn newest_first<T, F>(rows: &mut [T], key: F)
where
    F: Fn(&T) -> OffsetDateTime,
{
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
}

#[async_trait]
impl AdminsRepo for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .admins
            .iter()
            .find(|admin| admin.username == username)
            .cloned())
    }

    async fn create_if_none(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<AdminRecord>, RepoError> {
        let mut state = self.state.lock().await;
        if !state.admins.is_empty() {
            return Ok(None);
        }
        let id = state.next_id();
        let now = OffsetDateTime::now_utc();
        let admin = AdminRecord {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.admins.push(admin.clone());
        Ok(Some(admin))
    }

    async fn upsert_first_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminRecord, RepoError> {
        let mut state = self.state.lock().await;
        let now = OffsetDateTime::now_utc();
        if let Some(admin) = state.admins.iter_mut().min_by_key(|admin| admin.id) {
            admin.username = username.to_string();
            admin.password_hash = password_hash.to_string();
            admin.updated_at = now;
            return Ok(admin.clone());
        }
        let id = state.next_id();
        let admin = AdminRecord {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.admins.push(admin.clone());
        Ok(admin)
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_published(&self, limit: Option<u32>) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut posts: Vec<_> = state.posts.iter().filter(|p| p.published).cloned().collect();
        newest_first(&mut posts, |post| post.created_at);
        if let Some(limit) = limit {
            posts.truncate(limit as usize);
        }
        Ok(posts)
    }

    async fn find_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<PostWithAuthor>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .posts
            .iter()
            .find(|post| post.published && post.slug == slug)
            .map(|post| PostWithAuthor {
                post: post.clone(),
                author_name: post.author_id.and_then(|id| {
                    state
                        .admins
                        .iter()
                        .find(|admin| admin.id == id)
                        .map(|admin| admin.username.clone())
                }),
            }))
    }

    async fn increment_views(&self, id: i64) -> Result<i64, RepoError> {
        let mut state = self.state.lock().await;
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        post.views += 1;
        Ok(post.views)
    }

    async fn search_published(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut state = self.state.lock().await;
        state.search_calls += 1;
        Ok(state
            .posts
            .iter()
            .filter(|post| post.published)
            .filter(|post| {
                post.title.contains(query)
                    || post.content.contains(query)
                    || post
                        .excerpt
                        .as_deref()
                        .is_some_and(|excerpt| excerpt.contains(query))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let state = self.state.lock().await;
        Ok(state.posts.iter().any(|post| post.slug == slug))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state.lock().await;
        if state.posts.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".into(),
            });
        }
        let id = state.next_id();
        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            id,
            title: params.title,
            slug: params.slug,
            content: params.content,
            excerpt: params.excerpt,
            cover_image: params.cover_image,
            published: params.published,
            views: 0,
            reading_time: params.reading_time,
            author_id: params.author_id,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        Ok(post)
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = self.state.lock().await;
        if !state.posts.iter().any(|post| post.id == params.post_id) {
            return Err(RepoError::InvalidInput {
                message: "comments_post_id_fkey".into(),
            });
        }
        let id = state.next_id();
        let comment = CommentRecord {
            id,
            post_id: params.post_id,
            author_name: params.author_name,
            author_email: params.author_email,
            content: params.content,
            approved: false,
            created_at: OffsetDateTime::now_utc(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_approved(
        &self,
        post_id: i64,
        order: CommentOrder,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut comments: Vec<_> = state
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id && comment.approved)
            .cloned()
            .collect();
        comments.sort_by_key(|comment| comment.created_at);
        if order == CommentOrder::NewestFirst {
            comments.reverse();
        }
        Ok(comments)
    }
}

#[async_trait]
impl NewsletterRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<NewsletterRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .newsletters
            .iter()
            .find(|row| row.email == email)
            .cloned())
    }

    async fn create_subscription(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<NewsletterRecord, RepoError> {
        let mut state = self.state.lock().await;
        if state.newsletters.iter().any(|row| row.email == email) {
            return Err(RepoError::Duplicate {
                constraint: "newsletters_email_key".into(),
            });
        }
        let id = state.next_id();
        let row = NewsletterRecord {
            id,
            email: email.to_string(),
            name: name.map(str::to_string),
            is_active: true,
            subscribed_at: OffsetDateTime::now_utc(),
        };
        state.newsletters.push(row.clone());
        Ok(row)
    }

    async fn reactivate(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<Option<NewsletterRecord>, RepoError> {
        let mut state = self.state.lock().await;
        let Some(row) = state
            .newsletters
            .iter_mut()
            .find(|row| row.email == email && !row.is_active)
        else {
            return Ok(None);
        };
        row.is_active = true;
        if let Some(name) = name {
            row.name = Some(name.to_string());
        }
        Ok(Some(row.clone()))
    }
}

#[async_trait]
impl CategoriesRepo for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }
}

#[async_trait]
impl MediaRepo for MemoryStore {
    async fn list_media(&self) -> Result<Vec<MediaRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut media = state.media.clone();
        newest_first(&mut media, |row| row.created_at);
        Ok(media)
    }
}

#[async_trait]
impl AnalyticsRepo for MemoryStore {
    async fn totals(&self) -> Result<AnalyticsTotals, RepoError> {
        let state = self.state.lock().await;
        Ok(AnalyticsTotals {
            posts: state.posts.len() as i64,
            views: state.posts.iter().map(|post| post.views).sum(),
            comments: state.comments.len() as i64,
            newsletters: state.newsletters.len() as i64,
        })
    }

    async fn top_posts(&self, limit: u32) -> Result<Vec<TopPostRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut posts = state.posts.clone();
        posts.sort_by_key(|post| std::cmp::Reverse(post.views));
        Ok(posts
            .into_iter()
            .take(limit as usize)
            .map(|post| TopPostRecord {
                id: post.id,
                title: post.title,
                views: post.views,
            })
            .collect())
    }

    async fn recent_posts(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut posts = state.posts.clone();
        newest_first(&mut posts, |post| post.created_at);
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn recent_comments(&self, limit: u32) -> Result<Vec<CommentRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut comments = state.comments.clone();
        newest_first(&mut comments, |comment| comment.created_at);
        comments.truncate(limit as usize);
        Ok(comments)
    }

    async fn recent_subscribers(&self, limit: u32) -> Result<Vec<NewsletterRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut rows = state.newsletters.clone();
        newest_first(&mut rows, |row| row.subscribed_at);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn monthly_buckets(
        &self,
        since: Option<OffsetDateTime>,
    ) -> Result<Vec<MonthlyBucket>, RepoError> {
        let state = self.state.lock().await;
        let mut buckets: Vec<MonthlyBucket> = Vec::new();
        let mut posts: Vec<_> = state
            .posts
            .iter()
            .filter(|post| since.is_none_or(|since| post.created_at >= since))
            .collect();
        posts.sort_by_key(|post| post.created_at);
        for post in posts {
            let date = post.created_at.date();
            let month_start = Date::from_calendar_date(date.year(), date.month(), 1)
                .map_err(RepoError::from_persistence)?;
            match buckets.last_mut() {
                Some(bucket) if bucket.month_start == month_start => {
                    bucket.posts += 1;
                    bucket.views += post.views;
                }
                _ => buckets.push(MonthlyBucket {
                    month_start,
                    posts: 1,
                    views: post.views,
                }),
            }
        }
        Ok(buckets)
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Completion provider that answers every request with the same text and records prompts.
pub struct ScriptedCompletion {
    reply: Result<String, u16>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().await.push(request);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(CompletionError::Upstream {
                status: *status,
                body: "upstream failure".into(),
            }),
        }
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub completion: Arc<ScriptedCompletion>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_completion(ScriptedCompletion::replying("Sure, happy to help."))
    }

    pub fn with_completion(completion: ScriptedCompletion) -> Self {
        let store = Arc::new(MemoryStore::default());
        let completion = Arc::new(completion);
        let tokens = Arc::new(TokenIssuer::new(TEST_SECRET, Duration::hours(24)));
        let bootstrap = BootstrapCredentials {
            username: BOOTSTRAP_USERNAME.into(),
            password: BOOTSTRAP_PASSWORD.into(),
        };

        let state = ApiState {
            auth: Arc::new(AuthService::new(store.clone(), tokens, bootstrap)),
            comments: Arc::new(CommentService::new(store.clone())),
            newsletter: Arc::new(NewsletterService::new(store.clone())),
            posts: Arc::new(PostService::new(
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            analytics: Arc::new(AnalyticsService::new(store.clone())),
            generation: Arc::new(GenerationService::new(completion.clone(), store.clone())),
            categories: Arc::new(CategoryService::new(store.clone())),
            media: Arc::new(MediaService::new(store.clone())),
            health: store.clone(),
        };

        Self {
            store,
            completion,
            router: http::build_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Log in with the bootstrap pair and return the bearer token.
    pub async fn admin_token(&self) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/admin/login",
                &serde_json::json!({
                    "username": BOOTSTRAP_USERNAME,
                    "password": BOOTSTRAP_PASSWORD,
                }),
            ))
            .await;
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "bootstrap login should succeed"
        );
        let body = body_json(response).await;
        body["token"].as_str().expect("token").to_string()
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn authed_json_request(method: &str, uri: &str, token: &str, body: &Value) -> Request<Body> {
    let mut request = json_request(method, uri, body);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().expect("header value"),
    );
    request
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

use std::sync::Arc;

use crate::application::analytics::AnalyticsService;
use crate::application::auth::AuthService;
use crate::application::categories::CategoryService;
use crate::application::comments::CommentService;
use crate::application::generation::GenerationService;
use crate::application::media::MediaService;
use crate::application::newsletter::NewsletterService;
use crate::application::posts::PostService;
use crate::application::repos::HealthRepo;

#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthService>,
    pub comments: Arc<CommentService>,
    pub newsletter: Arc<NewsletterService>,
    pub posts: Arc<PostService>,
    pub analytics: Arc<AnalyticsService>,
    pub generation: Arc<GenerationService>,
    pub categories: Arc<CategoryService>,
    pub media: Arc<MediaService>,
    pub health: Arc<dyn HealthRepo>,
}

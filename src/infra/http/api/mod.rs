pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

/// JSON API routes. Admin routes sit behind the bearer check; everything else is public.
pub fn build_api_router(state: ApiState) -> Router<ApiState> {
    let admin = Router::new()
        .route(
            "/api/admin/update-credentials",
            post(handlers::update_credentials),
        )
        .route("/api/admin/analytics", get(handlers::get_analytics))
        .route("/api/admin/generate-post", post(handlers::generate_post))
        .route(
            "/api/admin/bot-generate-post",
            post(handlers::bot_generate_post),
        )
        .route("/api/admin/media", get(handlers::list_media))
        .route("/api/posts", post(handlers::create_post))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::admin_auth,
        ));

    Router::new()
        .route("/api/admin/login", post(handlers::login))
        .route(
            "/api/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/api/newsletter/subscribe", post(handlers::subscribe))
        .route("/api/search", get(handlers::search_posts))
        .route("/api/posts", get(handlers::list_posts))
        .route("/api/posts/{slug}", get(handlers::get_post))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/chat", post(handlers::chat))
        .merge(admin)
}

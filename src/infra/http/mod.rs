pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::error::HttpError;
use crate::application::repos::RepoError;

use self::api::error::ApiError;
use self::middleware::{log_responses, set_request_context};

/// Assemble the full application router: JSON API, health probe and a JSON 404 fallback.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .merge(build_api_router(state.clone()))
        .route("/_health/db", get(db_health))
        .fallback(fallback)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn db_health(State(state): State<ApiState>) -> Response {
    db_health_response(state.health.ping().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => HttpError::from_error(
            "infra::http::db_health",
            StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable",
            &err,
        )
        .into_response(),
    }
}

async fn fallback() -> ApiError {
    ApiError::not_found("route not found")
}

//! Completion-backed drafting, bot publishing and the visitor chat assistant.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::auth::AdminPrincipal;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::json_body;

const BOT_POST_MESSAGE: &str = "Post generated and published successfully!";

pub async fn generate_post(
    State(state): State<ApiState>,
    payload: Result<Json<GeneratePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let draft = state
        .generation
        .draft_from_idea(payload.idea.as_deref())
        .await?;

    Ok(Json(GeneratedPostResponse::from(draft)))
}

pub async fn bot_generate_post(
    State(state): State<ApiState>,
    Extension(principal): Extension<AdminPrincipal>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.generation.publish_bot_post(principal.id).await?;

    Ok(Json(BotPostResponse {
        message: BOT_POST_MESSAGE.to_string(),
        title: post.title,
        slug: post.slug,
    }))
}

pub async fn chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let response = state.generation.chat(payload.message.as_deref()).await?;

    Ok(Json(ChatResponse { response }))
}

//! Reader comments.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::comments::CommentSubmission;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::{json_body, query_params};

const COMMENT_SUBMITTED_MESSAGE: &str = "Comment submitted for review";

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
}

pub async fn list_comments(
    State(state): State<ApiState>,
    query: Result<Query<CommentsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = query_params(query)?;
    let post_id = query
        .post_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::validation("Post ID is required"))?;

    let comments = state.comments.list_approved(post_id).await?;

    Ok(Json(CommentsResponse {
        comments: comments.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_comment(
    State(state): State<ApiState>,
    payload: Result<Json<CommentCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let submission = CommentSubmission {
        post_id: payload.post_id.as_ref().and_then(PostIdInput::as_id),
        author_name: payload.author_name,
        author_email: payload.author_email,
        content: payload.content,
    };

    state.comments.submit(submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(COMMENT_SUBMITTED_MESSAGE)),
    ))
}

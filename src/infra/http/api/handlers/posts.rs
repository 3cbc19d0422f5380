//! Post listing, reading and manual creation.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::auth::AdminPrincipal;
use crate::application::posts::NewPost;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::{json_body, query_params};

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub limit: Option<u32>,
}

pub async fn list_posts(
    State(state): State<ApiState>,
    query: Result<Query<PostListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = query_params(query)?;
    let posts = state.posts.list_published(query.limit).await?;

    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(Into::into).collect(),
    }))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.posts.view(&slug).await?;

    Ok(Json(PostDetailResponse {
        post: page.post.into(),
        comments: page.comments.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(principal): Extension<AdminPrincipal>,
    payload: Result<Json<PostCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let input = NewPost {
        title: payload.title,
        content: payload.content,
        excerpt: payload.excerpt,
        cover_image: payload.cover_image,
        published: payload.published,
    };

    let post = state.posts.create(input, principal.id).await?;

    Ok((StatusCode::CREATED, Json(PostView::from(post))))
}

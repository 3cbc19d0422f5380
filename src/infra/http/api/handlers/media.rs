use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_media(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let media = state.media.list().await?;

    Ok(Json(MediaListResponse {
        media: media.into_iter().map(Into::into).collect(),
    }))
}

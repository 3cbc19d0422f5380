use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::json_body;

pub async fn subscribe(
    State(state): State<ApiState>,
    payload: Result<Json<NewsletterSubscribeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let outcome = state
        .newsletter
        .subscribe(payload.email.as_deref(), payload.name.as_deref())
        .await?;

    Ok(Json(MessageResponse::new(outcome.message())))
}

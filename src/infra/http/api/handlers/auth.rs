//! Admin login and credential management.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::json_body;

const BOOTSTRAP_LOGIN_MESSAGE: &str = "Default admin created and logged in";
const CREDENTIALS_UPDATED_MESSAGE: &str = "Credentials updated successfully";

pub async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let outcome = state
        .auth
        .login(
            payload.username.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        message: outcome
            .bootstrapped
            .then(|| BOOTSTRAP_LOGIN_MESSAGE.to_string()),
    }))
}

pub async fn update_credentials(
    State(state): State<ApiState>,
    payload: Result<Json<UpdateCredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    state
        .auth
        .update_credentials(
            payload.username.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(MessageResponse::new(CREDENTIALS_UPDATED_MESSAGE)))
}

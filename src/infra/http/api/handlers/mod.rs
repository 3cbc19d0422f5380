//! API handlers organized by resource.
//!
//! Bodies are taken as `Result<Json<T>, JsonRejection>` so malformed input is
//! answered with the shared error envelope instead of axum's plain-text rejection.

mod analytics;
mod auth;
mod categories;
mod comments;
mod generation;
mod media;
mod newsletter;
mod posts;
mod search;

pub use analytics::*;
pub use auth::*;
pub use categories::*;
pub use comments::*;
pub use generation::*;
pub use media::*;
pub use newsletter::*;
pub use posts::*;
pub use search::*;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;

use super::error::ApiError;

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request("Invalid JSON body", Some(rejection.body_text())))
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| {
            ApiError::bad_request("Invalid query parameters", Some(rejection.body_text()))
        })
}

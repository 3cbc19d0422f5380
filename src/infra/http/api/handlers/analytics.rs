use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::domain::types::AnalyticsRange;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::query_params;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<String>,
}

pub async fn get_analytics(
    State(state): State<ApiState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = query_params(query)?;
    let range = match query.range.as_deref() {
        Some(raw) => raw.parse::<AnalyticsRange>()?,
        None => AnalyticsRange::default(),
    };

    let report = state.analytics.report(range).await?;

    Ok(Json(AnalyticsResponse::from(report)))
}

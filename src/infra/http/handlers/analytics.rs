use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header::REFERER};
use axum::response::IntoResponse;
use serde::Deserialize;

use creatorhub_api_types::AnalyticsEventRequest;

use crate::infra::http::error::ApiError;
use crate::infra::http::session::CurrentUser;
use crate::infra::http::state::HttpState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SummaryQuery {
    days: Option<u32>,
}

pub(crate) fn referrer(headers: &HeaderMap) -> Option<&str> {
    headers.get(REFERER).and_then(|value| value.to_str().ok())
}

pub async fn record_event(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Json(request): Json<AnalyticsEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .analytics
        .record(request, referrer(&headers))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.services.analytics.summary(&user, query.days).await?,
    ))
}

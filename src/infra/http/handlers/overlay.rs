use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::analytics::referrer;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::HttpState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OverlayQuery {
    track: Option<String>,
}

impl OverlayQuery {
    fn track(&self) -> bool {
        matches!(self.track.as_deref(), Some("1" | "true"))
    }
}

pub async fn overlay(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    Query(query): Query<OverlayQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .overlay
        .overlay(&username, query.track(), referrer(&headers))
        .await?;
    Ok(Json(view))
}

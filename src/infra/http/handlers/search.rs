use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::domain::types::SearchKind;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::HttpState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    q: String,
}

fn parse_kind(raw: &str) -> Result<SearchKind, ApiError> {
    SearchKind::from_path(raw).ok_or_else(|| {
        ApiError::bad_request(
            "Unknown search kind",
            Some(format!("`{raw}` is not one of movie, series, anime, game")),
        )
    })
}

pub async fn search(
    State(state): State<HttpState>,
    Path(kind): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.services.search.search(kind, &query.q).await?))
}

pub async fn twitch_live(
    State(state): State<HttpState>,
    Path(login): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.search.live_status(&login).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_path_segments() {
        assert_eq!(parse_kind("anime").unwrap(), SearchKind::Anime);
        assert_eq!(parse_kind("tv").unwrap(), SearchKind::Series);
        assert!(parse_kind("book").is_err());
    }
}

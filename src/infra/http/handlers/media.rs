use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use creatorhub_api_types::{MediaUpdateRequest, SeasonProgressRequest, TrackMediaRequest};

use crate::application::repos::TrackedMediaFilter;
use crate::domain::types::{MediaType, WatchStatus};
use crate::infra::http::error::ApiError;
use crate::infra::http::session::CurrentUser;
use crate::infra::http::state::HttpState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MediaListQuery {
    #[serde(rename = "type")]
    media_type: Option<MediaType>,
    status: Option<WatchStatus>,
}

pub async fn list_media(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MediaListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TrackedMediaFilter {
        media_type: query.media_type,
        status: query.status,
    };
    Ok(Json(state.services.media.list(&user, filter).await?))
}

pub async fn track_media(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<TrackMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tracked = state.services.media.track(&user, request).await?;
    Ok((StatusCode::CREATED, Json(tracked)))
}

pub async fn update_media(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(media_id): Path<Uuid>,
    Json(request): Json<MediaUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.services.media.update(&user, media_id, request).await?,
    ))
}

pub async fn untrack_media(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(media_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.media.untrack(&user, media_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_season(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path((media_id, season)): Path<(Uuid, i32)>,
    Json(request): Json<SeasonProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tracked = state
        .services
        .media
        .set_season(&user, media_id, season, request.watched)
        .await?;
    Ok(Json(tracked))
}

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use creatorhub_api_types::ScheduleCreateRequest;

use super::users::WeekQuery;
use crate::infra::http::error::ApiError;
use crate::infra::http::session::CurrentUser;
use crate::infra::http::state::HttpState;

pub async fn own_week(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<WeekQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.services.schedule.own_week(&user, query.week).await?,
    ))
}

pub async fn create_item(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ScheduleCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.services.schedule.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn delete_item(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.schedule.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_item(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.schedule.complete(&user, id).await?))
}

pub async fn announce_item(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.schedule.announce_item(&user, id).await?))
}

pub async fn announce_week(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<WeekQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .services
            .schedule
            .announce_week(&user, query.week)
            .await?,
    ))
}

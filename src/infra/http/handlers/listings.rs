//! Owner CRUD over sponsors and social links.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use creatorhub_api_types::{
    SocialCreateRequest, SocialUpdateRequest, SponsorCreateRequest, SponsorUpdateRequest,
};

use crate::infra::http::error::ApiError;
use crate::infra::http::session::CurrentUser;
use crate::infra::http::state::HttpState;

pub async fn list_sponsors(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.sponsors.list_own(&user).await?))
}

pub async fn create_sponsor(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SponsorCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sponsor = state.services.sponsors.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(sponsor)))
}

pub async fn update_sponsor(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SponsorUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.services.sponsors.update(&user, id, request).await?,
    ))
}

pub async fn delete_sponsor(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.sponsors.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_socials(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.socials.list_own(&user).await?))
}

pub async fn create_social(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SocialCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let social = state.services.socials.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(social)))
}

pub async fn update_social(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SocialUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.services.socials.update(&user, id, request).await?,
    ))
}

pub async fn delete_social(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.socials.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

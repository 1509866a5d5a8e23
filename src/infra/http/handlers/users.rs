//! Public pages of a user's hub and the follow endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::infra::http::error::ApiError;
use crate::infra::http::session::{CurrentUser, MaybeUser};
use crate::infra::http::state::HttpState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WeekQuery {
    pub week: i32,
}

pub async fn public_profile(
    State(state): State<HttpState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .services
        .profile
        .public_profile(&username, viewer.id())
        .await?;
    Ok(Json(profile))
}

pub async fn watchlist(
    State(state): State<HttpState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .media
        .public_watchlist(&username, viewer.id())
        .await?;
    Ok(Json(items))
}

pub async fn schedule(
    State(state): State<HttpState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let week = state
        .services
        .schedule
        .public_week(&username, viewer.id(), query.week)
        .await?;
    Ok(Json(week))
}

pub async fn sponsors(
    State(state): State<HttpState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sponsors = state
        .services
        .sponsors
        .public(&username, viewer.id())
        .await?;
    Ok(Json(sponsors))
}

pub async fn socials(
    State(state): State<HttpState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let socials = state
        .services
        .socials
        .public(&username, viewer.id())
        .await?;
    Ok(Json(socials))
}

pub async fn followers(
    State(state): State<HttpState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let followers = state
        .services
        .follows
        .followers(&username, viewer.id())
        .await?;
    Ok(Json(followers))
}

pub async fn follow_counts(
    State(state): State<HttpState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = state
        .services
        .follows
        .counts(&username, viewer.id())
        .await?;
    Ok(Json(counts))
}

pub async fn follow_status(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.follows.status(&user, &username).await?))
}

pub async fn follow(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.follows.follow(&user, &username).await?))
}

pub async fn unfollow(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.follows.unfollow(&user, &username).await?))
}

pub async fn toggle_follow(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.follows.toggle(&user, &username).await?))
}

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use creatorhub_api_types::{
    LoginRequest, MessageResponse, PasswordResetConfirmRequest, PasswordResetRequest,
    RegisterRequest,
};

use crate::application::views::user_view;
use crate::infra::http::error::ApiError;
use crate::infra::http::session::{CurrentUser, removal_cookie, session_cookie, session_token};
use crate::infra::http::state::HttpState;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: String,
}

pub async fn register(
    State(state): State<HttpState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user_view(&user))))
}

pub async fn login(
    State(state): State<HttpState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state.services.auth.login(request).await?;
    let cookie = session_cookie(
        &session,
        state.services.auth.session_ttl(),
        state.config.cookie_secure,
    );
    Ok((jar.add(cookie), Json(user_view(&user))))
}

pub async fn logout(
    State(state): State<HttpState>,
    CurrentUser(_user): CurrentUser,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers) {
        state.services.auth.logout(&token).await?;
    }
    Ok((jar.remove(removal_cookie()), StatusCode::NO_CONTENT))
}

pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(user_view(&user))
}

/// Always succeeds so the endpoint cannot be used to probe for accounts.
pub async fn request_password_reset(
    State(state): State<HttpState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .auth
        .request_password_reset(&request.email)
        .await?;
    Ok(Json(MessageResponse {
        message: "If that address is registered, a reset link is on its way.".to_string(),
    }))
}

pub async fn confirm_password_reset(
    State(state): State<HttpState>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.auth.reset_password(request).await?;
    Ok(Json(MessageResponse {
        message: "Password updated. Please sign in again.".to_string(),
    }))
}

pub async fn verify_email(
    State(state): State<HttpState>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.auth.verify_email(&query.token).await?;
    Ok(Json(user_view(&user)))
}

//! Health, stored uploads and the cron trigger.

use std::io::ErrorKind;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{
    HeaderMap, HeaderValue, StatusCode,
    header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::error;

use crate::application::error::ErrorReport;
use crate::infra::http::error::ApiError;
use crate::infra::http::session::verify_cron_key;
use crate::infra::http::state::HttpState;
use crate::infra::uploads::UploadStorageError;

pub async fn health(State(state): State<HttpState>) -> Response {
    match state.health.check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(message) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_message(
                "creatorhub::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                message,
            )
            .attach(&mut response);
            response
        }
    }
}

pub async fn serve_upload(
    State(state): State<HttpState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    match state.uploads.read(&path).await {
        Ok(bytes) => Ok(build_upload_response(&path, bytes)),
        Err(UploadStorageError::Io(err)) if err.kind() == ErrorKind::NotFound => {
            Err(ApiError::not_found("Upload not found"))
        }
        Err(err) => {
            if !matches!(err, UploadStorageError::InvalidPath) {
                error!(
                    target = "creatorhub::http::uploads",
                    path = %path,
                    error = %err,
                    "failed to read stored upload"
                );
            }
            Err(err.into())
        }
    }
}

fn build_upload_response(path: &str, bytes: Bytes) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    // Stored names carry a fresh uuid, so the bytes behind a path never change.
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

pub async fn youtube_stats(
    State(state): State<HttpState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    verify_cron_key(&headers, state.config.cron_secret.as_deref())?;
    Ok(Json(state.services.channel_stats.sync_youtube().await?))
}

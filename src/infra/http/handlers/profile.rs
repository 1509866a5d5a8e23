use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use tracing::warn;
use url::Url;

use creatorhub_api_types::{ProfileUpdateRequest, UploadResponse};

use crate::application::profile::ImageSlot;
use crate::application::views::user_view;
use crate::infra::http::error::{ApiError, codes};
use crate::infra::http::session::CurrentUser;
use crate::infra::http::state::HttpState;

const UPLOAD_FIELD: &str = "file";

pub async fn get_profile(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(user_view(&user))
}

pub async fn update_profile(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.services.profile.update(&user, request).await?;
    Ok(Json(user_view(&updated)))
}

pub async fn upload_avatar(
    state: State<HttpState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    upload_image(state, user, multipart, ImageSlot::Avatar).await
}

pub async fn upload_banner(
    state: State<HttpState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    upload_image(state, user, multipart, ImageSlot::Banner).await
}

/// The file is written before the profile row. A failed update removes the
/// new file; a successful one removes the image it replaced.
async fn upload_image(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
    slot: ImageSlot,
) -> Result<impl IntoResponse, ApiError> {
    let data = read_file_field(multipart).await?;
    let stored_path = state
        .uploads
        .store(&user.id.to_string(), slot.as_str(), data)
        .await?;

    let url = state
        .config
        .public_url
        .join(&format!("uploads/{stored_path}"))
        .map_err(|err| ApiError::internal(codes::INTERNAL, "Failed to build upload URL", err))?
        .to_string();

    let previous = match slot {
        ImageSlot::Avatar => user.avatar_url.clone(),
        ImageSlot::Banner => user.banner_url.clone(),
    };

    if let Err(err) = state.services.profile.set_image(&user, slot, url.clone()).await {
        warn!(
            target = "creatorhub::http::uploads",
            user_id = %user.id,
            stored_path = %stored_path,
            error = %err,
            "Profile update failed after storing upload"
        );
        remove_upload(&state, &stored_path).await;
        return Err(err.into());
    }

    if let Some(old_path) = previous
        .as_deref()
        .and_then(|old| stored_path_of(&state.config.public_url, old))
    {
        remove_upload(&state, old_path).await;
    }

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

/// Stored path of a URL served from this hub's `/uploads/`, if it is one.
fn stored_path_of<'a>(public_url: &Url, url: &'a str) -> Option<&'a str> {
    let prefix = public_url.join("uploads/").ok()?;
    url.strip_prefix(prefix.as_str())
        .filter(|path| !path.is_empty())
}

async fn remove_upload(state: &HttpState, stored_path: &str) {
    if let Err(err) = state.uploads.delete(stored_path).await {
        warn!(
            target = "creatorhub::http::uploads",
            stored_path = %stored_path,
            error = %err,
            "Failed to remove stored upload"
        );
    }
}

async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            return field.bytes().await.map_err(multipart_error);
        }
    }
    Err(ApiError::bad_request(
        "Missing file",
        Some(format!("send the image in a `{UPLOAD_FIELD}` field")),
    ))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "Uploaded file is too large",
            None,
        )
    } else {
        ApiError::bad_request("Invalid multipart payload", Some(err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_upload_urls_map_to_stored_paths() {
        let base = Url::parse("http://hub.test/").unwrap();
        assert_eq!(
            stored_path_of(&base, "http://hub.test/uploads/u1/avatar-x.png"),
            Some("u1/avatar-x.png")
        );
        assert_eq!(stored_path_of(&base, "https://cdn.example.com/avatar.png"), None);
        assert_eq!(stored_path_of(&base, "http://hub.test/uploads/"), None);
    }
}

//! JSON error responses and the mapping from service errors onto them.

use std::fmt::Display;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::analytics::AnalyticsError;
use crate::application::auth::AuthError;
use crate::application::channel_stats::SyncError;
use crate::application::error::ErrorReport;
use crate::application::follows::FollowError;
use crate::application::listings::ListingError;
use crate::application::media::MediaError;
use crate::application::overlay::OverlayError;
use crate::application::ports::IntegrationError;
use crate::application::profile::ProfileError;
use crate::application::repos::RepoError;
use crate::application::schedule::ScheduleError;
use crate::application::search::SearchError;
use crate::domain::error::DomainError;
use crate::infra::uploads::UploadStorageError;

const SOURCE: &str = "creatorhub::http";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION: &str = "validation_error";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const USERNAME_TAKEN: &str = "username_taken";
    pub const EMAIL_TAKEN: &str = "email_taken";
    pub const INTEGRITY: &str = "integrity_error";
    pub const TOKEN_EXPIRED: &str = "token_expired";
    pub const SELF_FOLLOW: &str = "self_follow";
    pub const NO_WEBHOOK: &str = "no_webhook";
    pub const INVALID_UPLOAD: &str = "invalid_upload";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const UPSTREAM: &str = "upstream_error";
    pub const NOT_CONFIGURED: &str = "not_configured";
    pub const DB_UNAVAILABLE: &str = "db_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

/// An error rendered as `{"error":{"code","message","hint"?}}`.
///
/// `detail` only feeds the attached [`ErrorReport`]; it is never serialised.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            detail: None,
        }
    }

    /// Server-side failure; the cause is logged but not returned.
    pub fn internal(code: &'static str, message: &'static str, detail: impl Display) -> Self {
        Self {
            detail: Some(detail.to_string()),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message, None)
        }
    }

    fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Sign in required",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn rate_limited(retry_after: u64) -> Response {
        let mut response = Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            codes::RATE_LIMITED,
            "Rate limit exceeded",
            Some(format!("Retry after {retry_after} seconds")),
        )
        .into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let diagnostic = match (&self.detail, &self.hint) {
            (Some(detail), _) => format!("{}: {detail}", self.code),
            (None, Some(hint)) => format!("{}: {hint}", self.code),
            (None, None) => format!("{}: {}", self.code, self.message),
        };
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(SOURCE, self.status, diagnostic).attach(&mut response);
        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity } => Self::new(
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                "Resource not found",
                Some(entity.to_string()),
            ),
            DomainError::Validation { field, message } => Self::new(
                StatusCode::BAD_REQUEST,
                codes::VALIDATION,
                "Invalid input",
                Some(format!("{field}: {message}")),
            ),
            DomainError::Invariant { message } => Self::new(
                StatusCode::BAD_REQUEST,
                codes::VALIDATION,
                "Invalid input",
                Some(message),
            ),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { constraint } => Self::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Duplicate record",
                Some(constraint),
            ),
            RepoError::NotFound => Self::not_found("Resource not found"),
            RepoError::InvalidInput { message } => Self::new(
                StatusCode::BAD_REQUEST,
                codes::VALIDATION,
                "Invalid input",
                Some(message),
            ),
            RepoError::Integrity { message } => Self::new(
                StatusCode::CONFLICT,
                codes::INTEGRITY,
                "Integrity constraint violated",
                Some(message),
            ),
            RepoError::Timeout => Self::internal(
                codes::DB_UNAVAILABLE,
                "Database unavailable",
                "database timeout",
            )
            .with_status(StatusCode::SERVICE_UNAVAILABLE),
            RepoError::Persistence(message) => {
                Self::internal(codes::INTERNAL, "Persistence error", message)
            }
        }
    }
}

impl From<IntegrationError> for ApiError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::NotConfigured { service } => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::NOT_CONFIGURED,
                "Integration not configured",
                Some(service.to_string()),
            ),
            other => Self::internal(codes::UPSTREAM, "Upstream service failed", &other)
                .with_status(StatusCode::BAD_GATEWAY),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Domain(err) => err.into(),
            AuthError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                codes::INVALID_CREDENTIALS,
                "Invalid credentials",
                None,
            ),
            AuthError::Unauthenticated => Self::unauthorized(),
            AuthError::UsernameTaken => Self::new(
                StatusCode::CONFLICT,
                codes::USERNAME_TAKEN,
                "Username already taken",
                None,
            ),
            AuthError::EmailTaken => Self::new(
                StatusCode::CONFLICT,
                codes::EMAIL_TAKEN,
                "Email already registered",
                None,
            ),
            AuthError::TokenNotFound => Self::not_found("Token not found"),
            AuthError::TokenExpired => Self::new(
                StatusCode::GONE,
                codes::TOKEN_EXPIRED,
                "Token expired",
                None,
            ),
            AuthError::Hash(message) => {
                Self::internal(codes::INTERNAL, "Password hashing failed", message)
            }
            AuthError::Repo(err) => err.into(),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound => Self::not_found("User not found"),
            ProfileError::UsernameTaken => Self::new(
                StatusCode::CONFLICT,
                codes::USERNAME_TAKEN,
                "Username already taken",
                None,
            ),
            ProfileError::Domain(err) => err.into(),
            ProfileError::Repo(err) => err.into(),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::NotFound => Self::not_found("Media not tracked"),
            MediaError::UserNotFound => Self::not_found("User not found"),
            MediaError::Domain(err) => err.into(),
            MediaError::Repo(err) => err.into(),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::NotFound => Self::not_found("Schedule item not found"),
            ScheduleError::MediaNotFound => Self::not_found("Media not found"),
            ScheduleError::UserNotFound => Self::not_found("User not found"),
            ScheduleError::NoWebhook => Self::new(
                StatusCode::BAD_REQUEST,
                codes::NO_WEBHOOK,
                "No Discord webhook configured",
                Some("Set a webhook URL on your profile".to_string()),
            ),
            ScheduleError::Announce(err) => err.into(),
            ScheduleError::Domain(err) => err.into(),
            ScheduleError::Repo(err) => err.into(),
        }
    }
}

impl From<FollowError> for ApiError {
    fn from(err: FollowError) -> Self {
        match err {
            FollowError::UserNotFound => Self::not_found("User not found"),
            FollowError::SelfFollow => Self::new(
                StatusCode::BAD_REQUEST,
                codes::SELF_FOLLOW,
                "You cannot follow yourself",
                None,
            ),
            FollowError::Repo(err) => err.into(),
        }
    }
}

impl From<ListingError> for ApiError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::NotFound => Self::not_found("Item not found"),
            ListingError::UserNotFound => Self::not_found("User not found"),
            ListingError::Domain(err) => err.into(),
            ListingError::Repo(err) => err.into(),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::UserNotFound => Self::not_found("User not found"),
            AnalyticsError::Domain(err) => err.into(),
            AnalyticsError::Repo(err) => err.into(),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Domain(err) => err.into(),
            SearchError::Integration(err) => err.into(),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Integration(err) => err.into(),
            SyncError::Repo(err) => err.into(),
        }
    }
}

impl From<OverlayError> for ApiError {
    fn from(err: OverlayError) -> Self {
        match err {
            OverlayError::NotFound => Self::not_found("User not found"),
            OverlayError::Repo(err) => err.into(),
        }
    }
}

impl From<UploadStorageError> for ApiError {
    fn from(err: UploadStorageError) -> Self {
        match err {
            UploadStorageError::NotAnImage => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_UPLOAD,
                "Upload must be a PNG, JPEG, GIF or WebP image",
                None,
            ),
            UploadStorageError::EmptyPayload => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_UPLOAD,
                "Uploaded file is empty",
                None,
            ),
            UploadStorageError::InvalidPath => Self::not_found("Upload not found"),
            other => Self::internal(codes::INTERNAL, "Failed to store upload", &other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_tokens_are_gone() {
        let err = ApiError::from(AuthError::TokenExpired);
        assert_eq!(err.status(), StatusCode::GONE);
        assert_eq!(err.code(), codes::TOKEN_EXPIRED);
    }

    #[test]
    fn upstream_failures_are_bad_gateway() {
        let err = ApiError::from(SearchError::Integration(IntegrationError::Status {
            service: "tmdb",
            status: 500,
        }));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = ApiError::from(IntegrationError::not_configured("youtube"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn database_timeouts_are_unavailable() {
        let err = ApiError::from(ScheduleError::Repo(RepoError::Timeout));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), codes::DB_UNAVAILABLE);
    }

    #[test]
    fn internal_detail_stays_out_of_the_body() {
        let response =
            ApiError::internal(codes::INTERNAL, "Persistence error", "relation missing")
                .into_response();
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.messages, vec!["internal_error: relation missing"]);
    }
}

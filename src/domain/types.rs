//! Shared domain enumerations aligned with persisted database enums.
//!
//! The enums live in `creatorhub-api-types` so clients and the server agree on
//! their wire spelling; they derive `sqlx::Type` through that crate's `sqlx`
//! feature.

pub use creatorhub_api_types::{
    AnalyticsEventType, MediaSource, MediaType, SearchKind, SocialPlatform, UserRole, WatchStatus,
};

use serde::{Deserialize, Serialize};

/// Purpose of a one-time emailed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "auth_token_kind", rename_all = "snake_case")]
pub enum AuthTokenKind {
    PasswordReset,
    EmailVerification,
}

impl AuthTokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthTokenKind::PasswordReset => "password_reset",
            AuthTokenKind::EmailVerification => "email_verification",
        }
    }
}

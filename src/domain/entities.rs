//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{
    AnalyticsEventType, AuthTokenKind, MediaSource, MediaType, SocialPlatform, UserRole,
    WatchStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub role: UserRole,
    pub is_public: bool,
    pub show_watchlist: bool,
    pub show_schedule: bool,
    pub email_verified_at: Option<OffsetDateTime>,
    pub twitch_login: Option<String>,
    pub youtube_channel_id: Option<String>,
    #[serde(skip_serializing)]
    pub discord_webhook_url: Option<String>,
    pub youtube_subscribers: Option<i64>,
    pub youtube_views: Option<i64>,
    pub youtube_videos: Option<i64>,
    pub youtube_synced_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl UserRecord {
    /// Lower-cased username used for lookups and cache keys.
    pub fn handle(&self) -> String {
        self.username.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthTokenRecord {
    pub id: Uuid,
    pub kind: AuthTokenKind,
    pub email: String,
    pub token_hash: Vec<u8>,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRecord {
    pub id: Uuid,
    pub media_type: MediaType,
    pub source: MediaSource,
    pub external_id: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub total_seasons: Option<i32>,
    pub release_year: Option<i32>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaStatusRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: Uuid,
    pub status: WatchStatus,
    pub watched_seasons: Vec<i32>,
    pub rating: Option<i16>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A status row joined with the media it tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedMediaRecord {
    pub media: MediaRecord,
    pub status: MediaStatusRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleItemRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: Uuid,
    pub scheduled_at: OffsetDateTime,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub notes: Option<String>,
    pub completed_at: Option<OffsetDateTime>,
    pub announced_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// A schedule item joined with its media.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntryRecord {
    pub item: ScheduleItemRecord,
    pub media: MediaRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowRecord {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// A follower edge joined with the follower's public identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowerRecord {
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub followed_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialItemRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: SocialPlatform,
    pub url: String,
    pub label: Option<String>,
    pub position: i32,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SponsorRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub url: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub position: i32,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEventRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: AnalyticsEventType,
    pub target: Option<String>,
    pub referrer: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalyticsCount {
    pub event_type: AnalyticsEventType,
    pub count: i64,
}

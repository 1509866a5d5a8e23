//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    AnalyticsCount, AnalyticsEventRecord, AuthTokenRecord, FollowerRecord, MediaRecord,
    MediaStatusRecord, ScheduleEntryRecord, ScheduleItemRecord, SessionRecord, SocialItemRecord,
    SponsorRecord, TrackedMediaRecord, UserRecord,
};
use crate::domain::types::{
    AnalyticsEventType, AuthTokenKind, MediaSource, MediaType, SocialPlatform, UserRole,
    WatchStatus,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Whether this is a unique violation on a constraint whose name contains `needle`.
    pub fn is_duplicate_of(&self, needle: &str) -> bool {
        matches!(self, RepoError::Duplicate { constraint } if constraint.contains(needle))
    }
}

// ---------------------------------------------------------------------------
// Users, sessions and tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Full replacement of the user-editable profile columns.
#[derive(Debug, Clone)]
pub struct UpdateProfileParams {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub is_public: bool,
    pub show_watchlist: bool,
    pub show_schedule: bool,
    pub twitch_login: Option<String>,
    pub youtube_channel_id: Option<String>,
    pub discord_webhook_url: Option<String>,
}

impl From<&UserRecord> for UpdateProfileParams {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            avatar_url: user.avatar_url.clone(),
            banner_url: user.banner_url.clone(),
            is_public: user.is_public,
            show_watchlist: user.show_watchlist,
            show_schedule: user.show_schedule,
            twitch_login: user.twitch_login.clone(),
            youtube_channel_id: user.youtube_channel_id.clone(),
            discord_webhook_url: user.discord_webhook_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    pub subscribers: i64,
    pub views: i64,
    pub videos: i64,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    /// Case-insensitive lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn update_profile(&self, params: UpdateProfileParams) -> Result<UserRecord, RepoError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError>;

    async fn mark_email_verified(
        &self,
        id: Uuid,
        verified_at: OffsetDateTime,
    ) -> Result<(), RepoError>;

    async fn list_youtube_linked(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn update_channel_stats(
        &self,
        id: Uuid,
        stats: ChannelStats,
        synced_at: OffsetDateTime,
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn create_session(&self, session: SessionRecord) -> Result<(), RepoError>;

    async fn find_session(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>, RepoError>;

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), RepoError>;

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<u64, RepoError>;

    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct IssueTokenParams {
    pub kind: AuthTokenKind,
    pub email: String,
    pub token_hash: Vec<u8>,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait AuthTokensRepo: Send + Sync {
    /// Delete every token of the same kind for the email, then store the new one.
    async fn replace_token(&self, params: IssueTokenParams) -> Result<AuthTokenRecord, RepoError>;

    /// Delete the matching token and return it; at most one caller gets `Some`.
    async fn consume_token(
        &self,
        kind: AuthTokenKind,
        token_hash: &[u8],
    ) -> Result<Option<AuthTokenRecord>, RepoError>;

    async fn purge_expired_tokens(&self, now: OffsetDateTime) -> Result<u64, RepoError>;
}

// ---------------------------------------------------------------------------
// Media tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UpsertMediaParams {
    pub media_type: MediaType,
    pub source: MediaSource,
    pub external_id: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub total_seasons: Option<i32>,
    pub release_year: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedMediaFilter {
    pub media_type: Option<MediaType>,
    pub status: Option<WatchStatus>,
}

#[async_trait]
pub trait MediaRepo: Send + Sync {
    /// Insert or refresh the catalogue row identified by (source, type, external id).
    async fn upsert_media(&self, params: UpsertMediaParams) -> Result<MediaRecord, RepoError>;

    async fn find_media(&self, id: Uuid) -> Result<Option<MediaRecord>, RepoError>;

    /// Create the user's status row, or overwrite its status when `status` is given.
    async fn track(
        &self,
        user_id: Uuid,
        media_id: Uuid,
        status: Option<WatchStatus>,
    ) -> Result<MediaStatusRecord, RepoError>;

    async fn find_tracked(
        &self,
        user_id: Uuid,
        media_id: Uuid,
    ) -> Result<Option<TrackedMediaRecord>, RepoError>;

    async fn list_tracked(
        &self,
        user_id: Uuid,
        filter: TrackedMediaFilter,
    ) -> Result<Vec<TrackedMediaRecord>, RepoError>;

    /// Persist status, watched seasons and rating of an existing row.
    async fn save_status(&self, status: &MediaStatusRecord)
    -> Result<MediaStatusRecord, RepoError>;

    async fn untrack(&self, user_id: Uuid, media_id: Uuid) -> Result<bool, RepoError>;
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateScheduleParams {
    pub user_id: Uuid,
    pub media_id: Uuid,
    pub scheduled_at: OffsetDateTime,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub notes: Option<String>,
}

#[async_trait]
pub trait ScheduleRepo: Send + Sync {
    async fn create_item(&self, params: CreateScheduleParams)
    -> Result<ScheduleItemRecord, RepoError>;

    async fn find_entry(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ScheduleEntryRecord>, RepoError>;

    /// Items with `start <= scheduled_at < end`, ordered by time.
    async fn list_between(
        &self,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ScheduleEntryRecord>, RepoError>;

    /// Earliest uncompleted item at or after `after`.
    async fn next_upcoming(
        &self,
        user_id: Uuid,
        after: OffsetDateTime,
    ) -> Result<Option<ScheduleEntryRecord>, RepoError>;

    async fn delete_item(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError>;

    async fn mark_completed(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError>;

    async fn mark_announced(&self, ids: &[Uuid], at: OffsetDateTime) -> Result<u64, RepoError>;
}

// ---------------------------------------------------------------------------
// Follows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowCounts {
    pub followers: i64,
    pub following: i64,
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Returns whether a new edge was created.
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, RepoError>;

    /// Returns whether an edge was removed.
    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, RepoError>;

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid)
    -> Result<bool, RepoError>;

    async fn counts(&self, user_id: Uuid) -> Result<FollowCounts, RepoError>;

    async fn list_followers(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<FollowerRecord>, RepoError>;
}

// ---------------------------------------------------------------------------
// Sponsors and socials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SponsorParams {
    pub name: String,
    pub url: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub position: i32,
    pub active: bool,
}

#[async_trait]
pub trait SponsorsRepo: Send + Sync {
    async fn list_sponsors(
        &self,
        user_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<SponsorRecord>, RepoError>;

    async fn find_sponsor(&self, user_id: Uuid, id: Uuid)
    -> Result<Option<SponsorRecord>, RepoError>;

    async fn create_sponsor(
        &self,
        user_id: Uuid,
        params: SponsorParams,
    ) -> Result<SponsorRecord, RepoError>;

    async fn update_sponsor(
        &self,
        user_id: Uuid,
        id: Uuid,
        params: SponsorParams,
    ) -> Result<SponsorRecord, RepoError>;

    async fn delete_sponsor(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct SocialParams {
    pub platform: SocialPlatform,
    pub url: String,
    pub label: Option<String>,
    pub position: i32,
}

#[async_trait]
pub trait SocialsRepo: Send + Sync {
    async fn list_socials(&self, user_id: Uuid) -> Result<Vec<SocialItemRecord>, RepoError>;

    async fn find_social(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SocialItemRecord>, RepoError>;

    async fn create_social(
        &self,
        user_id: Uuid,
        params: SocialParams,
    ) -> Result<SocialItemRecord, RepoError>;

    async fn update_social(
        &self,
        user_id: Uuid,
        id: Uuid,
        params: SocialParams,
    ) -> Result<SocialItemRecord, RepoError>;

    async fn delete_social(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError>;
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordEventParams {
    pub user_id: Uuid,
    pub event_type: AnalyticsEventType,
    pub target: Option<String>,
    pub referrer: Option<String>,
}

#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn record_event(
        &self,
        params: RecordEventParams,
    ) -> Result<AnalyticsEventRecord, RepoError>;

    async fn count_since(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<AnalyticsCount>, RepoError>;
}

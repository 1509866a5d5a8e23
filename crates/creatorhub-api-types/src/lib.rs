//! Request and response types shared by the creatorhub server and its clients.
//!
//! Enums optionally derive `sqlx::Type` (feature `sqlx`) so the server can bind
//! them directly to the Postgres enum types declared in its migrations.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
pub enum UserRole {
    User,
    Creator,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_type", rename_all = "snake_case")
)]
pub enum MediaType {
    Movie,
    Series,
    Anime,
    Game,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
            MediaType::Anime => "anime",
            MediaType::Game => "game",
        }
    }

    /// Whether progress on this media is tracked per season.
    pub fn has_seasons(&self) -> bool {
        matches!(self, MediaType::Series | MediaType::Anime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_source", rename_all = "snake_case")
)]
pub enum MediaSource {
    Tmdb,
    Jikan,
    Igdb,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "watch_status", rename_all = "snake_case")
)]
pub enum WatchStatus {
    Planned,
    Watching,
    Watched,
    Dropped,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Planned => "planned",
            WatchStatus::Watching => "watching",
            WatchStatus::Watched => "watched",
            WatchStatus::Dropped => "dropped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "social_platform", rename_all = "snake_case")
)]
pub enum SocialPlatform {
    Twitch,
    Youtube,
    Twitter,
    Instagram,
    Tiktok,
    Discord,
    Website,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "analytics_event_type", rename_all = "snake_case")
)]
pub enum AnalyticsEventType {
    ProfileView,
    LinkClick,
    OverlayView,
}

impl AnalyticsEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEventType::ProfileView => "profile_view",
            AnalyticsEventType::LinkClick => "link_click",
            AnalyticsEventType::OverlayView => "overlay_view",
        }
    }
}

/// Catalogue searched by `/api/search/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Movie,
    Series,
    Anime,
    Game,
}

impl SearchKind {
    /// Parses a `/api/search/{kind}` path segment; `tv` is an alias of `series`.
    pub fn from_path(raw: &str) -> Option<Self> {
        match raw {
            "movie" => Some(SearchKind::Movie),
            "series" | "tv" => Some(SearchKind::Series),
            "anime" => Some(SearchKind::Anime),
            "game" => Some(SearchKind::Game),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Movie => "movie",
            SearchKind::Series => "series",
            SearchKind::Anime => "anime",
            SearchKind::Game => "game",
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            SearchKind::Movie => MediaType::Movie,
            SearchKind::Series => MediaType::Series,
            SearchKind::Anime => MediaType::Anime,
            SearchKind::Game => MediaType::Game,
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address or username.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub role: UserRole,
    pub is_public: bool,
    pub show_watchlist: bool,
    pub show_schedule: bool,
    pub email_verified: bool,
    pub twitch_login: Option<String>,
    pub youtube_channel_id: Option<String>,
    pub has_discord_webhook: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Partial profile update; absent fields are left unchanged.
///
/// Nullable text fields accept an empty string to clear the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub is_public: Option<bool>,
    pub show_watchlist: Option<bool>,
    pub show_schedule: Option<bool>,
    pub twitch_login: Option<String>,
    pub youtube_channel_id: Option<String>,
    pub discord_webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStatsView {
    pub subscribers: i64,
    pub views: i64,
    pub videos: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub synced_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfileView {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub role: UserRole,
    pub twitch_login: Option<String>,
    pub youtube: Option<ChannelStatsView>,
    pub followers: i64,
    pub following: i64,
    pub socials: Vec<SocialItemView>,
    pub show_watchlist: bool,
    pub show_schedule: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

// ============================================================================
// Media tracker
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMediaRequest {
    pub media_type: MediaType,
    pub source: MediaSource,
    pub external_id: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub total_seasons: Option<i32>,
    pub release_year: Option<i32>,
    pub status: Option<WatchStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaUpdateRequest {
    pub status: Option<WatchStatus>,
    pub rating: Option<i16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonProgressRequest {
    pub watched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaView {
    pub id: Uuid,
    pub media_type: MediaType,
    pub source: MediaSource,
    pub external_id: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub total_seasons: Option<i32>,
    pub release_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedMediaView {
    pub media: MediaView,
    pub status: WatchStatus,
    pub watched_seasons: Vec<i32>,
    pub rating: Option<i16>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

// ============================================================================
// Schedule
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCreateRequest {
    pub media_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub notes: Option<String>,
    #[serde(default)]
    pub announce: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleItemView {
    pub id: Uuid,
    pub media: MediaView,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub announced_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekScheduleView {
    pub week_offset: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub week_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub week_end: OffsetDateTime,
    pub items: Vec<ScheduleItemView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementResponse {
    pub announced: usize,
}

// ============================================================================
// Follows
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FollowStateView {
    pub following: bool,
    pub followers: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FollowCountsView {
    pub followers: i64,
    pub following: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerView {
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub followed_at: OffsetDateTime,
}

// ============================================================================
// Sponsors & socials
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorCreateRequest {
    pub name: String,
    pub url: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SponsorUpdateRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorView {
    pub id: Uuid,
    pub name: String,
    pub url: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub position: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialCreateRequest {
    pub platform: SocialPlatform,
    pub url: String,
    pub label: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialUpdateRequest {
    pub platform: Option<SocialPlatform>,
    pub url: Option<String>,
    pub label: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialItemView {
    pub id: Uuid,
    pub platform: SocialPlatform,
    pub url: String,
    pub label: Option<String>,
    pub position: i32,
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEventRequest {
    pub username: String,
    pub event_type: AnalyticsEventType,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsCountView {
    pub event_type: AnalyticsEventType,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummaryView {
    pub days: u32,
    pub total: i64,
    pub counts: Vec<AnalyticsCountView>,
}

// ============================================================================
// Integrations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultView {
    pub source: MediaSource,
    pub external_id: String,
    pub media_type: MediaType,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_year: Option<i32>,
    pub total_seasons: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStatusView {
    pub login: String,
    pub live: bool,
    pub title: Option<String>,
    pub game_name: Option<String>,
    pub viewer_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReportView {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

// ============================================================================
// Overlay
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayScheduleEntry {
    pub title: String,
    pub media_type: MediaType,
    pub poster_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    pub season: Option<i32>,
    pub episode: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayWatchingEntry {
    pub title: String,
    pub media_type: MediaType,
    pub poster_url: Option<String>,
    pub watched_seasons: usize,
    pub total_seasons: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlaySponsorEntry {
    pub name: String,
    pub logo_url: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayView {
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub live: bool,
    pub next_up: Option<OverlayScheduleEntry>,
    pub watching: Vec<OverlayWatchingEntry>,
    pub sponsors: Vec<OverlaySponsorEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

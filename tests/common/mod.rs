#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, header};
use http_body_util::BodyExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use time::OffsetDateTime;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use creatorhub::application::auth::AuthConfig;
use creatorhub::application::ports::{
    Announcement, Announcer, ChannelStatsSource, IntegrationError, LiveStatusSource, Mailer,
    MediaCatalog, OutgoingEmail,
};
use creatorhub::application::repos::{
    AnalyticsRepo, AuthTokensRepo, ChannelStats, CreateScheduleParams, CreateUserParams,
    FollowCounts, FollowsRepo, IssueTokenParams, MediaRepo, RecordEventParams, RepoError,
    ScheduleRepo, SessionsRepo, SocialParams, SocialsRepo, SponsorParams, SponsorsRepo,
    TrackedMediaFilter, UpdateProfileParams, UpsertMediaParams, UsersRepo,
};
use creatorhub::application::services::{Integrations, Repositories, Services};
use creatorhub::cache::{CacheConfig, CacheState};
use creatorhub::domain::entities::{
    AnalyticsCount, AnalyticsEventRecord, AuthTokenRecord, FollowRecord, FollowerRecord,
    MediaRecord, MediaStatusRecord, ScheduleEntryRecord, ScheduleItemRecord, SessionRecord,
    SocialItemRecord, SponsorRecord, TrackedMediaRecord, UserRecord,
};
use creatorhub::domain::types::{AuthTokenKind, SearchKind, WatchStatus};
use creatorhub::infra::http::{
    HealthProbe, HttpConfig, HttpState, InMemoryRateLimiter, build_router,
};
use creatorhub::infra::uploads::UploadStorage;
use creatorhub_api_types::{LiveStatusView, MediaSource, SearchResultView};

pub const CRON_SECRET: &str = "cron-test-secret";
pub const PASSWORD: &str = "correct horse battery";

// ---------------------------------------------------------------------------
// In-memory persistence
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    sessions: Vec<SessionRecord>,
    tokens: Vec<AuthTokenRecord>,
    media: Vec<MediaRecord>,
    statuses: Vec<MediaStatusRecord>,
    schedule: Vec<ScheduleItemRecord>,
    follows: Vec<FollowRecord>,
    sponsors: Vec<SponsorRecord>,
    socials: Vec<SocialItemRecord>,
    events: Vec<AnalyticsEventRecord>,
}

impl Tables {
    fn joined(&self, status: &MediaStatusRecord) -> Option<TrackedMediaRecord> {
        self.media
            .iter()
            .find(|media| media.id == status.media_id)
            .map(|media| TrackedMediaRecord {
                media: media.clone(),
                status: status.clone(),
            })
    }

    fn entry(&self, item: &ScheduleItemRecord) -> Option<ScheduleEntryRecord> {
        self.media
            .iter()
            .find(|media| media.id == item.media_id)
            .map(|media| ScheduleEntryRecord {
                item: item.clone(),
                media: media.clone(),
            })
    }
}

/// Implements every repository trait over plain vectors.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// Number of `list_tracked` calls, used to observe cache hits.
    pub tracked_reads: AtomicUsize,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("store lock poisoned")
    }

    pub fn tracked_reads(&self) -> usize {
        self.tracked_reads.load(Ordering::SeqCst)
    }

    pub fn user_id(&self, username: &str) -> Uuid {
        self.tables()
            .users
            .iter()
            .find(|user| user.username.eq_ignore_ascii_case(username))
            .map(|user| user.id)
            .expect("user exists")
    }

    /// Move every outstanding auth token's expiry into the past.
    pub fn expire_tokens(&self) {
        let past = OffsetDateTime::now_utc() - time::Duration::minutes(1);
        for token in &mut self.tables().tokens {
            token.expires_at = past;
        }
    }

    pub fn link_youtube(&self, username: &str, channel_id: &str) {
        let mut tables = self.tables();
        let user = tables
            .users
            .iter_mut()
            .find(|user| user.username.eq_ignore_ascii_case(username))
            .expect("user exists");
        user.youtube_channel_id = Some(channel_id.to_string());
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables();
        if tables
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(&params.username))
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_lower_key".to_string(),
            });
        }
        if tables.users.iter().any(|u| u.email == params.email) {
            return Err(RepoError::Duplicate {
                constraint: "users_email_key".to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            email: params.email,
            password_hash: params.password_hash,
            display_name: None,
            bio: None,
            avatar_url: None,
            banner_url: None,
            role: params.role,
            is_public: true,
            show_watchlist: true,
            show_schedule: true,
            email_verified_at: None,
            twitch_login: None,
            youtube_channel_id: None,
            discord_webhook_url: None,
            youtube_subscribers: None,
            youtube_views: None,
            youtube_videos: None,
            youtube_synced_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, params: UpdateProfileParams) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables();
        if tables
            .users
            .iter()
            .any(|u| u.id != params.id && u.username.eq_ignore_ascii_case(&params.username))
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_lower_key".to_string(),
            });
        }
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == params.id)
            .ok_or(RepoError::NotFound)?;
        user.username = params.username;
        user.display_name = params.display_name;
        user.bio = params.bio;
        user.avatar_url = params.avatar_url;
        user.banner_url = params.banner_url;
        user.is_public = params.is_public;
        user.show_watchlist = params.show_watchlist;
        user.show_schedule = params.show_schedule;
        user.twitch_login = params.twitch_login;
        user.youtube_channel_id = params.youtube_channel_id;
        user.discord_webhook_url = params.discord_webhook_url;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepoError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        id: Uuid,
        verified_at: OffsetDateTime,
    ) -> Result<(), RepoError> {
        let mut tables = self.tables();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.email_verified_at = Some(verified_at);
        }
        Ok(())
    }

    async fn list_youtube_linked(&self) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self
            .tables()
            .users
            .iter()
            .filter(|u| u.youtube_channel_id.is_some())
            .cloned()
            .collect())
    }

    async fn update_channel_stats(
        &self,
        id: Uuid,
        stats: ChannelStats,
        synced_at: OffsetDateTime,
    ) -> Result<(), RepoError> {
        let mut tables = self.tables();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.youtube_subscribers = Some(stats.subscribers);
            user.youtube_views = Some(stats.views);
            user.youtube_videos = Some(stats.videos);
            user.youtube_synced_at = Some(synced_at);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionsRepo for MemoryStore {
    async fn create_session(&self, session: SessionRecord) -> Result<(), RepoError> {
        self.tables().sessions.push(session);
        Ok(())
    }

    async fn find_session(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>, RepoError> {
        Ok(self
            .tables()
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), RepoError> {
        self.tables().sessions.retain(|s| s.token_hash != token_hash);
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let mut tables = self.tables();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.user_id != user_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let mut tables = self.tables();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait]
impl AuthTokensRepo for MemoryStore {
    async fn replace_token(&self, params: IssueTokenParams) -> Result<AuthTokenRecord, RepoError> {
        let mut tables = self.tables();
        tables
            .tokens
            .retain(|t| !(t.kind == params.kind && t.email == params.email));
        let record = AuthTokenRecord {
            id: Uuid::new_v4(),
            kind: params.kind,
            email: params.email,
            token_hash: params.token_hash,
            expires_at: params.expires_at,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.tokens.push(record.clone());
        Ok(record)
    }

    async fn consume_token(
        &self,
        kind: AuthTokenKind,
        token_hash: &[u8],
    ) -> Result<Option<AuthTokenRecord>, RepoError> {
        let mut tables = self.tables();
        let position = tables
            .tokens
            .iter()
            .position(|t| t.kind == kind && t.token_hash == token_hash);
        Ok(position.map(|index| tables.tokens.remove(index)))
    }

    async fn purge_expired_tokens(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let mut tables = self.tables();
        let before = tables.tokens.len();
        tables.tokens.retain(|t| t.expires_at > now);
        Ok((before - tables.tokens.len()) as u64)
    }
}

#[async_trait]
impl MediaRepo for MemoryStore {
    async fn upsert_media(&self, params: UpsertMediaParams) -> Result<MediaRecord, RepoError> {
        let mut tables = self.tables();
        if let Some(existing) = tables.media.iter_mut().find(|m| {
            m.source == params.source
                && m.media_type == params.media_type
                && m.external_id == params.external_id
        }) {
            existing.title = params.title;
            existing.poster_url = params.poster_url;
            existing.total_seasons = params.total_seasons;
            existing.release_year = params.release_year;
            return Ok(existing.clone());
        }

        let media = MediaRecord {
            id: Uuid::new_v4(),
            media_type: params.media_type,
            source: params.source,
            external_id: params.external_id,
            title: params.title,
            poster_url: params.poster_url,
            total_seasons: params.total_seasons,
            release_year: params.release_year,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.media.push(media.clone());
        Ok(media)
    }

    async fn find_media(&self, id: Uuid) -> Result<Option<MediaRecord>, RepoError> {
        Ok(self.tables().media.iter().find(|m| m.id == id).cloned())
    }

    async fn track(
        &self,
        user_id: Uuid,
        media_id: Uuid,
        status: Option<WatchStatus>,
    ) -> Result<MediaStatusRecord, RepoError> {
        let mut tables = self.tables();
        let now = OffsetDateTime::now_utc();
        if let Some(existing) = tables
            .statuses
            .iter_mut()
            .find(|s| s.user_id == user_id && s.media_id == media_id)
        {
            if let Some(status) = status {
                existing.status = status;
                existing.updated_at = now;
            }
            return Ok(existing.clone());
        }

        let record = MediaStatusRecord {
            id: Uuid::new_v4(),
            user_id,
            media_id,
            status: status.unwrap_or(WatchStatus::Planned),
            watched_seasons: Vec::new(),
            rating: None,
            created_at: now,
            updated_at: now,
        };
        tables.statuses.push(record.clone());
        Ok(record)
    }

    async fn find_tracked(
        &self,
        user_id: Uuid,
        media_id: Uuid,
    ) -> Result<Option<TrackedMediaRecord>, RepoError> {
        let tables = self.tables();
        Ok(tables
            .statuses
            .iter()
            .find(|s| s.user_id == user_id && s.media_id == media_id)
            .and_then(|status| tables.joined(status)))
    }

    async fn list_tracked(
        &self,
        user_id: Uuid,
        filter: TrackedMediaFilter,
    ) -> Result<Vec<TrackedMediaRecord>, RepoError> {
        self.tracked_reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        let mut tracked: Vec<_> = tables
            .statuses
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| filter.status.is_none_or(|status| s.status == status))
            .filter_map(|status| tables.joined(status))
            .filter(|t| {
                filter
                    .media_type
                    .is_none_or(|media_type| t.media.media_type == media_type)
            })
            .collect();
        tracked.sort_by(|a, b| b.status.updated_at.cmp(&a.status.updated_at));
        Ok(tracked)
    }

    async fn save_status(
        &self,
        status: &MediaStatusRecord,
    ) -> Result<MediaStatusRecord, RepoError> {
        let mut tables = self.tables();
        let existing = tables
            .statuses
            .iter_mut()
            .find(|s| s.id == status.id)
            .ok_or(RepoError::NotFound)?;
        existing.status = status.status;
        existing.watched_seasons = status.watched_seasons.clone();
        existing.rating = status.rating;
        existing.updated_at = OffsetDateTime::now_utc();
        Ok(existing.clone())
    }

    async fn untrack(&self, user_id: Uuid, media_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables();
        let before = tables.statuses.len();
        tables
            .statuses
            .retain(|s| !(s.user_id == user_id && s.media_id == media_id));
        Ok(tables.statuses.len() < before)
    }
}

#[async_trait]
impl ScheduleRepo for MemoryStore {
    async fn create_item(
        &self,
        params: CreateScheduleParams,
    ) -> Result<ScheduleItemRecord, RepoError> {
        let item = ScheduleItemRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            media_id: params.media_id,
            scheduled_at: params.scheduled_at,
            season: params.season,
            episode: params.episode,
            notes: params.notes,
            completed_at: None,
            announced_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables().schedule.push(item.clone());
        Ok(item)
    }

    async fn find_entry(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ScheduleEntryRecord>, RepoError> {
        let tables = self.tables();
        Ok(tables
            .schedule
            .iter()
            .find(|item| item.user_id == user_id && item.id == id)
            .and_then(|item| tables.entry(item)))
    }

    async fn list_between(
        &self,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ScheduleEntryRecord>, RepoError> {
        let tables = self.tables();
        let mut entries: Vec<_> = tables
            .schedule
            .iter()
            .filter(|item| {
                item.user_id == user_id && item.scheduled_at >= start && item.scheduled_at < end
            })
            .filter_map(|item| tables.entry(item))
            .collect();
        entries.sort_by_key(|entry| entry.item.scheduled_at);
        Ok(entries)
    }

    async fn next_upcoming(
        &self,
        user_id: Uuid,
        after: OffsetDateTime,
    ) -> Result<Option<ScheduleEntryRecord>, RepoError> {
        let tables = self.tables();
        Ok(tables
            .schedule
            .iter()
            .filter(|item| {
                item.user_id == user_id && item.completed_at.is_none() && item.scheduled_at >= after
            })
            .min_by_key(|item| item.scheduled_at)
            .and_then(|item| tables.entry(item)))
    }

    async fn delete_item(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables();
        let before = tables.schedule.len();
        tables
            .schedule
            .retain(|item| !(item.user_id == user_id && item.id == id));
        Ok(tables.schedule.len() < before)
    }

    async fn mark_completed(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        let mut tables = self.tables();
        if let Some(item) = tables.schedule.iter_mut().find(|item| item.id == id) {
            item.completed_at = Some(at);
        }
        Ok(())
    }

    async fn mark_announced(&self, ids: &[Uuid], at: OffsetDateTime) -> Result<u64, RepoError> {
        let mut tables = self.tables();
        let mut updated = 0;
        for item in tables.schedule.iter_mut().filter(|item| ids.contains(&item.id)) {
            item.announced_at = Some(at);
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl FollowsRepo for MemoryStore {
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables();
        if tables
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Ok(false);
        }
        tables.follows.push(FollowRecord {
            follower_id,
            following_id,
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(true)
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables();
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.following_id == following_id));
        Ok(tables.follows.len() < before)
    }

    async fn is_following(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<bool, RepoError> {
        Ok(self
            .tables()
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id))
    }

    async fn counts(&self, user_id: Uuid) -> Result<FollowCounts, RepoError> {
        let tables = self.tables();
        Ok(FollowCounts {
            followers: tables
                .follows
                .iter()
                .filter(|f| f.following_id == user_id)
                .count() as i64,
            following: tables
                .follows
                .iter()
                .filter(|f| f.follower_id == user_id)
                .count() as i64,
        })
    }

    async fn list_followers(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<FollowerRecord>, RepoError> {
        let tables = self.tables();
        let mut followers: Vec<_> = tables
            .follows
            .iter()
            .filter(|f| f.following_id == user_id)
            .filter_map(|f| {
                tables
                    .users
                    .iter()
                    .find(|u| u.id == f.follower_id)
                    .map(|u| FollowerRecord {
                        username: u.username.clone(),
                        display_name: u.display_name.clone(),
                        avatar_url: u.avatar_url.clone(),
                        followed_at: f.created_at,
                    })
            })
            .collect();
        followers.sort_by(|a, b| b.followed_at.cmp(&a.followed_at));
        followers.truncate(limit as usize);
        Ok(followers)
    }
}

#[async_trait]
impl SponsorsRepo for MemoryStore {
    async fn list_sponsors(
        &self,
        user_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<SponsorRecord>, RepoError> {
        let mut sponsors: Vec<_> = self
            .tables()
            .sponsors
            .iter()
            .filter(|s| s.user_id == user_id && (!active_only || s.active))
            .cloned()
            .collect();
        sponsors.sort_by_key(|s| (s.position, s.created_at));
        Ok(sponsors)
    }

    async fn find_sponsor(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SponsorRecord>, RepoError> {
        Ok(self
            .tables()
            .sponsors
            .iter()
            .find(|s| s.user_id == user_id && s.id == id)
            .cloned())
    }

    async fn create_sponsor(
        &self,
        user_id: Uuid,
        params: SponsorParams,
    ) -> Result<SponsorRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let sponsor = SponsorRecord {
            id: Uuid::new_v4(),
            user_id,
            name: params.name,
            url: params.url,
            logo_url: params.logo_url,
            description: params.description,
            position: params.position,
            active: params.active,
            created_at: now,
            updated_at: now,
        };
        self.tables().sponsors.push(sponsor.clone());
        Ok(sponsor)
    }

    async fn update_sponsor(
        &self,
        user_id: Uuid,
        id: Uuid,
        params: SponsorParams,
    ) -> Result<SponsorRecord, RepoError> {
        let mut tables = self.tables();
        let sponsor = tables
            .sponsors
            .iter_mut()
            .find(|s| s.user_id == user_id && s.id == id)
            .ok_or(RepoError::NotFound)?;
        sponsor.name = params.name;
        sponsor.url = params.url;
        sponsor.logo_url = params.logo_url;
        sponsor.description = params.description;
        sponsor.position = params.position;
        sponsor.active = params.active;
        sponsor.updated_at = OffsetDateTime::now_utc();
        Ok(sponsor.clone())
    }

    async fn delete_sponsor(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables();
        let before = tables.sponsors.len();
        tables
            .sponsors
            .retain(|s| !(s.user_id == user_id && s.id == id));
        Ok(tables.sponsors.len() < before)
    }
}

#[async_trait]
impl SocialsRepo for MemoryStore {
    async fn list_socials(&self, user_id: Uuid) -> Result<Vec<SocialItemRecord>, RepoError> {
        let mut socials: Vec<_> = self
            .tables()
            .socials
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        socials.sort_by_key(|s| (s.position, s.created_at));
        Ok(socials)
    }

    async fn find_social(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SocialItemRecord>, RepoError> {
        Ok(self
            .tables()
            .socials
            .iter()
            .find(|s| s.user_id == user_id && s.id == id)
            .cloned())
    }

    async fn create_social(
        &self,
        user_id: Uuid,
        params: SocialParams,
    ) -> Result<SocialItemRecord, RepoError> {
        let social = SocialItemRecord {
            id: Uuid::new_v4(),
            user_id,
            platform: params.platform,
            url: params.url,
            label: params.label,
            position: params.position,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables().socials.push(social.clone());
        Ok(social)
    }

    async fn update_social(
        &self,
        user_id: Uuid,
        id: Uuid,
        params: SocialParams,
    ) -> Result<SocialItemRecord, RepoError> {
        let mut tables = self.tables();
        let social = tables
            .socials
            .iter_mut()
            .find(|s| s.user_id == user_id && s.id == id)
            .ok_or(RepoError::NotFound)?;
        social.platform = params.platform;
        social.url = params.url;
        social.label = params.label;
        social.position = params.position;
        Ok(social.clone())
    }

    async fn delete_social(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables();
        let before = tables.socials.len();
        tables.socials.retain(|s| !(s.user_id == user_id && s.id == id));
        Ok(tables.socials.len() < before)
    }
}

#[async_trait]
impl AnalyticsRepo for MemoryStore {
    async fn record_event(
        &self,
        params: RecordEventParams,
    ) -> Result<AnalyticsEventRecord, RepoError> {
        let event = AnalyticsEventRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            event_type: params.event_type,
            target: params.target,
            referrer: params.referrer,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables().events.push(event.clone());
        Ok(event)
    }

    async fn count_since(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<AnalyticsCount>, RepoError> {
        let tables = self.tables();
        let mut counts: Vec<AnalyticsCount> = Vec::new();
        for event in tables
            .events
            .iter()
            .filter(|e| e.user_id == user_id && e.created_at >= since)
        {
            match counts.iter_mut().find(|c| c.event_type == event.event_type) {
                Some(count) => count.count += 1,
                None => counts.push(AnalyticsCount {
                    event_type: event.event_type,
                    count: 1,
                }),
            }
        }
        Ok(counts)
    }
}

// ---------------------------------------------------------------------------
// Integration fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCatalog {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MediaCatalog for FakeCatalog {
    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
    ) -> Result<Vec<SearchResultView>, IntegrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![SearchResultView {
            source: MediaSource::Tmdb,
            external_id: "1399".to_string(),
            media_type: kind.media_type(),
            title: format!("{query} result"),
            poster_url: None,
            release_year: Some(2011),
            total_seasons: Some(8),
        }])
    }
}

pub struct FakeLive;

#[async_trait]
impl LiveStatusSource for FakeLive {
    async fn live_status(&self, login: &str) -> Result<LiveStatusView, IntegrationError> {
        Ok(LiveStatusView {
            login: login.to_string(),
            live: login == "live_streamer",
            title: None,
            game_name: None,
            viewer_count: None,
        })
    }
}

pub struct FakeChannelStats;

#[async_trait]
impl ChannelStatsSource for FakeChannelStats {
    async fn channel_stats(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelStats>, IntegrationError> {
        if channel_id.ends_with("missing") {
            return Ok(None);
        }
        Ok(Some(ChannelStats {
            subscribers: 1_200,
            views: 98_000,
            videos: 42,
        }))
    }
}

#[derive(Default)]
pub struct RecordingAnnouncer {
    sent: Mutex<Vec<(String, Announcement)>>,
}

impl RecordingAnnouncer {
    pub fn sent(&self) -> Vec<(String, Announcement)> {
        self.sent.lock().expect("announcer lock").clone()
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn announce(
        &self,
        webhook_url: &str,
        announcement: &Announcement,
    ) -> Result<(), IntegrationError> {
        self.sent
            .lock()
            .expect("announcer lock")
            .push((webhook_url.to_string(), announcement.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().expect("mailer lock").clone()
    }

    /// The `token=` query value from the latest email sent to `to`.
    pub fn last_token_for(&self, to: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|email| email.to == to)
            .and_then(|email| {
                let (_, rest) = email.body.split_once("token=")?;
                Some(
                    rest.chars()
                        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                        .collect(),
                )
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError> {
        self.sent.lock().expect("mailer lock").push(email.clone());
        Ok(())
    }
}

struct AlwaysHealthy;

#[async_trait]
impl HealthProbe for AlwaysHealthy {
    async fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Application harness
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub catalog: Arc<FakeCatalog>,
    pub announcer: Arc<RecordingAnnouncer>,
    pub mailer: Arc<RecordingMailer>,
    _uploads: TempDir,
}

pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|err| {
            panic!(
                "invalid json body ({err}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn error_code(&self) -> String {
        let value: serde_json::Value = self.json();
        value["error"]["code"]
            .as_str()
            .expect("error code")
            .to_string()
    }

    /// `name=value` of the session cookie set by this response.
    pub fn session_cookie(&self) -> String {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("hub_session="))
            .and_then(|value| value.split(';').next())
            .expect("session cookie")
            .to_string()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_search_limit(30)
    }

    pub fn with_search_limit(max_requests: u32) -> Self {
        let store = Arc::new(MemoryStore::default());
        let catalog = Arc::new(FakeCatalog::default());
        let announcer = Arc::new(RecordingAnnouncer::default());
        let mailer = Arc::new(RecordingMailer::default());

        let public_url = Url::parse("http://hub.test/").expect("url");
        let services = Services::new(
            Repositories::shared(store.clone()),
            Integrations {
                catalog: catalog.clone(),
                live: Arc::new(FakeLive),
                channel_stats: Arc::new(FakeChannelStats),
                announcer: announcer.clone(),
                mailer: mailer.clone(),
            },
            AuthConfig {
                session_ttl: Duration::from_secs(3_600),
                password_reset_ttl: Duration::from_secs(3_600),
                email_verification_ttl: Duration::from_secs(3_600),
                public_url: public_url.clone(),
            },
            None,
            CacheState::new(CacheConfig::default()),
        );

        let uploads_dir = tempfile::tempdir().expect("tempdir");
        let uploads =
            Arc::new(UploadStorage::new(uploads_dir.path().to_path_buf()).expect("uploads"));

        let state = HttpState {
            services,
            limiter: Arc::new(InMemoryRateLimiter::new(
                Duration::from_secs(60),
                max_requests,
            )),
            uploads,
            health: Arc::new(AlwaysHealthy),
            config: Arc::new(HttpConfig {
                public_url,
                cookie_secure: false,
                cron_secret: Some(CRON_SECRET.to_string()),
                upload_limit_bytes: 1024 * 1024,
                trusted_proxies: Vec::new(),
            }),
        };

        Self {
            router: build_router(state),
            store,
            catalog,
            announcer,
            mailer,
            _uploads: uploads_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response: Response<Body> = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, cookie, Body::empty())).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("DELETE", uri, cookie, Body::empty()))
            .await
    }

    pub async fn json<T: Serialize>(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: &T,
    ) -> TestResponse {
        let payload = serde_json::to_vec(body).expect("serialize body");
        let mut request = request(method, uri, cookie, Body::from(payload));
        request.headers_mut().insert(
            header::CONTENT_TYPE,
            "application/json".parse().expect("header"),
        );
        self.send(request).await
    }

    /// Register and log in; returns the session cookie pair.
    pub async fn sign_up(&self, username: &str) -> String {
        let email = format!("{}@example.com", username.to_lowercase());
        let registered = self
            .json(
                "POST",
                "/api/auth/register",
                None,
                &serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(registered.status, 201, "register {username}");

        let login = self
            .json(
                "POST",
                "/api/auth/login",
                None,
                &serde_json::json!({ "identifier": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(login.status, 200, "login {username}");
        login.session_cookie()
    }
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(body).expect("request")
}

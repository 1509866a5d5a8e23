//! Weekly stream schedule and Discord announcements.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use creatorhub_api_types::{
    AnnouncementResponse, ScheduleCreateRequest, ScheduleItemView, WeekScheduleView,
};

use crate::application::media::{MediaError, MediaService};
use crate::application::ports::{Announcement, AnnouncementItem, Announcer, IntegrationError};
use crate::application::repos::{CreateScheduleParams, RepoError, ScheduleRepo};
use crate::application::users::{PublicSection, UserDirectory};
use crate::application::views::schedule_item_view;
use crate::cache::{CacheSpec, CacheState};
use crate::domain::entities::{ScheduleEntryRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::validation;
use crate::domain::week::window_for;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule item not found")]
    NotFound,
    #[error("media not found")]
    MediaNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("no Discord webhook configured")]
    NoWebhook,
    #[error(transparent)]
    Announce(#[from] IntegrationError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<MediaError> for ScheduleError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::NotFound => ScheduleError::MediaNotFound,
            MediaError::UserNotFound => ScheduleError::UserNotFound,
            MediaError::Domain(err) => ScheduleError::Domain(err),
            MediaError::Repo(err) => ScheduleError::Repo(err),
        }
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    schedule: Arc<dyn ScheduleRepo>,
    media: MediaService,
    directory: UserDirectory,
    announcer: Arc<dyn Announcer>,
    default_webhook: Option<String>,
    cache: CacheState,
}

impl ScheduleService {
    pub fn new(
        schedule: Arc<dyn ScheduleRepo>,
        media: MediaService,
        directory: UserDirectory,
        announcer: Arc<dyn Announcer>,
        default_webhook: Option<String>,
        cache: CacheState,
    ) -> Self {
        Self {
            schedule,
            media,
            directory,
            announcer,
            default_webhook,
            cache,
        }
    }

    pub async fn create(
        &self,
        user: &UserRecord,
        request: ScheduleCreateRequest,
    ) -> Result<ScheduleItemView, ScheduleError> {
        let season = positive("season", request.season)?;
        let episode = positive("episode", request.episode)?;
        let notes =
            validation::optional_text("notes", request.notes.as_deref(), validation::NOTES_MAX)?;

        let (media, newly_tracked) = self.media.ensure_tracked(user.id, request.media_id).await?;
        let item = self
            .schedule
            .create_item(CreateScheduleParams {
                user_id: user.id,
                media_id: media.id,
                scheduled_at: request.scheduled_at,
                season,
                episode,
                notes,
            })
            .await?;

        if newly_tracked {
            self.cache
                .trigger
                .media_status_changed(user.id, &user.username);
        }
        self.cache.trigger.schedule_changed(user.id, &user.username);

        let mut entry = ScheduleEntryRecord { item, media };
        if request.announce {
            match self.announce_entries(user, std::slice::from_ref(&entry)).await {
                Ok(announced_at) => entry.item.announced_at = Some(announced_at),
                Err(err) => warn!(
                    target = "creatorhub::schedule",
                    error = %err,
                    item_id = %entry.item.id,
                    "Scheduled item created but announcement failed"
                ),
            }
        }

        Ok(schedule_item_view(&entry))
    }

    /// The caller's own week; shares the cached snapshot with the public view.
    pub async fn own_week(
        &self,
        user: &UserRecord,
        week_offset: i32,
    ) -> Result<WeekScheduleView, ScheduleError> {
        self.week(user.id, week_offset).await
    }

    pub async fn public_week(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        week_offset: i32,
    ) -> Result<WeekScheduleView, ScheduleError> {
        let user = self
            .directory
            .find_visible(username, viewer, PublicSection::Schedule)
            .await?
            .ok_or(ScheduleError::UserNotFound)?;
        self.week(user.id, week_offset).await
    }

    pub async fn delete(&self, user: &UserRecord, id: Uuid) -> Result<(), ScheduleError> {
        if !self.schedule.delete_item(user.id, id).await? {
            return Err(ScheduleError::NotFound);
        }
        self.cache.trigger.schedule_changed(user.id, &user.username);
        Ok(())
    }

    /// Stamp the item completed and advance the tracked progress.
    ///
    /// The two writes are independent; completing an already completed item is a no-op.
    pub async fn complete(
        &self,
        user: &UserRecord,
        id: Uuid,
    ) -> Result<ScheduleItemView, ScheduleError> {
        let mut entry = self
            .schedule
            .find_entry(user.id, id)
            .await?
            .ok_or(ScheduleError::NotFound)?;
        if entry.item.completed_at.is_some() {
            return Ok(schedule_item_view(&entry));
        }

        let now = OffsetDateTime::now_utc();
        self.schedule.mark_completed(id, now).await?;
        entry.item.completed_at = Some(now);
        self.cache.trigger.schedule_changed(user.id, &user.username);

        self.media
            .record_session(user.id, &entry.media, entry.item.season)
            .await?;
        self.cache
            .trigger
            .media_status_changed(user.id, &user.username);

        Ok(schedule_item_view(&entry))
    }

    pub async fn announce_item(
        &self,
        user: &UserRecord,
        id: Uuid,
    ) -> Result<AnnouncementResponse, ScheduleError> {
        let entry = self
            .schedule
            .find_entry(user.id, id)
            .await?
            .ok_or(ScheduleError::NotFound)?;
        self.announce_entries(user, std::slice::from_ref(&entry))
            .await?;
        Ok(AnnouncementResponse { announced: 1 })
    }

    /// Announce every uncompleted item of the week in one message.
    pub async fn announce_week(
        &self,
        user: &UserRecord,
        week_offset: i32,
    ) -> Result<AnnouncementResponse, ScheduleError> {
        let window = window_for(OffsetDateTime::now_utc(), week_offset)?;
        let entries: Vec<_> = self
            .schedule
            .list_between(user.id, window.start, window.end)
            .await?
            .into_iter()
            .filter(|entry| entry.item.completed_at.is_none())
            .collect();

        if entries.is_empty() {
            return Ok(AnnouncementResponse { announced: 0 });
        }
        self.announce_entries(user, &entries).await?;
        Ok(AnnouncementResponse {
            announced: entries.len(),
        })
    }

    async fn week(&self, user_id: Uuid, week_offset: i32) -> Result<WeekScheduleView, ScheduleError> {
        let window = window_for(OffsetDateTime::now_utc(), week_offset)?;
        let schedule = self.schedule.clone();
        let spec = CacheSpec::schedule(user_id, window.start.date());

        let mut view = self
            .cache
            .loader
            .get_or_load(&spec, move || async move {
                let entries = schedule
                    .list_between(user_id, window.start, window.end)
                    .await?;
                Ok::<_, RepoError>(WeekScheduleView {
                    week_offset: window.offset,
                    week_start: window.start,
                    week_end: window.end,
                    items: entries.iter().map(schedule_item_view).collect(),
                })
            })
            .await?;
        // Shared by every offset that lands on the same week.
        view.week_offset = window.offset;
        Ok(view)
    }

    async fn announce_entries(
        &self,
        user: &UserRecord,
        entries: &[ScheduleEntryRecord],
    ) -> Result<OffsetDateTime, ScheduleError> {
        let webhook = user
            .discord_webhook_url
            .as_deref()
            .or(self.default_webhook.as_deref())
            .ok_or(ScheduleError::NoWebhook)?;

        let announcement = Announcement {
            creator: user
                .display_name
                .clone()
                .unwrap_or_else(|| user.username.clone()),
            twitch_login: user.twitch_login.clone(),
            items: entries
                .iter()
                .map(|entry| AnnouncementItem {
                    title: entry.media.title.clone(),
                    media_type: entry.media.media_type,
                    poster_url: entry.media.poster_url.clone(),
                    scheduled_at: entry.item.scheduled_at,
                    season: entry.item.season,
                    episode: entry.item.episode,
                    notes: entry.item.notes.clone(),
                })
                .collect(),
        };
        self.announcer.announce(webhook, &announcement).await?;

        let now = OffsetDateTime::now_utc();
        let ids: Vec<Uuid> = entries.iter().map(|entry| entry.item.id).collect();
        self.schedule.mark_announced(&ids, now).await?;
        self.cache.trigger.schedule_changed(user.id, &user.username);

        info!(
            target = "creatorhub::schedule",
            user_id = %user.id,
            items = ids.len(),
            "Schedule announced"
        );
        Ok(now)
    }
}

fn positive(field: &'static str, value: Option<i32>) -> Result<Option<i32>, DomainError> {
    match value {
        Some(value) if value < 1 => Err(DomainError::validation(field, "must be at least 1")),
        other => Ok(other),
    }
}

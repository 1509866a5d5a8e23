//! Data feed for the OBS browser-source overlay.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use creatorhub_api_types::{
    OverlayScheduleEntry, OverlaySponsorEntry, OverlayView, OverlayWatchingEntry,
};

use crate::application::analytics::AnalyticsService;
use crate::application::repos::{
    MediaRepo, RepoError, ScheduleRepo, SponsorsRepo, TrackedMediaFilter,
};
use crate::application::search::SearchService;
use crate::application::users::UserDirectory;
use crate::cache::{CacheSpec, CacheState};
use crate::domain::entities::UserRecord;
use crate::domain::types::{AnalyticsEventType, WatchStatus};

const WATCHING_LIMIT: usize = 6;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct OverlayService {
    directory: UserDirectory,
    schedule: Arc<dyn ScheduleRepo>,
    media: Arc<dyn MediaRepo>,
    sponsors: Arc<dyn SponsorsRepo>,
    search: SearchService,
    analytics: AnalyticsService,
    cache: CacheState,
}

impl OverlayService {
    pub fn new(
        directory: UserDirectory,
        schedule: Arc<dyn ScheduleRepo>,
        media: Arc<dyn MediaRepo>,
        sponsors: Arc<dyn SponsorsRepo>,
        search: SearchService,
        analytics: AnalyticsService,
        cache: CacheState,
    ) -> Self {
        Self {
            directory,
            schedule,
            media,
            sponsors,
            search,
            analytics,
            cache,
        }
    }

    /// The live flag is resolved per request from the shorter-lived Twitch
    /// entry; everything else comes from the cached snapshot.
    pub async fn overlay(
        &self,
        username: &str,
        track: bool,
        referrer: Option<&str>,
    ) -> Result<OverlayView, OverlayError> {
        let user = self
            .directory
            .find(username)
            .await?
            .ok_or(OverlayError::NotFound)?;

        let mut view = self.snapshot(&user).await?;
        view.live = self.live(&user).await;

        if track
            && let Err(err) = self
                .analytics
                .record_for(&user, AnalyticsEventType::OverlayView, referrer)
                .await
        {
            warn!(
                target = "creatorhub::overlay",
                user_id = %user.id,
                error = %err,
                "Failed to record overlay view"
            );
        }

        Ok(view)
    }

    async fn snapshot(&self, user: &UserRecord) -> Result<OverlayView, RepoError> {
        let schedule = self.schedule.clone();
        let media = self.media.clone();
        let sponsors = self.sponsors.clone();
        let user = user.clone();
        let spec = CacheSpec::overlay(&user.username);

        self.cache
            .loader
            .get_or_load(&spec, move || async move {
                let now = OffsetDateTime::now_utc();
                let next_up = schedule.next_upcoming(user.id, now).await?;
                let watching = media
                    .list_tracked(
                        user.id,
                        TrackedMediaFilter {
                            media_type: None,
                            status: Some(WatchStatus::Watching),
                        },
                    )
                    .await?;
                let sponsors = sponsors.list_sponsors(user.id, true).await?;

                Ok::<_, RepoError>(OverlayView {
                    username: user.username.clone(),
                    display_name: user.display_name.clone(),
                    avatar_url: user.avatar_url.clone(),
                    live: false,
                    next_up: next_up.map(|entry| OverlayScheduleEntry {
                        title: entry.media.title,
                        media_type: entry.media.media_type,
                        poster_url: entry.media.poster_url,
                        scheduled_at: entry.item.scheduled_at,
                        season: entry.item.season,
                        episode: entry.item.episode,
                    }),
                    watching: watching
                        .into_iter()
                        .take(WATCHING_LIMIT)
                        .map(|tracked| OverlayWatchingEntry {
                            title: tracked.media.title,
                            media_type: tracked.media.media_type,
                            poster_url: tracked.media.poster_url,
                            watched_seasons: tracked.status.watched_seasons.len(),
                            total_seasons: tracked.media.total_seasons,
                        })
                        .collect(),
                    sponsors: sponsors
                        .into_iter()
                        .map(|sponsor| OverlaySponsorEntry {
                            name: sponsor.name,
                            logo_url: sponsor.logo_url,
                            url: sponsor.url,
                        })
                        .collect(),
                    generated_at: now,
                })
            })
            .await
    }

    /// Twitch failures degrade to "offline" rather than failing the overlay.
    async fn live(&self, user: &UserRecord) -> bool {
        let Some(login) = user.twitch_login.as_deref() else {
            return false;
        };
        match self.search.live_status(login).await {
            Ok(status) => status.live,
            Err(err) => {
                warn!(
                    target = "creatorhub::overlay",
                    user_id = %user.id,
                    error = %err,
                    "Twitch live status unavailable"
                );
                false
            }
        }
    }
}

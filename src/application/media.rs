//! Personal media tracker: statuses, ratings and per-season progress.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use creatorhub_api_types::{MediaUpdateRequest, TrackMediaRequest, TrackedMediaView};

use crate::application::repos::{MediaRepo, RepoError, TrackedMediaFilter, UpsertMediaParams};
use crate::application::users::{PublicSection, UserDirectory};
use crate::application::views::tracked_view;
use crate::cache::{CacheSpec, CacheState};
use crate::domain::entities::{MediaRecord, TrackedMediaRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::progress::{SeasonProgress, status_after_session, validate_rating};
use crate::domain::validation;

const TITLE_MAX: usize = 300;
const EXTERNAL_ID_MAX: usize = 100;
const MIN_RELEASE_YEAR: i32 = 1850;
const MAX_RELEASE_YEAR: i32 = 2100;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("tracked media not found")]
    NotFound,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct MediaService {
    media: Arc<dyn MediaRepo>,
    directory: UserDirectory,
    cache: CacheState,
}

impl MediaService {
    pub fn new(media: Arc<dyn MediaRepo>, directory: UserDirectory, cache: CacheState) -> Self {
        Self {
            media,
            directory,
            cache,
        }
    }

    pub async fn track(
        &self,
        user: &UserRecord,
        request: TrackMediaRequest,
    ) -> Result<TrackedMediaView, MediaError> {
        let params = upsert_params(request.clone())?;
        let media = self.media.upsert_media(params).await?;
        self.media.track(user.id, media.id, request.status).await?;
        self.cache
            .trigger
            .media_status_changed(user.id, &user.username);

        self.tracked(user.id, media.id).await.map(|t| tracked_view(&t))
    }

    pub async fn list(
        &self,
        user: &UserRecord,
        filter: TrackedMediaFilter,
    ) -> Result<Vec<TrackedMediaView>, MediaError> {
        let tracked = self.media.list_tracked(user.id, filter).await?;
        Ok(tracked.iter().map(tracked_view).collect())
    }

    pub async fn update(
        &self,
        user: &UserRecord,
        media_id: Uuid,
        request: MediaUpdateRequest,
    ) -> Result<TrackedMediaView, MediaError> {
        let mut tracked = self.tracked(user.id, media_id).await?;

        if let Some(status) = request.status {
            tracked.status.status = status;
        }
        if let Some(rating) = request.rating {
            tracked.status.rating = Some(validate_rating(rating)?);
        }

        tracked.status = self.media.save_status(&tracked.status).await?;
        self.cache
            .trigger
            .media_status_changed(user.id, &user.username);
        Ok(tracked_view(&tracked))
    }

    /// Toggle one season and recompute the overall status from the watched set.
    pub async fn set_season(
        &self,
        user: &UserRecord,
        media_id: Uuid,
        season: i32,
        watched: bool,
    ) -> Result<TrackedMediaView, MediaError> {
        let mut tracked = self.tracked(user.id, media_id).await?;
        if !tracked.media.media_type.has_seasons() {
            return Err(DomainError::validation(
                "season",
                format!("{} has no seasons", tracked.media.media_type.as_str()),
            )
            .into());
        }

        let mut progress =
            SeasonProgress::new(&tracked.status.watched_seasons, tracked.media.total_seasons);
        progress.set(season, watched)?;
        tracked.status.watched_seasons = progress.watched();
        tracked.status.status = progress.status();

        tracked.status = self.media.save_status(&tracked.status).await?;
        self.cache
            .trigger
            .media_status_changed(user.id, &user.username);
        Ok(tracked_view(&tracked))
    }

    pub async fn untrack(&self, user: &UserRecord, media_id: Uuid) -> Result<(), MediaError> {
        if !self.media.untrack(user.id, media_id).await? {
            return Err(MediaError::NotFound);
        }
        self.cache
            .trigger
            .media_status_changed(user.id, &user.username);
        Ok(())
    }

    pub async fn public_watchlist(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<Vec<TrackedMediaView>, MediaError> {
        let user = self
            .directory
            .find_visible(username, viewer, PublicSection::Watchlist)
            .await?
            .ok_or(MediaError::UserNotFound)?;

        let media = self.media.clone();
        let spec = CacheSpec::watchlist(user.id);
        let views = self
            .cache
            .loader
            .get_or_load(&spec, move || async move {
                let tracked = media
                    .list_tracked(user.id, TrackedMediaFilter::default())
                    .await?;
                Ok::<_, RepoError>(tracked.iter().map(tracked_view).collect::<Vec<_>>())
            })
            .await?;
        Ok(views)
    }

    /// Bookkeeping for a completed watch session; does not publish a cache event.
    ///
    /// With a season the season is marked watched; without one the status moves
    /// to `watching` (`watched` for movies and games). Untracked media is tracked first.
    pub(crate) async fn record_session(
        &self,
        user_id: Uuid,
        media: &MediaRecord,
        season: Option<i32>,
    ) -> Result<(), MediaError> {
        let mut tracked = match self.media.find_tracked(user_id, media.id).await? {
            Some(tracked) => tracked,
            None => {
                self.media.track(user_id, media.id, None).await?;
                self.tracked(user_id, media.id).await?
            }
        };

        match season {
            Some(season) if media.media_type.has_seasons() => {
                let mut progress = SeasonProgress::new(
                    &tracked.status.watched_seasons,
                    tracked.media.total_seasons,
                );
                progress.set(season, true)?;
                tracked.status.watched_seasons = progress.watched();
                tracked.status.status = progress.status();
            }
            _ => tracked.status.status = status_after_session(media.media_type),
        }

        self.media.save_status(&tracked.status).await?;
        Ok(())
    }

    /// Returns the media and whether a new `planned` status row was created.
    pub(crate) async fn ensure_tracked(
        &self,
        user_id: Uuid,
        media_id: Uuid,
    ) -> Result<(MediaRecord, bool), MediaError> {
        let media = self
            .media
            .find_media(media_id)
            .await?
            .ok_or(MediaError::NotFound)?;
        if self.media.find_tracked(user_id, media_id).await?.is_some() {
            return Ok((media, false));
        }
        self.media.track(user_id, media_id, None).await?;
        Ok((media, true))
    }

    async fn tracked(&self, user_id: Uuid, media_id: Uuid) -> Result<TrackedMediaRecord, MediaError> {
        self.media
            .find_tracked(user_id, media_id)
            .await?
            .ok_or(MediaError::NotFound)
    }
}

fn upsert_params(request: TrackMediaRequest) -> Result<UpsertMediaParams, DomainError> {
    let title = validation::required_text("title", &request.title, TITLE_MAX)?;
    let external_id =
        validation::required_text("external_id", &request.external_id, EXTERNAL_ID_MAX)?;
    let poster_url = validation::optional_http_url("poster_url", request.poster_url.as_deref())?;

    let total_seasons = if request.media_type.has_seasons() {
        match request.total_seasons {
            Some(total) if total < 1 => {
                return Err(DomainError::validation(
                    "total_seasons",
                    "must be at least 1",
                ));
            }
            other => other,
        }
    } else {
        None
    };

    if let Some(year) = request.release_year
        && !(MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR).contains(&year)
    {
        return Err(DomainError::validation(
            "release_year",
            format!("must be between {MIN_RELEASE_YEAR} and {MAX_RELEASE_YEAR}"),
        ));
    }

    Ok(UpsertMediaParams {
        media_type: request.media_type,
        source: request.source,
        external_id,
        title,
        poster_url,
        total_seasons,
        release_year: request.release_year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{MediaSource, MediaType};

    fn request(media_type: MediaType) -> TrackMediaRequest {
        TrackMediaRequest {
            media_type,
            source: MediaSource::Tmdb,
            external_id: " 1399 ".to_string(),
            title: "Game of Thrones".to_string(),
            poster_url: None,
            total_seasons: Some(8),
            release_year: Some(2011),
            status: None,
        }
    }

    #[test]
    fn movies_drop_season_counts() {
        let params = upsert_params(request(MediaType::Movie)).unwrap();
        assert_eq!(params.total_seasons, None);
        assert_eq!(params.external_id, "1399");
    }

    #[test]
    fn rejects_zero_seasons_and_odd_years() {
        let mut zero = request(MediaType::Series);
        zero.total_seasons = Some(0);
        assert!(upsert_params(zero).is_err());

        let mut future = request(MediaType::Series);
        future.release_year = Some(3000);
        assert!(upsert_params(future).is_err());
    }
}

//! Own profile settings and the cached public profile.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use creatorhub_api_types::{ProfileUpdateRequest, PublicProfileView};

use crate::application::repos::{FollowsRepo, RepoError, SocialsRepo, UpdateProfileParams};
use crate::application::users::{PublicSection, UserDirectory};
use crate::application::views::{channel_stats_view, social_view};
use crate::cache::{CacheSpec, CacheState};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found")]
    NotFound,
    #[error("username is already taken")]
    UsernameTaken,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Avatar,
    Banner,
}

impl ImageSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSlot::Avatar => "avatar",
            ImageSlot::Banner => "banner",
        }
    }
}

#[derive(Clone)]
pub struct ProfileService {
    directory: UserDirectory,
    follows: Arc<dyn FollowsRepo>,
    socials: Arc<dyn SocialsRepo>,
    cache: CacheState,
}

impl ProfileService {
    pub fn new(
        directory: UserDirectory,
        follows: Arc<dyn FollowsRepo>,
        socials: Arc<dyn SocialsRepo>,
        cache: CacheState,
    ) -> Self {
        Self {
            directory,
            follows,
            socials,
            cache,
        }
    }

    /// Apply a partial update. Empty strings clear nullable fields.
    pub async fn update(
        &self,
        user: &UserRecord,
        request: ProfileUpdateRequest,
    ) -> Result<UserRecord, ProfileError> {
        let mut params = UpdateProfileParams::from(user);

        if let Some(raw) = request.username.as_deref() {
            let username = validation::username(raw)?;
            if !username.eq_ignore_ascii_case(&user.username)
                && self.directory.repo().find_by_username(&username).await?.is_some()
            {
                return Err(ProfileError::UsernameTaken);
            }
            params.username = username;
        }
        if let Some(raw) = request.display_name.as_deref() {
            params.display_name =
                validation::optional_text("display_name", Some(raw), validation::DISPLAY_NAME_MAX)?;
        }
        if let Some(raw) = request.bio.as_deref() {
            params.bio = validation::optional_text("bio", Some(raw), validation::BIO_MAX)?;
        }
        if let Some(is_public) = request.is_public {
            params.is_public = is_public;
        }
        if let Some(show_watchlist) = request.show_watchlist {
            params.show_watchlist = show_watchlist;
        }
        if let Some(show_schedule) = request.show_schedule {
            params.show_schedule = show_schedule;
        }
        if let Some(raw) = request.twitch_login.as_deref() {
            params.twitch_login = clearable(raw, validation::twitch_login)?;
        }
        if let Some(raw) = request.youtube_channel_id.as_deref() {
            params.youtube_channel_id = clearable(raw, validation::youtube_channel_id)?;
        }
        if let Some(raw) = request.discord_webhook_url.as_deref() {
            params.discord_webhook_url = clearable(raw, validation::discord_webhook)?;
        }

        let updated = self
            .directory
            .repo()
            .update_profile(params)
            .await
            .map_err(|err| {
                if err.is_duplicate_of("username") {
                    ProfileError::UsernameTaken
                } else {
                    ProfileError::Repo(err)
                }
            })?;

        if updated.username != user.username {
            info!(
                target = "creatorhub::profile",
                user_id = %user.id,
                old = %user.username,
                new = %updated.username,
                "Username changed"
            );
        }
        self.cache
            .trigger
            .profile_changed(user.id, &user.username, &updated.username);
        Ok(updated)
    }

    /// Point the avatar or banner at an already-stored upload.
    pub async fn set_image(
        &self,
        user: &UserRecord,
        slot: ImageSlot,
        url: String,
    ) -> Result<UserRecord, ProfileError> {
        let mut params = UpdateProfileParams::from(user);
        match slot {
            ImageSlot::Avatar => params.avatar_url = Some(url),
            ImageSlot::Banner => params.banner_url = Some(url),
        }

        let updated = self.directory.repo().update_profile(params).await?;
        self.cache
            .trigger
            .profile_changed(user.id, &user.username, &updated.username);
        Ok(updated)
    }

    pub async fn public_profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<PublicProfileView, ProfileError> {
        let user = self
            .directory
            .find_visible(username, viewer, PublicSection::Profile)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let follows = self.follows.clone();
        let socials = self.socials.clone();
        let spec = CacheSpec::profile(&user.username);
        let view = self
            .cache
            .loader
            .get_or_load(&spec, move || async move {
                let counts = follows.counts(user.id).await?;
                let socials = socials.list_socials(user.id).await?;
                Ok::<_, RepoError>(PublicProfileView {
                    username: user.username.clone(),
                    display_name: user.display_name.clone(),
                    bio: user.bio.clone(),
                    avatar_url: user.avatar_url.clone(),
                    banner_url: user.banner_url.clone(),
                    role: user.role,
                    twitch_login: user.twitch_login.clone(),
                    youtube: channel_stats_view(&user),
                    followers: counts.followers,
                    following: counts.following,
                    socials: socials.iter().map(social_view).collect(),
                    show_watchlist: user.show_watchlist,
                    show_schedule: user.show_schedule,
                })
            })
            .await?;

        Ok(view)
    }
}

/// Blank input clears the field; anything else must pass `validate`.
fn clearable(
    raw: &str,
    validate: fn(&str) -> Result<String, DomainError>,
) -> Result<Option<String>, DomainError> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        validate(raw).map(Some)
    }
}

//! Sponsor and social-link management plus their cached public lists.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use creatorhub_api_types::{
    SocialCreateRequest, SocialItemView, SocialUpdateRequest, SponsorCreateRequest,
    SponsorUpdateRequest, SponsorView,
};

use crate::application::repos::{
    RepoError, SocialParams, SocialsRepo, SponsorParams, SponsorsRepo,
};
use crate::application::users::{PublicSection, UserDirectory};
use crate::application::views::{social_view, sponsor_view};
use crate::cache::{CacheSpec, CacheState};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("item not found")]
    NotFound,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Blank strings clear optional text on update.
fn merge_url(
    field: &'static str,
    current: Option<String>,
    update: Option<&str>,
) -> Result<Option<String>, DomainError> {
    match update {
        Some(raw) => validation::optional_http_url(field, Some(raw)),
        None => Ok(current),
    }
}

fn next_position(requested: Option<i32>, existing: usize) -> Result<i32, DomainError> {
    match requested {
        Some(position) if position < 0 => {
            Err(DomainError::validation("position", "must not be negative"))
        }
        Some(position) => Ok(position),
        None => i32::try_from(existing)
            .map_err(|_| DomainError::validation("position", "too many items")),
    }
}

#[derive(Clone)]
pub struct SponsorService {
    sponsors: Arc<dyn SponsorsRepo>,
    directory: UserDirectory,
    cache: CacheState,
}

impl SponsorService {
    pub fn new(
        sponsors: Arc<dyn SponsorsRepo>,
        directory: UserDirectory,
        cache: CacheState,
    ) -> Self {
        Self {
            sponsors,
            directory,
            cache,
        }
    }

    pub async fn list_own(&self, user: &UserRecord) -> Result<Vec<SponsorView>, ListingError> {
        let sponsors = self.sponsors.list_sponsors(user.id, false).await?;
        Ok(sponsors.iter().map(sponsor_view).collect())
    }

    pub async fn create(
        &self,
        user: &UserRecord,
        request: SponsorCreateRequest,
    ) -> Result<SponsorView, ListingError> {
        let existing = self.sponsors.list_sponsors(user.id, false).await?.len();
        let params = SponsorParams {
            name: validation::required_text("name", &request.name, validation::SHORT_TEXT_MAX)?,
            url: validation::optional_http_url("url", request.url.as_deref())?,
            logo_url: validation::optional_http_url("logo_url", request.logo_url.as_deref())?,
            description: validation::optional_text(
                "description",
                request.description.as_deref(),
                validation::BIO_MAX,
            )?,
            position: next_position(request.position, existing)?,
            active: request.active.unwrap_or(true),
        };

        let sponsor = self.sponsors.create_sponsor(user.id, params).await?;
        self.cache.trigger.sponsors_changed(user.id, &user.username);
        Ok(sponsor_view(&sponsor))
    }

    pub async fn update(
        &self,
        user: &UserRecord,
        id: Uuid,
        request: SponsorUpdateRequest,
    ) -> Result<SponsorView, ListingError> {
        let current = self
            .sponsors
            .find_sponsor(user.id, id)
            .await?
            .ok_or(ListingError::NotFound)?;

        let params = SponsorParams {
            name: match request.name.as_deref() {
                Some(raw) => validation::required_text("name", raw, validation::SHORT_TEXT_MAX)?,
                None => current.name,
            },
            url: merge_url("url", current.url, request.url.as_deref())?,
            logo_url: merge_url("logo_url", current.logo_url, request.logo_url.as_deref())?,
            description: match request.description.as_deref() {
                Some(raw) => {
                    validation::optional_text("description", Some(raw), validation::BIO_MAX)?
                }
                None => current.description,
            },
            position: match request.position {
                Some(_) => next_position(request.position, 0)?,
                None => current.position,
            },
            active: request.active.unwrap_or(current.active),
        };

        let sponsor = self.sponsors.update_sponsor(user.id, id, params).await?;
        self.cache.trigger.sponsors_changed(user.id, &user.username);
        Ok(sponsor_view(&sponsor))
    }

    pub async fn delete(&self, user: &UserRecord, id: Uuid) -> Result<(), ListingError> {
        if !self.sponsors.delete_sponsor(user.id, id).await? {
            return Err(ListingError::NotFound);
        }
        self.cache.trigger.sponsors_changed(user.id, &user.username);
        Ok(())
    }

    /// Active sponsors of a visible profile, ordered by position.
    pub async fn public(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<Vec<SponsorView>, ListingError> {
        let user = self
            .directory
            .find_visible(username, viewer, PublicSection::Profile)
            .await?
            .ok_or(ListingError::UserNotFound)?;

        let sponsors = self.sponsors.clone();
        let views = self
            .cache
            .loader
            .get_or_load(&CacheSpec::sponsors(user.id), move || async move {
                let records = sponsors.list_sponsors(user.id, true).await?;
                Ok::<_, RepoError>(records.iter().map(sponsor_view).collect::<Vec<_>>())
            })
            .await?;
        Ok(views)
    }
}

#[derive(Clone)]
pub struct SocialService {
    socials: Arc<dyn SocialsRepo>,
    directory: UserDirectory,
    cache: CacheState,
}

impl SocialService {
    pub fn new(socials: Arc<dyn SocialsRepo>, directory: UserDirectory, cache: CacheState) -> Self {
        Self {
            socials,
            directory,
            cache,
        }
    }

    pub async fn list_own(&self, user: &UserRecord) -> Result<Vec<SocialItemView>, ListingError> {
        let socials = self.socials.list_socials(user.id).await?;
        Ok(socials.iter().map(social_view).collect())
    }

    pub async fn create(
        &self,
        user: &UserRecord,
        request: SocialCreateRequest,
    ) -> Result<SocialItemView, ListingError> {
        let existing = self.socials.list_socials(user.id).await?.len();
        let params = SocialParams {
            platform: request.platform,
            url: validation::http_url("url", &request.url)?,
            label: validation::optional_text(
                "label",
                request.label.as_deref(),
                validation::SHORT_TEXT_MAX,
            )?,
            position: next_position(request.position, existing)?,
        };

        let social = self.socials.create_social(user.id, params).await?;
        self.cache.trigger.socials_changed(user.id, &user.username);
        Ok(social_view(&social))
    }

    pub async fn update(
        &self,
        user: &UserRecord,
        id: Uuid,
        request: SocialUpdateRequest,
    ) -> Result<SocialItemView, ListingError> {
        let current = self
            .socials
            .find_social(user.id, id)
            .await?
            .ok_or(ListingError::NotFound)?;

        let params = SocialParams {
            platform: request.platform.unwrap_or(current.platform),
            url: match request.url.as_deref() {
                Some(raw) => validation::http_url("url", raw)?,
                None => current.url,
            },
            label: match request.label.as_deref() {
                Some(raw) => {
                    validation::optional_text("label", Some(raw), validation::SHORT_TEXT_MAX)?
                }
                None => current.label,
            },
            position: match request.position {
                Some(_) => next_position(request.position, 0)?,
                None => current.position,
            },
        };

        let social = self.socials.update_social(user.id, id, params).await?;
        self.cache.trigger.socials_changed(user.id, &user.username);
        Ok(social_view(&social))
    }

    pub async fn delete(&self, user: &UserRecord, id: Uuid) -> Result<(), ListingError> {
        if !self.socials.delete_social(user.id, id).await? {
            return Err(ListingError::NotFound);
        }
        self.cache.trigger.socials_changed(user.id, &user.username);
        Ok(())
    }

    pub async fn public(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<Vec<SocialItemView>, ListingError> {
        let user = self
            .directory
            .find_visible(username, viewer, PublicSection::Profile)
            .await?
            .ok_or(ListingError::UserNotFound)?;

        let socials = self.socials.clone();
        let views = self
            .cache
            .loader
            .get_or_load(&CacheSpec::socials(user.id), move || async move {
                let records = socials.list_socials(user.id).await?;
                Ok::<_, RepoError>(records.iter().map(social_view).collect::<Vec<_>>())
            })
            .await?;
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_default_to_end_of_list() {
        assert_eq!(next_position(None, 3), Ok(3));
        assert_eq!(next_position(Some(1), 3), Ok(1));
        assert!(next_position(Some(-1), 0).is_err());
    }

    #[test]
    fn blank_url_update_clears_value() {
        let merged = merge_url("url", Some("https://a.example".to_string()), Some("  ")).unwrap();
        assert_eq!(merged, None);

        let kept = merge_url("url", Some("https://a.example".to_string()), None).unwrap();
        assert_eq!(kept.as_deref(), Some("https://a.example"));
    }
}

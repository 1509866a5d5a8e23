//! Cached username → user resolution and public visibility rules.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{RepoError, UsersRepo};
use crate::cache::{CacheSpec, CacheState};
use crate::domain::entities::UserRecord;

/// Public surface of a user's hub page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicSection {
    Profile,
    Watchlist,
    Schedule,
}

/// Owners always see their own pages; everyone else needs the profile to be
/// public and, for the watchlist and schedule, the matching flag.
pub fn is_visible(user: &UserRecord, viewer: Option<Uuid>, section: PublicSection) -> bool {
    if viewer == Some(user.id) {
        return true;
    }
    if !user.is_public {
        return false;
    }
    match section {
        PublicSection::Profile => true,
        PublicSection::Watchlist => user.show_watchlist,
        PublicSection::Schedule => user.show_schedule,
    }
}

#[derive(Debug, Error)]
enum LookupError {
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UsersRepo>,
    cache: CacheState,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UsersRepo>, cache: CacheState) -> Self {
        Self { users, cache }
    }

    pub fn repo(&self) -> &Arc<dyn UsersRepo> {
        &self.users
    }

    /// Look up a user by handle through the `user-{username}` cache entry.
    ///
    /// Unknown handles are not cached, so a later registration is visible at once.
    pub async fn find(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let spec = CacheSpec::user(username);
        let users = self.users.clone();
        let handle = username.trim().to_string();

        let result = self
            .cache
            .loader
            .get_or_load(&spec, move || async move {
                users
                    .find_by_username(&handle)
                    .await?
                    .ok_or(LookupError::NotFound)
            })
            .await;

        match result {
            Ok(user) => Ok(Some(user)),
            Err(LookupError::NotFound) => Ok(None),
            Err(LookupError::Repo(err)) => Err(err),
        }
    }

    /// Resolve `username` only when `viewer` may see the given section.
    pub async fn find_visible(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        section: PublicSection,
    ) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .find(username)
            .await?
            .filter(|user| is_visible(user, viewer, section)))
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::types::UserRole;

    fn user(is_public: bool, show_watchlist: bool) -> UserRecord {
        let now = OffsetDateTime::now_utc();
        UserRecord {
            id: Uuid::new_v4(),
            username: "Neo".to_string(),
            email: "neo@example.com".to_string(),
            password_hash: String::new(),
            display_name: None,
            bio: None,
            avatar_url: None,
            banner_url: None,
            role: UserRole::Creator,
            is_public,
            show_watchlist,
            show_schedule: false,
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
        }
    }

    #[test]
    fn private_profiles_are_owner_only() {
        let user = user(false, true);
        assert!(!is_visible(&user, None, PublicSection::Profile));
        assert!(!is_visible(&user, Some(Uuid::new_v4()), PublicSection::Watchlist));
        assert!(is_visible(&user, Some(user.id), PublicSection::Watchlist));
    }

    #[test]
    fn sections_follow_their_flags() {
        let user = user(true, true);
        assert!(is_visible(&user, None, PublicSection::Profile));
        assert!(is_visible(&user, None, PublicSection::Watchlist));
        assert!(!is_visible(&user, None, PublicSection::Schedule));
    }
}

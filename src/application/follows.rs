use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use creatorhub_api_types::{FollowCountsView, FollowStateView, FollowerView};

use crate::application::repos::{FollowCounts, FollowsRepo, RepoError};
use crate::application::users::{PublicSection, UserDirectory};
use crate::application::views::follower_view;
use crate::cache::{CacheSpec, CacheState};
use crate::domain::entities::UserRecord;

const FOLLOWER_LIST_LIMIT: u32 = 200;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("user not found")]
    UserNotFound,
    #[error("users cannot follow themselves")]
    SelfFollow,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FollowService {
    follows: Arc<dyn FollowsRepo>,
    directory: UserDirectory,
    cache: CacheState,
}

impl FollowService {
    pub fn new(follows: Arc<dyn FollowsRepo>, directory: UserDirectory, cache: CacheState) -> Self {
        Self {
            follows,
            directory,
            cache,
        }
    }

    /// Idempotent: following twice leaves one edge.
    pub async fn follow(
        &self,
        user: &UserRecord,
        username: &str,
    ) -> Result<FollowStateView, FollowError> {
        let target = self.target(user, username).await?;
        if self.follows.follow(user.id, target.id).await? {
            self.publish(user, &target);
        }
        self.state(user, &target).await
    }

    /// Idempotent: unfollowing a user you don't follow is not an error.
    pub async fn unfollow(
        &self,
        user: &UserRecord,
        username: &str,
    ) -> Result<FollowStateView, FollowError> {
        let target = self.target(user, username).await?;
        if self.follows.unfollow(user.id, target.id).await? {
            self.publish(user, &target);
        }
        self.state(user, &target).await
    }

    pub async fn toggle(
        &self,
        user: &UserRecord,
        username: &str,
    ) -> Result<FollowStateView, FollowError> {
        let target = self.target(user, username).await?;
        let changed = if self.follows.is_following(user.id, target.id).await? {
            self.follows.unfollow(user.id, target.id).await?
        } else {
            self.follows.follow(user.id, target.id).await?
        };
        if changed {
            self.publish(user, &target);
        }
        self.state(user, &target).await
    }

    pub async fn status(
        &self,
        user: &UserRecord,
        username: &str,
    ) -> Result<FollowStateView, FollowError> {
        let target = self.target(user, username).await?;
        self.state(user, &target).await
    }

    pub async fn counts(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<FollowCountsView, FollowError> {
        let user = self
            .directory
            .find_visible(username, viewer, PublicSection::Profile)
            .await?
            .ok_or(FollowError::UserNotFound)?;
        let counts = self.cached_counts(user.id).await?;
        Ok(FollowCountsView {
            followers: counts.followers,
            following: counts.following,
        })
    }

    pub async fn followers(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<Vec<FollowerView>, FollowError> {
        let user = self
            .directory
            .find_visible(username, viewer, PublicSection::Profile)
            .await?
            .ok_or(FollowError::UserNotFound)?;
        let followers = self
            .follows
            .list_followers(user.id, FOLLOWER_LIST_LIMIT)
            .await?;
        Ok(followers.iter().map(follower_view).collect())
    }

    async fn target(&self, user: &UserRecord, username: &str) -> Result<UserRecord, FollowError> {
        let target = self
            .directory
            .find_visible(username, Some(user.id), PublicSection::Profile)
            .await?
            .ok_or(FollowError::UserNotFound)?;
        if target.id == user.id {
            return Err(FollowError::SelfFollow);
        }
        Ok(target)
    }

    async fn state(
        &self,
        user: &UserRecord,
        target: &UserRecord,
    ) -> Result<FollowStateView, FollowError> {
        let following = self.follows.is_following(user.id, target.id).await?;
        let counts = self.cached_counts(target.id).await?;
        Ok(FollowStateView {
            following,
            followers: counts.followers,
        })
    }

    async fn cached_counts(&self, user_id: Uuid) -> Result<FollowCounts, RepoError> {
        let follows = self.follows.clone();
        self.cache
            .loader
            .get_or_load(&CacheSpec::follows(user_id), move || async move {
                follows.counts(user_id).await
            })
            .await
    }

    fn publish(&self, user: &UserRecord, target: &UserRecord) {
        self.cache.trigger.follow_changed(
            (user.id, user.username.as_str()),
            (target.id, target.username.as_str()),
        );
    }
}

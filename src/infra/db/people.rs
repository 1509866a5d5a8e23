//! Follows, sponsors and social links.

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    FollowCounts, FollowsRepo, RepoError, SocialParams, SocialsRepo, SponsorParams, SponsorsRepo,
};
use crate::domain::entities::{FollowerRecord, SocialItemRecord, SponsorRecord};
use crate::domain::types::SocialPlatform;

use super::{PostgresRepositories, map_sqlx_error};

const SPONSOR_COLUMNS: &str =
    "id, user_id, name, url, logo_url, description, position, active, created_at, updated_at";
const SOCIAL_COLUMNS: &str = "id, user_id, platform, url, label, position, created_at";

#[derive(sqlx::FromRow)]
struct FollowerRow {
    username: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    followed_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct SponsorRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    url: Option<String>,
    logo_url: Option<String>,
    description: Option<String>,
    position: i32,
    active: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SponsorRow> for SponsorRecord {
    fn from(row: SponsorRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            url: row.url,
            logo_url: row.logo_url,
            description: row.description,
            position: row.position,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SocialRow {
    id: Uuid,
    user_id: Uuid,
    platform: SocialPlatform,
    url: String,
    label: Option<String>,
    position: i32,
    created_at: OffsetDateTime,
}

impl From<SocialRow> for SocialItemRecord {
    fn from(row: SocialRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            platform: row.platform,
            url: row.url,
            label: row.label,
            position: row.position,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl FollowsRepo for PostgresRepositories {
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, following_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, RepoError> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_following(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn counts(&self, user_id: Uuid) -> Result<FollowCounts, RepoError> {
        let (followers, following) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT \
                (SELECT COUNT(*) FROM follows WHERE following_id = $1), \
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1)",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(FollowCounts {
            followers,
            following,
        })
    }

    async fn list_followers(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<FollowerRecord>, RepoError> {
        let rows = sqlx::query_as::<_, FollowerRow>(
            "SELECT u.username, u.display_name, u.avatar_url, f.created_at AS followed_at \
             FROM follows f INNER JOIN users u ON u.id = f.follower_id \
             WHERE f.following_id = $1 ORDER BY f.created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| FollowerRecord {
                username: row.username,
                display_name: row.display_name,
                avatar_url: row.avatar_url,
                followed_at: row.followed_at,
            })
            .collect())
    }
}

#[async_trait]
impl SponsorsRepo for PostgresRepositories {
    async fn list_sponsors(
        &self,
        user_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<SponsorRecord>, RepoError> {
        let sql = format!(
            "SELECT {SPONSOR_COLUMNS} FROM sponsors WHERE user_id = $1 AND (active OR NOT $2) \
             ORDER BY position, created_at"
        );
        let rows = sqlx::query_as::<_, SponsorRow>(&sql)
            .bind(user_id)
            .bind(active_only)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(SponsorRecord::from).collect())
    }

    async fn find_sponsor(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SponsorRecord>, RepoError> {
        let sql = format!("SELECT {SPONSOR_COLUMNS} FROM sponsors WHERE user_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, SponsorRow>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(SponsorRecord::from))
    }

    async fn create_sponsor(
        &self,
        user_id: Uuid,
        params: SponsorParams,
    ) -> Result<SponsorRecord, RepoError> {
        let sql = format!(
            "INSERT INTO sponsors (user_id, name, url, logo_url, description, position, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {SPONSOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SponsorRow>(&sql)
            .bind(user_id)
            .bind(&params.name)
            .bind(&params.url)
            .bind(&params.logo_url)
            .bind(&params.description)
            .bind(params.position)
            .bind(params.active)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_sponsor(
        &self,
        user_id: Uuid,
        id: Uuid,
        params: SponsorParams,
    ) -> Result<SponsorRecord, RepoError> {
        let sql = format!(
            "UPDATE sponsors SET name = $3, url = $4, logo_url = $5, description = $6, \
             position = $7, active = $8, updated_at = now() \
             WHERE user_id = $1 AND id = $2 RETURNING {SPONSOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SponsorRow>(&sql)
            .bind(user_id)
            .bind(id)
            .bind(&params.name)
            .bind(&params.url)
            .bind(&params.logo_url)
            .bind(&params.description)
            .bind(params.position)
            .bind(params.active)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn delete_sponsor(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM sponsors WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SocialsRepo for PostgresRepositories {
    async fn list_socials(&self, user_id: Uuid) -> Result<Vec<SocialItemRecord>, RepoError> {
        let sql = format!(
            "SELECT {SOCIAL_COLUMNS} FROM social_items WHERE user_id = $1 \
             ORDER BY position, created_at"
        );
        let rows = sqlx::query_as::<_, SocialRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(SocialItemRecord::from).collect())
    }

    async fn find_social(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SocialItemRecord>, RepoError> {
        let sql =
            format!("SELECT {SOCIAL_COLUMNS} FROM social_items WHERE user_id = $1 AND id = $2");
        let row = sqlx::query_as::<_, SocialRow>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(SocialItemRecord::from))
    }

    async fn create_social(
        &self,
        user_id: Uuid,
        params: SocialParams,
    ) -> Result<SocialItemRecord, RepoError> {
        let sql = format!(
            "INSERT INTO social_items (user_id, platform, url, label, position) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SOCIAL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SocialRow>(&sql)
            .bind(user_id)
            .bind(params.platform)
            .bind(&params.url)
            .bind(&params.label)
            .bind(params.position)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_social(
        &self,
        user_id: Uuid,
        id: Uuid,
        params: SocialParams,
    ) -> Result<SocialItemRecord, RepoError> {
        let sql = format!(
            "UPDATE social_items SET platform = $3, url = $4, label = $5, position = $6 \
             WHERE user_id = $1 AND id = $2 RETURNING {SOCIAL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SocialRow>(&sql)
            .bind(user_id)
            .bind(id)
            .bind(params.platform)
            .bind(&params.url)
            .bind(&params.label)
            .bind(params.position)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn delete_social(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM social_items WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

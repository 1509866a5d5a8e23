use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    ChannelStats, CreateUserParams, RepoError, UpdateProfileParams, UsersRepo,
};
use crate::domain::entities::UserRecord;
use crate::domain::types::UserRole;

use super::{PostgresRepositories, map_sqlx_error};

const USER_COLUMNS: &str = "id, username, email, password_hash, display_name, bio, avatar_url, \
    banner_url, role, is_public, show_watchlist, show_schedule, email_verified_at, twitch_login, \
    youtube_channel_id, discord_webhook_url, youtube_subscribers, youtube_views, youtube_videos, \
    youtube_synced_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    display_name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    banner_url: Option<String>,
    role: UserRole,
    is_public: bool,
    show_watchlist: bool,
    show_schedule: bool,
    email_verified_at: Option<OffsetDateTime>,
    twitch_login: Option<String>,
    youtube_channel_id: Option<String>,
    discord_webhook_url: Option<String>,
    youtube_subscribers: Option<i64>,
    youtube_views: Option<i64>,
    youtube_videos: Option<i64>,
    youtube_synced_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            display_name: row.display_name,
            bio: row.bio,
            avatar_url: row.avatar_url,
            banner_url: row.banner_url,
            role: row.role,
            is_public: row.is_public,
            show_watchlist: row.show_watchlist,
            show_schedule: row.show_schedule,
            email_verified_at: row.email_verified_at,
            twitch_login: row.twitch_login,
            youtube_channel_id: row.youtube_channel_id,
            discord_webhook_url: row.discord_webhook_url,
            youtube_subscribers: row.youtube_subscribers,
            youtube_views: row.youtube_views,
            youtube_videos: row.youtube_videos,
            youtube_synced_at: row.youtube_synced_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    async fn fetch_user(&self, filter: &str, value: &str) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(UserRecord::from))
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        self.fetch_user("lower(username) = lower($1)", username.trim())
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        self.fetch_user("email = $1", email).await
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&params.username)
            .bind(&params.email)
            .bind(&params.password_hash)
            .bind(params.role)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_profile(&self, params: UpdateProfileParams) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "UPDATE users SET username = $2, display_name = $3, bio = $4, avatar_url = $5, \
             banner_url = $6, is_public = $7, show_watchlist = $8, show_schedule = $9, \
             twitch_login = $10, youtube_channel_id = $11, discord_webhook_url = $12, \
             updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(params.id)
            .bind(&params.username)
            .bind(&params.display_name)
            .bind(&params.bio)
            .bind(&params.avatar_url)
            .bind(&params.banner_url)
            .bind(params.is_public)
            .bind(params.show_watchlist)
            .bind(params.show_schedule)
            .bind(&params.twitch_login)
            .bind(&params.youtube_channel_id)
            .bind(&params.discord_webhook_url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        id: Uuid,
        verified_at: OffsetDateTime,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE users SET email_verified_at = COALESCE(email_verified_at, $2) WHERE id = $1",
        )
        .bind(id)
        .bind(verified_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_youtube_linked(&self) -> Result<Vec<UserRecord>, RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE youtube_channel_id IS NOT NULL ORDER BY id"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn update_channel_stats(
        &self,
        id: Uuid,
        stats: ChannelStats,
        synced_at: OffsetDateTime,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE users SET youtube_subscribers = $2, youtube_views = $3, youtube_videos = $4, \
             youtube_synced_at = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(stats.subscribers)
        .bind(stats.views)
        .bind(stats.videos)
        .bind(synced_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

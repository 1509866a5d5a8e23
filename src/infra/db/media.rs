use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{MediaRepo, RepoError, TrackedMediaFilter, UpsertMediaParams};
use crate::domain::entities::{MediaRecord, MediaStatusRecord, TrackedMediaRecord};
use crate::domain::types::{MediaSource, MediaType, WatchStatus};

use super::{PostgresRepositories, map_sqlx_error};

const MEDIA_COLUMNS: &str =
    "id, media_type, source, external_id, title, poster_url, total_seasons, release_year, created_at";
const STATUS_COLUMNS: &str =
    "id, user_id, media_id, status, watched_seasons, rating, created_at, updated_at";
const TRACKED_SELECT: &str = "SELECT \
    s.id AS status_id, s.user_id, s.media_id, s.status, s.watched_seasons, s.rating, \
    s.created_at AS status_created_at, s.updated_at AS status_updated_at, \
    m.media_type, m.source, m.external_id, m.title, m.poster_url, m.total_seasons, \
    m.release_year, m.created_at AS media_created_at \
    FROM media_status s INNER JOIN media m ON m.id = s.media_id ";

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: Uuid,
    media_type: MediaType,
    source: MediaSource,
    external_id: String,
    title: String,
    poster_url: Option<String>,
    total_seasons: Option<i32>,
    release_year: Option<i32>,
    created_at: OffsetDateTime,
}

impl From<MediaRow> for MediaRecord {
    fn from(row: MediaRow) -> Self {
        Self {
            id: row.id,
            media_type: row.media_type,
            source: row.source,
            external_id: row.external_id,
            title: row.title,
            poster_url: row.poster_url,
            total_seasons: row.total_seasons,
            release_year: row.release_year,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    id: Uuid,
    user_id: Uuid,
    media_id: Uuid,
    status: WatchStatus,
    watched_seasons: Vec<i32>,
    rating: Option<i16>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<StatusRow> for MediaStatusRecord {
    fn from(row: StatusRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            media_id: row.media_id,
            status: row.status,
            watched_seasons: row.watched_seasons,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TrackedRow {
    status_id: Uuid,
    user_id: Uuid,
    media_id: Uuid,
    status: WatchStatus,
    watched_seasons: Vec<i32>,
    rating: Option<i16>,
    status_created_at: OffsetDateTime,
    status_updated_at: OffsetDateTime,
    media_type: MediaType,
    source: MediaSource,
    external_id: String,
    title: String,
    poster_url: Option<String>,
    total_seasons: Option<i32>,
    release_year: Option<i32>,
    media_created_at: OffsetDateTime,
}

impl From<TrackedRow> for TrackedMediaRecord {
    fn from(row: TrackedRow) -> Self {
        Self {
            media: MediaRecord {
                id: row.media_id,
                media_type: row.media_type,
                source: row.source,
                external_id: row.external_id,
                title: row.title,
                poster_url: row.poster_url,
                total_seasons: row.total_seasons,
                release_year: row.release_year,
                created_at: row.media_created_at,
            },
            status: MediaStatusRecord {
                id: row.status_id,
                user_id: row.user_id,
                media_id: row.media_id,
                status: row.status,
                watched_seasons: row.watched_seasons,
                rating: row.rating,
                created_at: row.status_created_at,
                updated_at: row.status_updated_at,
            },
        }
    }
}

#[async_trait]
impl MediaRepo for PostgresRepositories {
    async fn upsert_media(&self, params: UpsertMediaParams) -> Result<MediaRecord, RepoError> {
        let sql = format!(
            "INSERT INTO media (media_type, source, external_id, title, poster_url, total_seasons, release_year) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (source, media_type, external_id) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 poster_url = COALESCE(EXCLUDED.poster_url, media.poster_url), \
                 total_seasons = COALESCE(EXCLUDED.total_seasons, media.total_seasons), \
                 release_year = COALESCE(EXCLUDED.release_year, media.release_year) \
             RETURNING {MEDIA_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MediaRow>(&sql)
            .bind(params.media_type)
            .bind(params.source)
            .bind(&params.external_id)
            .bind(&params.title)
            .bind(&params.poster_url)
            .bind(params.total_seasons)
            .bind(params.release_year)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_media(&self, id: Uuid) -> Result<Option<MediaRecord>, RepoError> {
        let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1");
        let row = sqlx::query_as::<_, MediaRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(MediaRecord::from))
    }

    async fn track(
        &self,
        user_id: Uuid,
        media_id: Uuid,
        status: Option<WatchStatus>,
    ) -> Result<MediaStatusRecord, RepoError> {
        let sql = format!(
            "INSERT INTO media_status (user_id, media_id, status) \
             VALUES ($1, $2, COALESCE($3, 'planned'::watch_status)) \
             ON CONFLICT (user_id, media_id) DO UPDATE SET \
                 status = COALESCE($3, media_status.status), \
                 updated_at = now() \
             RETURNING {STATUS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StatusRow>(&sql)
            .bind(user_id)
            .bind(media_id)
            .bind(status)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_tracked(
        &self,
        user_id: Uuid,
        media_id: Uuid,
    ) -> Result<Option<TrackedMediaRecord>, RepoError> {
        let sql = format!("{TRACKED_SELECT} WHERE s.user_id = $1 AND s.media_id = $2");
        let row = sqlx::query_as::<_, TrackedRow>(&sql)
            .bind(user_id)
            .bind(media_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(TrackedMediaRecord::from))
    }

    async fn list_tracked(
        &self,
        user_id: Uuid,
        filter: TrackedMediaFilter,
    ) -> Result<Vec<TrackedMediaRecord>, RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(TRACKED_SELECT);
        qb.push(" WHERE s.user_id = ");
        qb.push_bind(user_id);

        if let Some(media_type) = filter.media_type {
            qb.push(" AND m.media_type = ");
            qb.push_bind(media_type);
        }
        if let Some(status) = filter.status {
            qb.push(" AND s.status = ");
            qb.push_bind(status);
        }
        qb.push(" ORDER BY s.updated_at DESC, s.id DESC");

        let rows = qb
            .build_query_as::<TrackedRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(TrackedMediaRecord::from).collect())
    }

    async fn save_status(
        &self,
        status: &MediaStatusRecord,
    ) -> Result<MediaStatusRecord, RepoError> {
        let sql = format!(
            "UPDATE media_status SET status = $2, watched_seasons = $3, rating = $4, \
             updated_at = now() WHERE id = $1 RETURNING {STATUS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StatusRow>(&sql)
            .bind(status.id)
            .bind(status.status)
            .bind(&status.watched_seasons)
            .bind(status.rating)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn untrack(&self, user_id: Uuid, media_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM media_status WHERE user_id = $1 AND media_id = $2")
            .bind(user_id)
            .bind(media_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

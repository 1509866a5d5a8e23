use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateScheduleParams, RepoError, ScheduleRepo};
use crate::domain::entities::{MediaRecord, ScheduleEntryRecord, ScheduleItemRecord};
use crate::domain::types::{MediaSource, MediaType};

use super::{PostgresRepositories, map_sqlx_error};

const ITEM_COLUMNS: &str = "id, user_id, media_id, scheduled_at, season, episode, notes, \
    completed_at, announced_at, created_at";
const ENTRY_SELECT: &str = "SELECT \
    i.id, i.user_id, i.media_id, i.scheduled_at, i.season, i.episode, i.notes, \
    i.completed_at, i.announced_at, i.created_at, \
    m.media_type, m.source, m.external_id, m.title, m.poster_url, m.total_seasons, \
    m.release_year, m.created_at AS media_created_at \
    FROM schedule_items i INNER JOIN media m ON m.id = i.media_id ";

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    user_id: Uuid,
    media_id: Uuid,
    scheduled_at: OffsetDateTime,
    season: Option<i32>,
    episode: Option<i32>,
    notes: Option<String>,
    completed_at: Option<OffsetDateTime>,
    announced_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
}

impl From<ItemRow> for ScheduleItemRecord {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            media_id: row.media_id,
            scheduled_at: row.scheduled_at,
            season: row.season,
            episode: row.episode,
            notes: row.notes,
            completed_at: row.completed_at,
            announced_at: row.announced_at,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    #[sqlx(flatten)]
    item: ItemRow,
    media_type: MediaType,
    source: MediaSource,
    external_id: String,
    title: String,
    poster_url: Option<String>,
    total_seasons: Option<i32>,
    release_year: Option<i32>,
    media_created_at: OffsetDateTime,
}

impl From<EntryRow> for ScheduleEntryRecord {
    fn from(row: EntryRow) -> Self {
        let media = MediaRecord {
            id: row.item.media_id,
            media_type: row.media_type,
            source: row.source,
            external_id: row.external_id,
            title: row.title,
            poster_url: row.poster_url,
            total_seasons: row.total_seasons,
            release_year: row.release_year,
            created_at: row.media_created_at,
        };
        Self {
            item: row.item.into(),
            media,
        }
    }
}

#[async_trait]
impl ScheduleRepo for PostgresRepositories {
    async fn create_item(
        &self,
        params: CreateScheduleParams,
    ) -> Result<ScheduleItemRecord, RepoError> {
        let sql = format!(
            "INSERT INTO schedule_items (user_id, media_id, scheduled_at, season, episode, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(params.user_id)
            .bind(params.media_id)
            .bind(params.scheduled_at)
            .bind(params.season)
            .bind(params.episode)
            .bind(&params.notes)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_entry(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ScheduleEntryRecord>, RepoError> {
        let sql = format!("{ENTRY_SELECT} WHERE i.user_id = $1 AND i.id = $2");
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ScheduleEntryRecord::from))
    }

    async fn list_between(
        &self,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ScheduleEntryRecord>, RepoError> {
        let sql = format!(
            "{ENTRY_SELECT} WHERE i.user_id = $1 AND i.scheduled_at >= $2 AND i.scheduled_at < $3 \
             ORDER BY i.scheduled_at, i.id"
        );
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ScheduleEntryRecord::from).collect())
    }

    async fn next_upcoming(
        &self,
        user_id: Uuid,
        after: OffsetDateTime,
    ) -> Result<Option<ScheduleEntryRecord>, RepoError> {
        let sql = format!(
            "{ENTRY_SELECT} WHERE i.user_id = $1 AND i.scheduled_at >= $2 \
             AND i.completed_at IS NULL ORDER BY i.scheduled_at, i.id LIMIT 1"
        );
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(user_id)
            .bind(after)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ScheduleEntryRecord::from))
    }

    async fn delete_item(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM schedule_items WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_completed(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE schedule_items SET completed_at = COALESCE(completed_at, $2) WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn mark_announced(&self, ids: &[Uuid], at: OffsetDateTime) -> Result<u64, RepoError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("UPDATE schedule_items SET announced_at = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AnalyticsRepo, RecordEventParams, RepoError};
use crate::domain::entities::{AnalyticsCount, AnalyticsEventRecord};
use crate::domain::types::AnalyticsEventType;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    user_id: Uuid,
    event_type: AnalyticsEventType,
    target: Option<String>,
    referrer: Option<String>,
    created_at: OffsetDateTime,
}

impl From<EventRow> for AnalyticsEventRecord {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            event_type: row.event_type,
            target: row.target,
            referrer: row.referrer,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CountRow {
    event_type: AnalyticsEventType,
    count: i64,
}

#[async_trait]
impl AnalyticsRepo for PostgresRepositories {
    async fn record_event(
        &self,
        params: RecordEventParams,
    ) -> Result<AnalyticsEventRecord, RepoError> {
        let row = sqlx::query_as::<_, EventRow>(
            "INSERT INTO analytics_events (user_id, event_type, target, referrer) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, event_type, target, referrer, created_at",
        )
        .bind(params.user_id)
        .bind(params.event_type)
        .bind(&params.target)
        .bind(&params.referrer)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn count_since(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<AnalyticsCount>, RepoError> {
        let rows = sqlx::query_as::<_, CountRow>(
            "SELECT event_type, COUNT(*) AS count FROM analytics_events \
             WHERE user_id = $1 AND created_at >= $2 \
             GROUP BY event_type ORDER BY event_type",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| AnalyticsCount {
                event_type: row.event_type,
                count: row.count,
            })
            .collect())
    }
}

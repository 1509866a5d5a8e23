use std::sync::Arc;

use thiserror::Error;
use time::{Duration, OffsetDateTime};

use creatorhub_api_types::{
    AnalyticsCountView, AnalyticsEventRequest, AnalyticsEventType, AnalyticsSummaryView,
};

use crate::application::repos::{AnalyticsRepo, RecordEventParams, RepoError};
use crate::application::users::UserDirectory;
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::validation;

pub const DEFAULT_SUMMARY_DAYS: u32 = 30;
pub const MAX_SUMMARY_DAYS: u32 = 365;
const TARGET_MAX: usize = 500;
const REFERRER_MAX: usize = 500;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct AnalyticsService {
    analytics: Arc<dyn AnalyticsRepo>,
    directory: UserDirectory,
}

impl AnalyticsService {
    pub fn new(analytics: Arc<dyn AnalyticsRepo>, directory: UserDirectory) -> Self {
        Self {
            analytics,
            directory,
        }
    }

    /// Public ingestion; the referrer comes from the request headers.
    pub async fn record(
        &self,
        request: AnalyticsEventRequest,
        referrer: Option<&str>,
    ) -> Result<(), AnalyticsError> {
        let user = self
            .directory
            .find(&request.username)
            .await?
            .ok_or(AnalyticsError::UserNotFound)?;
        let target = validation::optional_text("target", request.target.as_deref(), TARGET_MAX)?;
        self.store(&user, request.event_type, target, referrer).await
    }

    /// Overlay fetches count against the already-resolved owner.
    pub(crate) async fn record_for(
        &self,
        user: &UserRecord,
        event_type: AnalyticsEventType,
        referrer: Option<&str>,
    ) -> Result<(), AnalyticsError> {
        self.store(user, event_type, None, referrer).await
    }

    pub async fn summary(
        &self,
        user: &UserRecord,
        days: Option<u32>,
    ) -> Result<AnalyticsSummaryView, AnalyticsError> {
        let days = summary_days(days)?;
        let since = OffsetDateTime::now_utc() - Duration::days(i64::from(days));
        let counts = self.analytics.count_since(user.id, since).await?;

        Ok(AnalyticsSummaryView {
            days,
            total: counts.iter().map(|c| c.count).sum(),
            counts: counts
                .iter()
                .map(|c| AnalyticsCountView {
                    event_type: c.event_type,
                    count: c.count,
                })
                .collect(),
        })
    }

    async fn store(
        &self,
        user: &UserRecord,
        event_type: AnalyticsEventType,
        target: Option<String>,
        referrer: Option<&str>,
    ) -> Result<(), AnalyticsError> {
        let referrer = referrer
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.chars().take(REFERRER_MAX).collect::<String>());

        self.analytics
            .record_event(RecordEventParams {
                user_id: user.id,
                event_type,
                target,
                referrer,
            })
            .await?;
        Ok(())
    }
}

fn summary_days(days: Option<u32>) -> Result<u32, DomainError> {
    match days {
        None => Ok(DEFAULT_SUMMARY_DAYS),
        Some(days) if (1..=MAX_SUMMARY_DAYS).contains(&days) => Ok(days),
        Some(_) => Err(DomainError::validation(
            "days",
            format!("must be between 1 and {MAX_SUMMARY_DAYS}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_window_defaults_to_thirty_days() {
        assert_eq!(summary_days(None), Ok(30));
        assert_eq!(summary_days(Some(7)), Ok(7));
        assert!(summary_days(Some(0)).is_err());
        assert!(summary_days(Some(366)).is_err());
    }
}

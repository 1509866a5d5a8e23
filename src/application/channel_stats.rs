//! YouTube channel statistics ingestion.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use creatorhub_api_types::SyncReportView;

use crate::application::ports::{ChannelStatsSource, IntegrationError};
use crate::application::repos::{RepoError, UsersRepo};
use crate::cache::CacheState;

const METRIC_SYNC: &str = "creatorhub_youtube_sync_total";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Integration(#[from] IntegrationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct ChannelStatsService {
    users: Arc<dyn UsersRepo>,
    source: Arc<dyn ChannelStatsSource>,
    cache: CacheState,
}

impl ChannelStatsService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        source: Arc<dyn ChannelStatsSource>,
        cache: CacheState,
    ) -> Self {
        Self {
            users,
            source,
            cache,
        }
    }

    /// Refresh stats for every user with a linked channel.
    ///
    /// Per-channel failures are counted and logged; a missing API key aborts
    /// the run before anything is written.
    pub async fn sync_youtube(&self) -> Result<SyncReportView, SyncError> {
        let linked = self.users.list_youtube_linked().await?;
        let mut report = SyncReportView {
            checked: 0,
            updated: 0,
            failed: 0,
        };

        for user in linked {
            let Some(channel_id) = user.youtube_channel_id.as_deref() else {
                continue;
            };
            report.checked += 1;

            match self.source.channel_stats(channel_id).await {
                Ok(Some(stats)) => {
                    self.users
                        .update_channel_stats(user.id, stats, OffsetDateTime::now_utc())
                        .await?;
                    self.cache.trigger.channel_stats_synced(&user.username);
                    counter!(METRIC_SYNC, "outcome" => "updated").increment(1);
                    report.updated += 1;
                }
                Ok(None) => {
                    warn!(
                        target = "creatorhub::youtube",
                        user_id = %user.id,
                        channel_id,
                        "YouTube channel not found"
                    );
                    counter!(METRIC_SYNC, "outcome" => "missing").increment(1);
                    report.failed += 1;
                }
                Err(err @ IntegrationError::NotConfigured { .. }) => return Err(err.into()),
                Err(err) => {
                    warn!(
                        target = "creatorhub::youtube",
                        user_id = %user.id,
                        channel_id,
                        error = %err,
                        "YouTube stats request failed"
                    );
                    counter!(METRIC_SYNC, "outcome" => "failed").increment(1);
                    report.failed += 1;
                }
            }
        }

        info!(
            target = "creatorhub::youtube",
            checked = report.checked,
            updated = report.updated,
            failed = report.failed,
            "YouTube stats sync finished"
        );
        Ok(report)
    }
}

//! Periodic refresh of YouTube channel statistics.

use apalis::prelude::*;

use crate::application::channel_stats::{ChannelStatsService, SyncError};
use crate::application::ports::IntegrationError;

use super::job_failed;

/// Tick emitted by the cron stream.
#[derive(Default, Debug, Clone)]
pub struct YoutubeSyncJob;

impl From<chrono::DateTime<chrono::Utc>> for YoutubeSyncJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct YoutubeSyncContext {
    pub channel_stats: ChannelStatsService,
}

pub async fn process_youtube_sync_job(
    _job: YoutubeSyncJob,
    ctx: Data<YoutubeSyncContext>,
) -> Result<(), apalis::prelude::Error> {
    match ctx.channel_stats.sync_youtube().await {
        Ok(_) => Ok(()),
        Err(SyncError::Integration(IntegrationError::NotConfigured { .. })) => {
            tracing::debug!(
                target = "creatorhub::jobs::youtube",
                "YouTube API key not configured; skipping sync"
            );
            Ok(())
        }
        Err(err) => {
            tracing::warn!(
                target = "creatorhub::jobs::youtube",
                error = %err,
                "YouTube stats sync failed"
            );
            Err(job_failed(err))
        }
    }
}

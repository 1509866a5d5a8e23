//! Cron-driven background work run by the apalis monitor.

mod context;
mod purge_tokens;
mod youtube_sync;

pub use context::job_failed;
pub use purge_tokens::{PurgeTokensContext, PurgeTokensJob, process_purge_tokens_job};
pub use youtube_sync::{YoutubeSyncContext, YoutubeSyncJob, process_youtube_sync_job};

//! Periodic removal of expired sessions and one-time tokens.

use apalis::prelude::*;
use time::OffsetDateTime;

use crate::application::auth::AuthService;

#[derive(Default, Debug, Clone)]
pub struct PurgeTokensJob;

impl From<chrono::DateTime<chrono::Utc>> for PurgeTokensJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct PurgeTokensContext {
    pub auth: AuthService,
}

pub async fn process_purge_tokens_job(
    _job: PurgeTokensJob,
    ctx: Data<PurgeTokensContext>,
) -> Result<(), apalis::prelude::Error> {
    match ctx.auth.purge_expired(OffsetDateTime::now_utc()).await {
        Ok(report) if report.sessions + report.tokens > 0 => {
            tracing::info!(
                target = "creatorhub::jobs::purge",
                sessions = report.sessions,
                tokens = report.tokens,
                "Purged expired credentials"
            );
        }
        Err(err) => {
            tracing::warn!(
                target = "creatorhub::jobs::purge",
                error = %err,
                "Failed to purge expired credentials"
            );
        }
        _ => {}
    }
    Ok(())
}

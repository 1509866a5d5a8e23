use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::application::ports::RequestLimiter;
use crate::application::services::Services;
use crate::config::Settings;
use crate::infra::db::PostgresRepositories;
use crate::infra::uploads::UploadStorage;

/// Readiness probe behind `/health`.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> Result<(), String>;
}

#[async_trait]
impl HealthProbe for PostgresRepositories {
    async fn check(&self) -> Result<(), String> {
        self.health_check().await.map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub public_url: Url,
    pub cookie_secure: bool,
    pub cron_secret: Option<String>,
    pub upload_limit_bytes: usize,
    pub trusted_proxies: Vec<IpAddr>,
}

impl HttpConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            public_url: settings.server.public_url.clone(),
            cookie_secure: settings.auth.cookie_secure,
            cron_secret: settings.cron.secret.clone(),
            upload_limit_bytes: usize::try_from(settings.uploads.max_request_bytes.get())
                .unwrap_or(usize::MAX),
            trusted_proxies: settings.server.trusted_proxies.clone(),
        }
    }
}

#[derive(Clone)]
pub struct HttpState {
    pub services: Services,
    pub limiter: Arc<dyn RequestLimiter>,
    pub uploads: Arc<UploadStorage>,
    pub health: Arc<dyn HealthProbe>,
    pub config: Arc<HttpConfig>,
}

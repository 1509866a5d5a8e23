//! HTTP clients for the third-party services behind the application ports.

mod catalog;
mod client;
mod discord;
mod email;
mod igdb;
mod jikan;
mod tmdb;
mod token_cache;
mod twitch;
mod youtube;

use std::sync::Arc;

use crate::application::ports::{AppTokenCache, Mailer};
use crate::application::services::Integrations;
use crate::config::IntegrationSettings;
use crate::infra::error::InfraError;

pub use catalog::CatalogClient;
pub use client::build_client;
pub use discord::DiscordAnnouncer;
pub use email::{HttpMailer, LogMailer};
pub use igdb::IgdbClient;
pub use jikan::JikanClient;
pub use tmdb::TmdbClient;
pub use token_cache::InMemoryTokenCache;
pub use twitch::TwitchClient;
pub use youtube::YoutubeClient;

/// Build every client from settings, sharing one HTTP connection pool and
/// one app-token cache.
pub fn build(
    settings: &IntegrationSettings,
    tokens: Arc<dyn AppTokenCache>,
) -> Result<Integrations, InfraError> {
    let http = build_client(settings.http_timeout)?;

    let twitch = TwitchClient::new(
        http.clone(),
        settings.twitch.clone(),
        settings.twitch_auth_url.clone(),
        settings.twitch_api_url.clone(),
        tokens,
    );
    let catalog = CatalogClient::new(
        TmdbClient::new(
            http.clone(),
            settings.tmdb_api_key.clone(),
            settings.tmdb_base_url.clone(),
            settings.tmdb_image_base_url.clone(),
        ),
        JikanClient::new(http.clone(), settings.jikan_base_url.clone()),
        IgdbClient::new(http.clone(), settings.igdb_base_url.clone(), twitch.clone()),
    );
    let mailer: Arc<dyn Mailer> = match settings.email.clone() {
        Some(email) => Arc::new(HttpMailer::new(http.clone(), email)),
        None => Arc::new(LogMailer),
    };

    Ok(Integrations {
        catalog: Arc::new(catalog),
        live: Arc::new(twitch),
        channel_stats: Arc::new(YoutubeClient::new(
            http.clone(),
            settings.youtube_api_key.clone(),
            settings.youtube_base_url.clone(),
        )),
        announcer: Arc::new(DiscordAnnouncer::new(http)),
        mailer,
    })
}

//! Twitch Helix: app access tokens and live status.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use creatorhub_api_types::LiveStatusView;

use crate::application::ports::{AppTokenCache, IntegrationError, LiveStatusSource};
use crate::config::TwitchCredentials;

use super::client::{endpoint, send_json, with_query};

const SERVICE: &str = "twitch";
const TOKEN_PROVIDER: &str = "twitch";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct StreamsResponse {
    data: Vec<StreamData>,
}

#[derive(Deserialize)]
struct StreamData {
    title: Option<String>,
    game_name: Option<String>,
    viewer_count: Option<i64>,
}

/// App-token authenticated Twitch client; IGDB shares its credentials.
#[derive(Clone)]
pub struct TwitchClient {
    http: Client,
    credentials: Option<TwitchCredentials>,
    auth_url: Url,
    api_url: Url,
    tokens: Arc<dyn AppTokenCache>,
}

impl TwitchClient {
    pub fn new(
        http: Client,
        credentials: Option<TwitchCredentials>,
        auth_url: Url,
        api_url: Url,
        tokens: Arc<dyn AppTokenCache>,
    ) -> Self {
        Self {
            http,
            credentials,
            auth_url,
            api_url,
            tokens,
        }
    }

    pub fn credentials(&self, service: &'static str) -> Result<&TwitchCredentials, IntegrationError> {
        self.credentials
            .as_ref()
            .ok_or(IntegrationError::not_configured(service))
    }

    /// Cached client-credentials token, refreshed on demand.
    pub async fn app_token(&self, service: &'static str) -> Result<String, IntegrationError> {
        let credentials = self.credentials(service)?;
        if let Some(token) = self.tokens.get(TOKEN_PROVIDER, Instant::now()) {
            return Ok(token);
        }

        let url = with_query(
            self.auth_url.clone(),
            &[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ],
        );
        let response: TokenResponse = send_json(service, self.http.post(url)).await?;

        self.tokens.put(
            TOKEN_PROVIDER,
            response.access_token.clone(),
            Duration::from_secs(response.expires_in),
            Instant::now(),
        );
        Ok(response.access_token)
    }
}

#[async_trait]
impl LiveStatusSource for TwitchClient {
    async fn live_status(&self, login: &str) -> Result<LiveStatusView, IntegrationError> {
        let token = self.app_token(SERVICE).await?;
        let credentials = self.credentials(SERVICE)?;
        let url = with_query(
            endpoint(SERVICE, &self.api_url, "streams")?,
            &[("user_login", login)],
        );

        let request = self
            .http
            .get(url)
            .header("Client-Id", &credentials.client_id)
            .bearer_auth(token);
        let response: StreamsResponse = send_json(SERVICE, request).await?;

        Ok(live_view(login, response.data.into_iter().next()))
    }
}

fn live_view(login: &str, stream: Option<StreamData>) -> LiveStatusView {
    match stream {
        Some(stream) => LiveStatusView {
            login: login.to_string(),
            live: true,
            title: stream.title,
            game_name: stream.game_name,
            viewer_count: stream.viewer_count,
        },
        None => LiveStatusView {
            login: login.to_string(),
            live: false,
            title: None,
            game_name: None,
            viewer_count: None,
        },
    }
}

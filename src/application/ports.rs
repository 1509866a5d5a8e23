//! Seams to third-party services and process-local shared state.
//!
//! Services depend on these traits only; `infra` provides the HTTP-backed and
//! in-memory implementations, tests provide fakes.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use creatorhub_api_types::{LiveStatusView, SearchResultView};

use crate::application::repos::ChannelStats;
use crate::domain::types::{MediaType, SearchKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
    #[error("{service} responded with status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} returned an unexpected payload: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl IntegrationError {
    pub fn not_configured(service: &'static str) -> Self {
        Self::NotConfigured { service }
    }

    pub fn transport(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            service,
            message: err.to_string(),
        }
    }

    pub fn decode(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            service,
            message: err.to_string(),
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            IntegrationError::NotConfigured { service }
            | IntegrationError::Transport { service, .. }
            | IntegrationError::Status { service, .. }
            | IntegrationError::Decode { service, .. } => service,
        }
    }
}

/// Title search against TMDB, Jikan or IGDB depending on `kind`.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
    ) -> Result<Vec<SearchResultView>, IntegrationError>;
}

#[async_trait]
pub trait LiveStatusSource: Send + Sync {
    async fn live_status(&self, login: &str) -> Result<LiveStatusView, IntegrationError>;
}

#[async_trait]
pub trait ChannelStatsSource: Send + Sync {
    /// `Ok(None)` when the channel does not exist.
    async fn channel_stats(&self, channel_id: &str)
    -> Result<Option<ChannelStats>, IntegrationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementItem {
    pub title: String,
    pub media_type: MediaType,
    pub poster_url: Option<String>,
    pub scheduled_at: OffsetDateTime,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub creator: String,
    pub twitch_login: Option<String>,
    pub items: Vec<AnnouncementItem>,
}

#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(
        &self,
        webhook_url: &str,
        announcement: &Announcement,
    ) -> Result<(), IntegrationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError>;
}

/// Process-wide store of OAuth app access tokens.
pub trait AppTokenCache: Send + Sync {
    fn get(&self, provider: &str, now: Instant) -> Option<String>;

    /// Store `token`, which the provider says expires after `expires_in`.
    fn put(&self, provider: &str, token: String, expires_in: Duration, now: Instant);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

/// Sliding-window request limiter keyed by caller and route.
pub trait RequestLimiter: Send + Sync {
    fn check(&self, caller: &str, route: &str) -> RateDecision;

    fn limit(&self) -> u32;
}

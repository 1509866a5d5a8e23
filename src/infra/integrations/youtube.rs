//! YouTube Data API channel statistics.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::application::ports::{ChannelStatsSource, IntegrationError};
use crate::application::repos::ChannelStats;

use super::client::{endpoint, send_json, with_query};

const SERVICE: &str = "youtube";

#[derive(Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Deserialize)]
struct ChannelItem {
    statistics: Statistics,
}

/// YouTube reports counters as decimal strings.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    subscriber_count: Option<String>,
    view_count: Option<String>,
    video_count: Option<String>,
}

#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    api_key: Option<String>,
    base_url: Url,
}

impl YoutubeClient {
    pub fn new(http: Client, api_key: Option<String>, base_url: Url) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl ChannelStatsSource for YoutubeClient {
    async fn channel_stats(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelStats>, IntegrationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(IntegrationError::not_configured(SERVICE))?;
        let url = with_query(
            endpoint(SERVICE, &self.base_url, "channels")?,
            &[("part", "statistics"), ("id", channel_id), ("key", api_key)],
        );

        let response: ChannelsResponse = send_json(SERVICE, self.http.get(url)).await?;
        response
            .items
            .into_iter()
            .next()
            .map(|item| parse_statistics(&item.statistics))
            .transpose()
    }
}

fn parse_statistics(stats: &Statistics) -> Result<ChannelStats, IntegrationError> {
    Ok(ChannelStats {
        subscribers: parse_count("subscriberCount", stats.subscriber_count.as_deref())?,
        views: parse_count("viewCount", stats.view_count.as_deref())?,
        videos: parse_count("videoCount", stats.video_count.as_deref())?,
    })
}

/// Hidden subscriber counts are omitted by the API and read as zero.
fn parse_count(field: &str, value: Option<&str>) -> Result<i64, IntegrationError> {
    match value {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| IntegrationError::decode(SERVICE, format!("{field} is not a number"))),
    }
}

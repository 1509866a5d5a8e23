//! Jikan (MyAnimeList) anime search. No credentials required.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use creatorhub_api_types::SearchResultView;

use crate::application::ports::IntegrationError;
use crate::domain::types::{MediaSource, MediaType};

use super::client::{endpoint, send_json, with_query};

const SERVICE: &str = "jikan";
const RESULT_LIMIT: &str = "10";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<AnimeItem>,
}

#[derive(Deserialize)]
struct AnimeItem {
    mal_id: i64,
    title: String,
    title_english: Option<String>,
    images: Option<Images>,
    year: Option<i32>,
}

#[derive(Deserialize)]
struct Images {
    jpg: Option<ImageSet>,
}

#[derive(Deserialize)]
struct ImageSet {
    large_image_url: Option<String>,
    image_url: Option<String>,
}

#[derive(Clone)]
pub struct JikanClient {
    http: Client,
    base_url: Url,
}

impl JikanClient {
    pub fn new(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResultView>, IntegrationError> {
        let url = with_query(
            endpoint(SERVICE, &self.base_url, "anime")?,
            &[("q", query), ("limit", RESULT_LIMIT), ("sfw", "true")],
        );
        let response: SearchResponse = send_json(SERVICE, self.http.get(url)).await?;
        Ok(response.data.into_iter().map(to_result).collect())
    }
}

fn to_result(item: AnimeItem) -> SearchResultView {
    let poster_url = item
        .images
        .and_then(|images| images.jpg)
        .and_then(|jpg| jpg.large_image_url.or(jpg.image_url));

    SearchResultView {
        source: MediaSource::Jikan,
        external_id: item.mal_id.to_string(),
        media_type: MediaType::Anime,
        title: item.title_english.unwrap_or(item.title),
        poster_url,
        release_year: item.year,
        total_seasons: None,
    }
}

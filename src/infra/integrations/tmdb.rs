//! TMDB movie and TV search.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use creatorhub_api_types::SearchResultView;

use crate::application::ports::IntegrationError;
use crate::domain::types::{MediaSource, MediaType};

use super::client::{endpoint, send_json, with_query, year_from_date};

const SERVICE: &str = "tmdb";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: i64,
    /// Movies carry `title`, TV shows `name`.
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
}

#[derive(Clone)]
pub struct TmdbClient {
    http: Client,
    api_key: Option<String>,
    base_url: Url,
    image_base_url: Url,
}

impl TmdbClient {
    pub fn new(http: Client, api_key: Option<String>, base_url: Url, image_base_url: Url) -> Self {
        Self {
            http,
            api_key,
            base_url,
            image_base_url,
        }
    }

    /// `media_type` is either [`MediaType::Movie`] or [`MediaType::Series`].
    pub async fn search(
        &self,
        media_type: MediaType,
        query: &str,
    ) -> Result<Vec<SearchResultView>, IntegrationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(IntegrationError::not_configured(SERVICE))?;
        let path = match media_type {
            MediaType::Series => "search/tv",
            _ => "search/movie",
        };
        let url = with_query(
            endpoint(SERVICE, &self.base_url, path)?,
            &[("api_key", api_key), ("query", query), ("include_adult", "false")],
        );

        let response: SearchResponse = send_json(SERVICE, self.http.get(url)).await?;
        Ok(response
            .results
            .into_iter()
            .filter_map(|item| self.to_result(media_type, item))
            .collect())
    }

    fn to_result(&self, media_type: MediaType, item: SearchItem) -> Option<SearchResultView> {
        let title = item.title.or(item.name)?;
        let poster_url = item
            .poster_path
            .as_deref()
            .and_then(|path| self.image_base_url.join(path.trim_start_matches('/')).ok())
            .map(String::from);
        let date = item.release_date.or(item.first_air_date);

        Some(SearchResultView {
            source: MediaSource::Tmdb,
            external_id: item.id.to_string(),
            media_type,
            title,
            poster_url,
            release_year: year_from_date(date.as_deref()),
            total_seasons: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TmdbClient {
        TmdbClient::new(
            Client::new(),
            Some("key".to_string()),
            Url::parse("https://api.themoviedb.org/3/").unwrap(),
            Url::parse("https://image.tmdb.org/t/p/w500/").unwrap(),
        )
    }

    #[test]
    fn tv_results_use_name_and_air_date() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"page":1,"results":[{"id":1399,"name":"Game of Thrones","poster_path":"/u3b.jpg","first_air_date":"2011-04-17"}]}"#,
        )
        .unwrap();
        let client = client();
        let results: Vec<_> = response
            .results
            .into_iter()
            .filter_map(|item| client.to_result(MediaType::Series, item))
            .collect();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Game of Thrones");
        assert_eq!(results[0].external_id, "1399");
        assert_eq!(results[0].release_year, Some(2011));
        assert_eq!(
            results[0].poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/u3b.jpg")
        );
    }

    #[test]
    fn untitled_results_are_skipped() {
        let item = SearchItem {
            id: 1,
            title: None,
            name: None,
            poster_path: None,
            release_date: None,
            first_air_date: None,
        };
        assert!(client().to_result(MediaType::Movie, item).is_none());
    }
}

//! IGDB game search, authenticated with the Twitch app token.

use reqwest::Client;
use serde::Deserialize;
use time::OffsetDateTime;
use url::Url;

use creatorhub_api_types::SearchResultView;

use crate::application::ports::IntegrationError;
use crate::domain::types::{MediaSource, MediaType};

use super::client::{endpoint, send_json};
use super::twitch::TwitchClient;

const SERVICE: &str = "igdb";

#[derive(Deserialize)]
struct GameItem {
    id: i64,
    name: String,
    cover: Option<Cover>,
    first_release_date: Option<i64>,
}

#[derive(Deserialize)]
struct Cover {
    url: Option<String>,
}

#[derive(Clone)]
pub struct IgdbClient {
    http: Client,
    base_url: Url,
    twitch: TwitchClient,
}

impl IgdbClient {
    pub fn new(http: Client, base_url: Url, twitch: TwitchClient) -> Self {
        Self {
            http,
            base_url,
            twitch,
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResultView>, IntegrationError> {
        let token = self.twitch.app_token(SERVICE).await?;
        let client_id = self.twitch.credentials(SERVICE)?.client_id.clone();
        let url = endpoint(SERVICE, &self.base_url, "games")?;

        let request = self
            .http
            .post(url)
            .header("Client-ID", client_id)
            .bearer_auth(token)
            .body(apicalypse_query(query));
        let games: Vec<GameItem> = send_json(SERVICE, request).await?;
        Ok(games.into_iter().map(to_result).collect())
    }
}

fn apicalypse_query(query: &str) -> String {
    let escaped = query.replace(['"', '\\'], " ");
    format!("search \"{escaped}\"; fields name,cover.url,first_release_date; limit 10;")
}

/// IGDB hands out protocol-relative thumbnail URLs.
fn cover_url(raw: &str) -> String {
    let sized = raw.replace("t_thumb", "t_cover_big");
    if sized.starts_with("//") {
        format!("https:{sized}")
    } else {
        sized
    }
}

fn to_result(game: GameItem) -> SearchResultView {
    SearchResultView {
        source: MediaSource::Igdb,
        external_id: game.id.to_string(),
        media_type: MediaType::Game,
        title: game.name,
        poster_url: game.cover.and_then(|cover| cover.url).map(|url| cover_url(&url)),
        release_year: game
            .first_release_date
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
            .map(|date| date.year()),
        total_seasons: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_stripped_from_queries() {
        assert_eq!(
            apicalypse_query("the \"witcher\""),
            "search \"the  witcher \"; fields name,cover.url,first_release_date; limit 10;"
        );
    }

    #[test]
    fn covers_become_absolute_and_larger() {
        let games: Vec<GameItem> = serde_json::from_str(
            r#"[{"id":1942,"name":"The Witcher 3: Wild Hunt","cover":{"id":1,"url":"//images.igdb.com/igdb/image/upload/t_thumb/co1wyy.jpg"},"first_release_date":1431993600}]"#,
        )
        .unwrap();
        let result = to_result(games.into_iter().next().unwrap());

        assert_eq!(
            result.poster_url.as_deref(),
            Some("https://images.igdb.com/igdb/image/upload/t_cover_big/co1wyy.jpg")
        );
        assert_eq!(result.release_year, Some(2015));
    }
}

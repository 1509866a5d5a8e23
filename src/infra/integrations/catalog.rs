use async_trait::async_trait;

use creatorhub_api_types::SearchResultView;

use crate::application::ports::{IntegrationError, MediaCatalog};
use crate::domain::types::SearchKind;

use super::igdb::IgdbClient;
use super::jikan::JikanClient;
use super::tmdb::TmdbClient;

/// Routes a search to the catalogue that owns the media kind.
#[derive(Clone)]
pub struct CatalogClient {
    tmdb: TmdbClient,
    jikan: JikanClient,
    igdb: IgdbClient,
}

impl CatalogClient {
    pub fn new(tmdb: TmdbClient, jikan: JikanClient, igdb: IgdbClient) -> Self {
        Self { tmdb, jikan, igdb }
    }
}

#[async_trait]
impl MediaCatalog for CatalogClient {
    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
    ) -> Result<Vec<SearchResultView>, IntegrationError> {
        match kind {
            SearchKind::Movie | SearchKind::Series => {
                self.tmdb.search(kind.media_type(), query).await
            }
            SearchKind::Anime => self.jikan.search(query).await,
            SearchKind::Game => self.igdb.search(query).await,
        }
    }
}

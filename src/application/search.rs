//! Catalogue search and Twitch live status, both read through the cache.

use std::sync::Arc;

use thiserror::Error;

use creatorhub_api_types::{LiveStatusView, SearchResultView};

use crate::application::ports::{IntegrationError, LiveStatusSource, MediaCatalog};
use crate::cache::{CacheSpec, CacheState};
use crate::domain::error::DomainError;
use crate::domain::types::SearchKind;
use crate::domain::validation;

const QUERY_MAX: usize = 100;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

#[derive(Clone)]
pub struct SearchService {
    catalog: Arc<dyn MediaCatalog>,
    live: Arc<dyn LiveStatusSource>,
    cache: CacheState,
}

impl SearchService {
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        live: Arc<dyn LiveStatusSource>,
        cache: CacheState,
    ) -> Self {
        Self {
            catalog,
            live,
            cache,
        }
    }

    pub async fn search(
        &self,
        kind: SearchKind,
        query: &str,
    ) -> Result<Vec<SearchResultView>, SearchError> {
        let query = validation::required_text("q", query, QUERY_MAX)?;
        let catalog = self.catalog.clone();
        let spec = CacheSpec::search(kind, &query);

        let results = self
            .cache
            .loader
            .get_or_load(&spec, move || async move {
                catalog.search(kind, &query).await
            })
            .await?;
        Ok(results)
    }

    pub async fn live_status(&self, login: &str) -> Result<LiveStatusView, SearchError> {
        let login = validation::twitch_login(login)?;
        let live = self.live.clone();
        let spec = CacheSpec::twitch_live(&login);

        let status = self
            .cache
            .loader
            .get_or_load(&spec, move || async move { live.live_status(&login).await })
            .await?;
        Ok(status)
    }
}

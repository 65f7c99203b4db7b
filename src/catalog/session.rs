//! Browse session: one collection cache with its search overlay, wired from
//! configuration. This is the surface a display layer talks to.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::collection::{CollectionCache, CollectionEvent, CollectionSnapshot, LoadOutcome};
use super::fetcher::PageFetcher;
use super::search::{DebouncedSearch, SearchOverlay};
use crate::config::Config;
use crate::errors::SourceResult;
use crate::models::{Entry, PokemonDetail};
use crate::sources::CatalogSource;

pub struct BrowseSession {
    cache: Arc<CollectionCache>,
    overlay: Arc<SearchOverlay>,
    debounced: DebouncedSearch,
}

impl BrowseSession {
    pub fn new(source: Arc<dyn CatalogSource>, config: &Config) -> Self {
        let fetcher = PageFetcher::new(
            source,
            config.catalog.page_size,
            config.catalog.sprite_base_url.clone(),
        );
        let cache = Arc::new(CollectionCache::new(
            fetcher,
            config.catalog.prefetch_threshold,
            config.catalog.event_channel_capacity,
        ));
        let overlay = Arc::new(SearchOverlay::new(Arc::clone(&cache)));
        let debounced = DebouncedSearch::new(Arc::clone(&overlay), config.search.debounce);

        Self {
            cache,
            overlay,
            debounced,
        }
    }

    pub fn cache(&self) -> &Arc<CollectionCache> {
        &self.cache
    }

    pub fn overlay(&self) -> &Arc<SearchOverlay> {
        &self.overlay
    }

    pub async fn request_next(&self) -> SourceResult<LoadOutcome> {
        self.cache.request_next().await
    }

    pub async fn retry(&self) -> SourceResult<LoadOutcome> {
        self.cache.retry().await
    }

    /// Report that the item at `index` of the visible list is on screen
    pub async fn on_item_visible(&self, index: usize) -> SourceResult<LoadOutcome> {
        self.cache.on_item_visible(index).await
    }

    /// Apply a query immediately
    pub async fn search(&self, query: &str) -> Vec<Entry> {
        self.overlay.search(query).await
    }

    /// Apply a query after the configured debounce; `None` if superseded
    pub async fn search_debounced(&self, query: &str) -> Option<Vec<Entry>> {
        self.debounced.submit(query).await
    }

    pub async fn visible(&self) -> Vec<Entry> {
        self.overlay.visible().await
    }

    pub async fn state(&self) -> CollectionSnapshot {
        self.cache.state().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.cache.subscribe()
    }

    pub async fn detail(&self, name: &str) -> SourceResult<PokemonDetail> {
        self.cache.fetcher().fetch_detail(name).await
    }
}

//! Search overlay: narrows the visible set without touching the cache
//!
//! The first non-empty query captures a baseline snapshot of the cache and
//! suspends its growth. Every query while active filters that same baseline,
//! so results stay stable for the whole search session. An empty query drops
//! the baseline and hands back the live cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use super::collection::CollectionCache;
use crate::models::Entry;

/// Entries whose name contains the trimmed query (case-insensitive) or whose
/// id equals it exactly, in their original order.
pub fn filter_entries(entries: &[Entry], query: &str) -> Vec<Entry> {
    entries
        .iter()
        .filter(|entry| entry.matches_query(query))
        .cloned()
        .collect()
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    active: bool,
    baseline: Option<Arc<Vec<Entry>>>,
}

pub struct SearchOverlay {
    cache: Arc<CollectionCache>,
    state: RwLock<SearchState>,
}

impl SearchOverlay {
    pub fn new(cache: Arc<CollectionCache>) -> Self {
        Self {
            cache,
            state: RwLock::new(SearchState::default()),
        }
    }

    /// Apply `query` and return the resulting visible set
    pub async fn search(&self, query: &str) -> Vec<Entry> {
        let mut state = self.state.write().await;

        if query.is_empty() {
            if state.active {
                debug!("Search cleared, restoring live collection");
            }
            state.query.clear();
            state.active = false;
            state.baseline = None;
            self.cache.set_growth_suspended(false).await;
            return self.cache.entries().await;
        }

        let baseline = match &state.baseline {
            Some(baseline) => Arc::clone(baseline),
            None => {
                // Suspend first so no load can start after the snapshot is taken
                self.cache.set_growth_suspended(true).await;
                let snapshot = Arc::new(self.cache.entries().await);
                debug!("Search started, baseline of {} entries", snapshot.len());
                state.baseline = Some(Arc::clone(&snapshot));
                state.active = true;
                snapshot
            }
        };

        state.query = query.to_string();
        let results = filter_entries(&baseline, query);
        debug!("Query '{}' matched {} of {} entries", query, results.len(), baseline.len());
        results
    }

    /// Current visible set without changing the query
    pub async fn visible(&self) -> Vec<Entry> {
        let state = self.state.read().await;
        match (&state.baseline, state.active) {
            (Some(baseline), true) => filter_entries(baseline, &state.query),
            _ => self.cache.entries().await,
        }
    }

    pub async fn is_active(&self) -> bool {
        self.state.read().await.active
    }

    pub async fn query(&self) -> String {
        self.state.read().await.query.clone()
    }

    /// Size of the captured baseline, if a search is active
    pub async fn baseline_len(&self) -> Option<usize> {
        self.state.read().await.baseline.as_ref().map(|b| b.len())
    }
}

/// Coalesces rapid queries: only the most recent one submitted within the
/// debounce window reaches the overlay.
pub struct DebouncedSearch {
    overlay: Arc<SearchOverlay>,
    delay: Duration,
    generation: AtomicU64,
}

impl DebouncedSearch {
    pub fn new(overlay: Arc<SearchOverlay>, delay: Duration) -> Self {
        Self {
            overlay,
            delay,
            generation: AtomicU64::new(0),
        }
    }

    /// Submit a query. Returns the visible set if this query was applied, or
    /// `None` if a newer query superseded it during the quiet period.
    pub async fn submit(&self, query: &str) -> Option<Vec<Entry>> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
            if self.generation.load(Ordering::SeqCst) != ticket {
                debug!("Query '{}' superseded before debounce elapsed", query);
                return None;
            }
        }

        Some(self.overlay.search(query).await)
    }
}

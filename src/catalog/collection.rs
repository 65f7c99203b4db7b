//! Collection cache: the single ordered, deduplicated list of entries
//!
//! All mutable state sits behind one `RwLock`. Only the load-completion path
//! appends, and readers always get a cloned snapshot, so a reader never sees
//! a half-merged page. At most one page load is in flight at a time, which
//! keeps page keys sequential and merges totally ordered.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, warn};

use super::fetcher::PageFetcher;
use crate::errors::{SourceError, SourceResult};
use crate::models::{Entry, PageRequest, PageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Error,
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Idle => write!(f, "idle"),
            LoadState::Loading => write!(f, "loading"),
            LoadState::Error => write!(f, "error"),
        }
    }
}

/// Why a load request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another page load is in flight
    AlreadyLoading,
    /// An empty page was already received
    EndReached,
    /// A search overlay is active
    GrowthSuspended,
    /// The last load failed; only an explicit request recovers
    AwaitingRetry,
    /// The visible position is not close enough to the end
    NotNeeded,
    /// `retry()` called without a pending error
    NothingToRetry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Appended {
        key: u32,
        added: usize,
        duplicates: usize,
        malformed: usize,
    },
    EndReached {
        key: u32,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl LoadOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Notifications for observers of the collection (display layer, driver)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    PageAppended { key: u32, added: usize, total: usize },
    EndReached { key: u32 },
    LoadFailed { key: u32, error: String },
    GrowthSuspended,
    GrowthResumed,
}

/// Point-in-time view of the cache flags and counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSnapshot {
    pub len: usize,
    pub load_state: LoadState,
    pub end_reached: bool,
    pub last_error: Option<String>,
    pub next_key: u32,
    pub growth_suspended: bool,
    pub pages_loaded: u32,
    pub malformed_skipped: usize,
    pub duplicates_dropped: usize,
}

impl CollectionSnapshot {
    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }
}

#[derive(Debug)]
struct CollectionState {
    entries: Vec<Entry>,
    seen: HashSet<u32>,
    load_state: LoadState,
    end_reached: bool,
    last_error: Option<String>,
    next_key: u32,
    last_attempted_key: Option<u32>,
    growth_suspended: bool,
    pages_loaded: u32,
    malformed_skipped: usize,
    duplicates_dropped: usize,
}

impl CollectionState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            seen: HashSet::new(),
            load_state: LoadState::Idle,
            end_reached: false,
            last_error: None,
            next_key: 1,
            last_attempted_key: None,
            growth_suspended: false,
            pages_loaded: 0,
            malformed_skipped: 0,
            duplicates_dropped: 0,
        }
    }

    fn begin_load(&mut self, key: u32) {
        self.load_state = LoadState::Loading;
        self.last_error = None;
        self.last_attempted_key = Some(key);
    }
}

pub struct CollectionCache {
    fetcher: PageFetcher,
    state: RwLock<CollectionState>,
    events: broadcast::Sender<CollectionEvent>,
    prefetch_threshold: usize,
}

impl CollectionCache {
    pub fn new(fetcher: PageFetcher, prefetch_threshold: usize, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            fetcher,
            state: RwLock::new(CollectionState::new()),
            events,
            prefetch_threshold,
        }
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.events.subscribe()
    }

    /// Load the next page unless loading, finished, or suspended.
    ///
    /// After a failure this retries the same key. The load itself runs on a
    /// spawned task, so dropping the returned future never leaves the cache
    /// stuck in `Loading`.
    pub async fn request_next(self: &Arc<Self>) -> SourceResult<LoadOutcome> {
        let key = {
            let mut state = self.state.write().await;
            if state.load_state == LoadState::Loading {
                debug!("Page {} already loading, skipping request", state.next_key);
                return Ok(LoadOutcome::skipped(SkipReason::AlreadyLoading));
            }
            if state.end_reached {
                return Ok(LoadOutcome::skipped(SkipReason::EndReached));
            }
            if state.growth_suspended {
                return Ok(LoadOutcome::skipped(SkipReason::GrowthSuspended));
            }
            let key = state.next_key;
            state.begin_load(key);
            key
        };

        self.spawn_load(key).await
    }

    /// Clear the pending error and re-run the last attempted key
    pub async fn retry(self: &Arc<Self>) -> SourceResult<LoadOutcome> {
        let key = {
            let mut state = self.state.write().await;
            if state.load_state == LoadState::Loading {
                return Ok(LoadOutcome::skipped(SkipReason::AlreadyLoading));
            }
            if state.last_error.is_none() {
                return Ok(LoadOutcome::skipped(SkipReason::NothingToRetry));
            }
            if state.growth_suspended {
                return Ok(LoadOutcome::skipped(SkipReason::GrowthSuspended));
            }
            let key = state.last_attempted_key.unwrap_or(state.next_key);
            info!("Retrying page {} after: {:?}", key, state.last_error);
            state.begin_load(key);
            key
        };

        self.spawn_load(key).await
    }

    /// Whether showing `visible_index` should pull in the next page
    pub fn should_prefetch(&self, visible_index: usize, len: usize) -> bool {
        visible_index.saturating_add(self.prefetch_threshold) >= len
    }

    /// Automatic growth driven by the display layer's scroll position.
    ///
    /// Unlike `request_next`, this does nothing while a failed load is
    /// pending: recovery has to be explicit.
    pub async fn on_item_visible(self: &Arc<Self>, visible_index: usize) -> SourceResult<LoadOutcome> {
        {
            let state = self.state.read().await;
            if state.load_state == LoadState::Error {
                return Ok(LoadOutcome::skipped(SkipReason::AwaitingRetry));
            }
            if !self.should_prefetch(visible_index, state.entries.len()) {
                return Ok(LoadOutcome::skipped(SkipReason::NotNeeded));
            }
        }
        self.request_next().await
    }

    async fn spawn_load(self: &Arc<Self>, key: u32) -> SourceResult<LoadOutcome> {
        let cache = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let result = cache.fetcher.fetch_page(PageRequest { key }).await;
            cache.complete_load(key, result).await
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!("Page {} load task failed: {}", key, e);
                let err = SourceError::network(format!("page {key}"), e.to_string());
                self.complete_load(key, Err(err)).await
            }
        }
    }

    async fn complete_load(
        &self,
        key: u32,
        result: SourceResult<PageResult>,
    ) -> SourceResult<LoadOutcome> {
        let mut state = self.state.write().await;
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("Loading page {} failed: {}", key, e);
                state.load_state = LoadState::Error;
                state.last_error = Some(e.to_string());
                let _ = self.events.send(CollectionEvent::LoadFailed {
                    key,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let mut added = 0;
        let mut duplicates = 0;
        for entry in page.entries {
            if state.seen.insert(entry.numeric_id) {
                state.entries.push(entry);
                added += 1;
            } else {
                duplicates += 1;
            }
        }

        state.pages_loaded += 1;
        state.malformed_skipped += page.malformed;
        state.duplicates_dropped += duplicates;
        state.load_state = LoadState::Idle;

        if duplicates > 0 {
            debug!("Dropped {} duplicate entries from page {}", duplicates, key);
        }

        match page.next_key {
            Some(next_key) => {
                state.next_key = next_key;
                info!(
                    "Page {} merged: {} new entries ({} total)",
                    key,
                    added,
                    state.entries.len()
                );
                let _ = self.events.send(CollectionEvent::PageAppended {
                    key,
                    added,
                    total: state.entries.len(),
                });
                Ok(LoadOutcome::Appended {
                    key,
                    added,
                    duplicates,
                    malformed: page.malformed,
                })
            }
            None => {
                state.end_reached = true;
                info!(
                    "End of catalog reached at page {} ({} entries)",
                    key,
                    state.entries.len()
                );
                let _ = self.events.send(CollectionEvent::EndReached { key });
                Ok(LoadOutcome::EndReached { key })
            }
        }
    }

    /// Suspend or resume growth; used by the search overlay
    pub async fn set_growth_suspended(&self, suspended: bool) {
        let mut state = self.state.write().await;
        if state.growth_suspended == suspended {
            return;
        }
        state.growth_suspended = suspended;
        let event = if suspended {
            CollectionEvent::GrowthSuspended
        } else {
            CollectionEvent::GrowthResumed
        };
        debug!("Collection growth {}", if suspended { "suspended" } else { "resumed" });
        let _ = self.events.send(event);
    }

    /// Consistent copy of the materialized entries
    pub async fn entries(&self) -> Vec<Entry> {
        self.state.read().await.entries.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn state(&self) -> CollectionSnapshot {
        let state = self.state.read().await;
        CollectionSnapshot {
            len: state.entries.len(),
            load_state: state.load_state,
            end_reached: state.end_reached,
            last_error: state.last_error.clone(),
            next_key: state.next_key,
            growth_suspended: state.growth_suspended,
            pages_loaded: state.pages_loaded,
            malformed_skipped: state.malformed_skipped,
            duplicates_dropped: state.duplicates_dropped,
        }
    }
}

//! Catalog paging engine
//!
//! Data flows one way: `PageFetcher` normalizes remote pages,
//! `CollectionCache` appends them, `SearchOverlay` filters what is visible.
//! `BrowseSession` wires the three together from configuration.

pub mod collection;
pub mod fetcher;
pub mod search;
pub mod session;

pub use collection::{
    CollectionCache, CollectionEvent, CollectionSnapshot, LoadOutcome, LoadState, SkipReason,
};
pub use fetcher::PageFetcher;
pub use search::{DebouncedSearch, SearchOverlay, filter_entries};
pub use session::BrowseSession;

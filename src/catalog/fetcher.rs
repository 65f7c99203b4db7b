//! Page fetch controller: turns one remote listing page into normalized entries

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{SourceError, SourceResult};
use crate::models::{CatalogRecord, Entry, PageRequest, PageResult, PokemonDetail};
use crate::sources::CatalogSource;
use crate::utils::{capitalize_first, derive_numeric_id, sprite_url};

pub struct PageFetcher {
    source: Arc<dyn CatalogSource>,
    page_size: u32,
    sprite_base_url: String,
}

impl PageFetcher {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        page_size: u32,
        sprite_base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            page_size,
            sprite_base_url: sprite_base_url.into(),
        }
    }

    /// Fetch and normalize page `key`.
    ///
    /// Malformed records are skipped and counted. Paging ends only when the
    /// remote listing itself comes back empty, so a page made entirely of
    /// malformed records does not stop growth. Remote failures are returned
    /// untouched so the caller decides what to do with its own state.
    pub async fn fetch_page(&self, request: PageRequest) -> SourceResult<PageResult> {
        if request.key == 0 {
            return Err(SourceError::invalid_request("key", "page keys start at 1"));
        }
        if self.page_size == 0 {
            return Err(SourceError::invalid_request("page_size", "must be greater than 0"));
        }

        let offset = request.offset(self.page_size);
        debug!(
            "Fetching page {} (limit={}, offset={})",
            request.key, self.page_size, offset
        );

        let page = self.source.list_page(self.page_size, offset).await?;

        let mut malformed = 0;
        let entries: Vec<Entry> = page
            .results
            .iter()
            .filter_map(|record| match self.normalize(record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    malformed += 1;
                    warn!("Skipping record '{}' on page {}: {}", record.name, request.key, e);
                    None
                }
            })
            .collect();

        let next_key = if page.results.is_empty() {
            None
        } else {
            Some(request.key + 1)
        };
        let prev_key = if request.key == 1 {
            None
        } else {
            Some(request.key - 1)
        };

        Ok(PageResult {
            entries,
            next_key,
            prev_key,
            malformed,
        })
    }

    /// Fetch the detail record for one entry name
    pub async fn fetch_detail(&self, name: &str) -> SourceResult<PokemonDetail> {
        self.source.get_detail(name.trim()).await
    }

    fn normalize(&self, record: &CatalogRecord) -> SourceResult<Entry> {
        let numeric_id =
            derive_numeric_id(&record.url).ok_or_else(|| SourceError::malformed(&record.url))?;

        Ok(Entry {
            name: capitalize_first(&record.name),
            image_url: sprite_url(&self.sprite_base_url, numeric_id),
            numeric_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogPage;
    use crate::sources::MockCatalogSource;
    use mockall::predicate::eq;
    use tracing_test::traced_test;

    const SPRITES: &str = "https://sprites.test/pokemon";

    fn record(name: &str, url: &str) -> CatalogRecord {
        CatalogRecord {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    fn page(results: Vec<CatalogRecord>) -> CatalogPage {
        CatalogPage {
            count: 1302,
            next: None,
            previous: None,
            results,
        }
    }

    #[tokio::test]
    async fn test_fetch_page_requests_offset_and_normalizes() {
        let mut source = MockCatalogSource::new();
        source
            .expect_list_page()
            .with(eq(20), eq(40))
            .times(1)
            .returning(|_, _| {
                Ok(page(vec![
                    record("venusaur", "https://pokeapi.co/api/v2/pokemon/3/"),
                    record("charmander", "https://pokeapi.co/api/v2/pokemon/4"),
                ]))
            });

        let fetcher = PageFetcher::new(Arc::new(source), 20, SPRITES);
        let result = fetcher.fetch_page(PageRequest { key: 3 }).await.unwrap();

        assert_eq!(result.next_key, Some(4));
        assert_eq!(result.prev_key, Some(2));
        assert_eq!(result.malformed, 0);
        assert_eq!(
            result.entries,
            vec![
                Entry {
                    name: "Venusaur".to_string(),
                    image_url: "https://sprites.test/pokemon/3.png".to_string(),
                    numeric_id: 3,
                },
                Entry {
                    name: "Charmander".to_string(),
                    image_url: "https://sprites.test/pokemon/4.png".to_string(),
                    numeric_id: 4,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_first_page_has_no_prev_key() {
        let mut source = MockCatalogSource::new();
        source
            .expect_list_page()
            .with(eq(2), eq(0))
            .returning(|_, _| {
                Ok(page(vec![record("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/")]))
            });

        let fetcher = PageFetcher::new(Arc::new(source), 2, SPRITES);
        let result = fetcher.fetch_page(PageRequest::first()).await.unwrap();

        assert_eq!(result.prev_key, None);
        assert_eq!(result.next_key, Some(2));
    }

    #[tokio::test]
    async fn test_empty_page_signals_end() {
        let mut source = MockCatalogSource::new();
        source.expect_list_page().returning(|_, _| Ok(page(vec![])));

        let fetcher = PageFetcher::new(Arc::new(source), 20, SPRITES);
        let result = fetcher.fetch_page(PageRequest { key: 66 }).await.unwrap();

        assert!(result.entries.is_empty());
        assert!(result.is_end());
        assert_eq!(result.prev_key, Some(65));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_malformed_record_is_skipped_and_counted() {
        let mut source = MockCatalogSource::new();
        source.expect_list_page().returning(|_, _| {
            Ok(page(vec![
                record("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
                record("missingno", "https://pokeapi.co/api/v2/pokemon/unknown/"),
                record("ivysaur", "https://pokeapi.co/api/v2/pokemon/2/"),
            ]))
        });

        let fetcher = PageFetcher::new(Arc::new(source), 3, SPRITES);
        let result = fetcher.fetch_page(PageRequest::first()).await.unwrap();

        assert_eq!(result.malformed, 1);
        let ids: Vec<u32> = result.entries.iter().map(|e| e.numeric_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(logs_contain("Skipping record 'missingno'"));
    }

    #[tokio::test]
    async fn test_page_of_only_malformed_records_keeps_paging() {
        let mut source = MockCatalogSource::new();
        source
            .expect_list_page()
            .returning(|_, _| Ok(page(vec![record("missingno", "https://pokeapi.co/")])));

        let fetcher = PageFetcher::new(Arc::new(source), 1, SPRITES);
        let result = fetcher.fetch_page(PageRequest::first()).await.unwrap();

        assert_eq!(result.malformed, 1);
        assert!(result.entries.is_empty());
        assert_eq!(result.next_key, Some(2));
    }

    #[tokio::test]
    async fn test_remote_error_is_surfaced() {
        let mut source = MockCatalogSource::new();
        source.expect_list_page().returning(|_, _| {
            Err(SourceError::network("https://pokeapi.co/api/v2/pokemon", "connection reset"))
        });

        let fetcher = PageFetcher::new(Arc::new(source), 20, SPRITES);
        let err = fetcher.fetch_page(PageRequest::first()).await.unwrap_err();

        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_key_zero_is_rejected_without_calling_source() {
        let mut source = MockCatalogSource::new();
        source.expect_list_page().never();

        let fetcher = PageFetcher::new(Arc::new(source), 20, SPRITES);
        let err = fetcher.fetch_page(PageRequest { key: 0 }).await.unwrap_err();

        assert!(matches!(err, SourceError::InvalidRequest { .. }));
    }
}

//! Remote catalog source abstraction
//!
//! The engine only needs two operations from the remote side: a page of
//! summary records and a single detail record. Anything that can provide
//! them (HTTP API, in-memory fixture, mock) implements `CatalogSource`.

use async_trait::async_trait;

use crate::errors::SourceResult;
use crate::models::{CatalogPage, PokemonDetail};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch `limit` summary records starting at `offset`
    async fn list_page(&self, limit: u32, offset: u32) -> SourceResult<CatalogPage>;

    /// Fetch the detail record for `name`
    async fn get_detail(&self, name: &str) -> SourceResult<PokemonDetail>;
}

//! PokeAPI implementation of `CatalogSource`

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::traits::CatalogSource;
use crate::config::CatalogConfig;
use crate::errors::{AppResult, SourceError, SourceResult};
use crate::models::{CatalogPage, PokemonDetail};
use crate::utils::{StandardHttpClient, capitalize_first};

/// Catalog source backed by the PokeAPI REST endpoints
pub struct PokeApiSource {
    http: StandardHttpClient,
    base_url: Url,
}

impl PokeApiSource {
    pub fn new(config: &CatalogConfig) -> AppResult<Self> {
        let http = StandardHttpClient::new(config.connect_timeout, config.request_timeout)?;
        Self::with_client(http, &config.api_base_url)
    }

    pub fn with_client(http: StandardHttpClient, base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            SourceError::invalid_request("api_base_url", format!("'{base_url}': {e}"))
        })?;
        Ok(Self { http, base_url })
    }

    /// `<base>/pokemon?limit=..&offset=..`
    pub fn list_url(&self, limit: u32, offset: u32) -> SourceResult<Url> {
        let mut url = self.endpoint(&["pokemon"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    /// `<base>/pokemon/<name>`
    pub fn detail_url(&self, name: &str) -> SourceResult<Url> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(SourceError::invalid_request("name", "must not be empty"));
        }
        self.endpoint(&["pokemon", &name])
    }

    fn endpoint(&self, segments: &[&str]) -> SourceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SourceError::invalid_request("api_base_url", "cannot be used as a base URL")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl CatalogSource for PokeApiSource {
    async fn list_page(&self, limit: u32, offset: u32) -> SourceResult<CatalogPage> {
        let url = self.list_url(limit, offset)?;
        let page: CatalogPage = self.http.fetch_json(url.as_str()).await?;
        debug!(
            "Listed {} records at offset {} (catalog total {})",
            page.results.len(),
            offset,
            page.count
        );
        Ok(page)
    }

    async fn get_detail(&self, name: &str) -> SourceResult<PokemonDetail> {
        let url = self.detail_url(name)?;
        let raw: RawPokemon = self.http.fetch_json(url.as_str()).await?;
        Ok(raw.into())
    }
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawTypeSlot {
    slot: u32,
    #[serde(rename = "type")]
    kind: NamedRef,
}

#[derive(Debug, Deserialize)]
struct RawStat {
    base_stat: u32,
    stat: NamedRef,
}

#[derive(Debug, Default, Deserialize)]
struct RawSprites {
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPokemon {
    id: u32,
    name: String,
    height: u32,
    weight: u32,
    base_experience: Option<u32>,
    #[serde(default)]
    types: Vec<RawTypeSlot>,
    #[serde(default)]
    stats: Vec<RawStat>,
    #[serde(default)]
    sprites: RawSprites,
}

impl From<RawPokemon> for PokemonDetail {
    fn from(mut raw: RawPokemon) -> Self {
        raw.types.sort_by_key(|t| t.slot);
        Self {
            id: raw.id,
            name: capitalize_first(&raw.name),
            height: raw.height,
            weight: raw.weight,
            base_experience: raw.base_experience,
            types: raw.types.into_iter().map(|t| t.kind.name).collect(),
            stats: raw
                .stats
                .into_iter()
                .map(|s| (s.stat.name, s.base_stat))
                .collect(),
            sprite_url: raw.sprites.front_default,
        }
    }
}

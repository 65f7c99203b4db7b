//! In-memory catalog source shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use pokedex_browser::config::Config;
use pokedex_browser::errors::{SourceError, SourceResult};
use pokedex_browser::models::{CatalogPage, CatalogRecord, PokemonDetail};
use pokedex_browser::sources::CatalogSource;

pub const RECORD_BASE: &str = "https://pokeapi.test/api/v2/pokemon";

pub fn record(name: &str, id: u32) -> CatalogRecord {
    CatalogRecord {
        name: name.to_string(),
        url: format!("{RECORD_BASE}/{id}/"),
    }
}

/// Serves a fixed listing sliced by `limit`/`offset`, like the real API.
/// Failures can be queued, and an optional gate holds each call until a
/// permit is added.
pub struct FakeCatalog {
    records: Mutex<Vec<CatalogRecord>>,
    failures: Mutex<usize>,
    calls: Mutex<Vec<(u32, u32)>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeCatalog {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            failures: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Records named `name1..=nameN` with ids 1..=N
    pub fn numbered(count: u32) -> Self {
        Self::new((1..=count).map(|id| record(&format!("mon{id}"), id)).collect())
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Make the next `count` listing calls fail with a network error
    pub fn fail_next(&self, count: usize) {
        *self.failures.lock().unwrap() = count;
    }

    pub fn push(&self, record: CatalogRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// `(limit, offset)` of every listing call, in call order
    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_page(&self, limit: u32, offset: u32) -> SourceResult<CatalogPage> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        self.calls.lock().unwrap().push((limit, offset));

        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(SourceError::network(
                    format!("{RECORD_BASE}?limit={limit}&offset={offset}"),
                    "connection reset",
                ));
            }
        }

        let records = self.records.lock().unwrap();
        let start = (offset as usize).min(records.len());
        let end = start.saturating_add(limit as usize).min(records.len());
        Ok(CatalogPage {
            count: records.len() as u32,
            next: (end < records.len()).then(|| format!("{RECORD_BASE}?offset={end}")),
            previous: None,
            results: records[start..end].to_vec(),
        })
    }

    async fn get_detail(&self, name: &str) -> SourceResult<PokemonDetail> {
        let records = self.records.lock().unwrap();
        let position = records
            .iter()
            .position(|r| r.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| SourceError::Http {
                status: 404,
                url: format!("{RECORD_BASE}/{name}"),
            })?;
        Ok(PokemonDetail {
            id: position as u32 + 1,
            name: records[position].name.clone(),
            height: 4,
            weight: 60,
            base_experience: Some(112),
            types: vec!["electric".to_string()],
            stats: vec![("speed".to_string(), 90)],
            sprite_url: None,
        })
    }
}

pub fn config_with_page_size(page_size: u32) -> Config {
    let mut config = Config::default();
    config.catalog.page_size = page_size;
    config
}

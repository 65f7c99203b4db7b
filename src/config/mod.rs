use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::parse_default;

use crate::errors::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub color: ColorConfig,
}

/// Remote catalog and paging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_sprite_base_url")]
    pub sprite_base_url: String,
    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Distance from the end of the materialized list that triggers the next page
    #[serde(default = "default_prefetch_threshold")]
    pub prefetch_threshold: usize,
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period used to coalesce rapid queries; zero applies every query
    #[serde(default = "default_search_debounce", with = "duration_serde::duration")]
    pub debounce: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_max_concurrent_extractions")]
    pub max_concurrent_extractions: usize,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_sprite_base_url() -> String {
    DEFAULT_SPRITE_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_prefetch_threshold() -> usize {
    DEFAULT_PREFETCH_THRESHOLD
}

fn default_request_timeout() -> Duration {
    parse_default(DEFAULT_REQUEST_TIMEOUT)
}

fn default_connect_timeout() -> Duration {
    parse_default(DEFAULT_CONNECT_TIMEOUT)
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

fn default_search_debounce() -> Duration {
    parse_default(DEFAULT_SEARCH_DEBOUNCE)
}

fn default_max_concurrent_extractions() -> usize {
    DEFAULT_MAX_CONCURRENT_EXTRACTIONS
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            sprite_base_url: default_sprite_base_url(),
            page_size: default_page_size(),
            prefetch_threshold: default_prefetch_threshold(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: default_search_debounce(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_extractions: default_max_concurrent_extractions(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "pokedex.toml".to_string());
        Self::load_from_file(&config_file)
    }

    /// Load from a TOML file, falling back to defaults when the file is absent
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config = if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            let config: Self = toml::from_str(&contents)?;
            info!("Configuration loaded from: {}", config_file);
            config
        } else {
            info!("No config file at {}, using defaults", config_file);
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.catalog.page_size == 0 {
            return Err(AppError::configuration("catalog.page_size must be greater than 0"));
        }
        if self.catalog.event_channel_capacity == 0 {
            return Err(AppError::configuration(
                "catalog.event_channel_capacity must be greater than 0",
            ));
        }
        if self.color.max_concurrent_extractions == 0 {
            return Err(AppError::configuration(
                "color.max_concurrent_extractions must be greater than 0",
            ));
        }
        url::Url::parse(&self.catalog.api_base_url).map_err(|e| {
            AppError::configuration(format!(
                "catalog.api_base_url '{}' is not a valid URL: {e}",
                self.catalog.api_base_url
            ))
        })?;
        Ok(())
    }
}

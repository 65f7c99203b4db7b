use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{AppResult, SourceError, SourceResult};

/// Thin reqwest wrapper that maps every failure onto `SourceError`
#[derive(Clone)]
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    /// Create a client with a connection timeout and a total request timeout
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("pokedex-browser/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    async fn send(&self, url: &str) -> SourceResult<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::network(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// GET `url` and parse the body as JSON
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> SourceResult<T> {
        debug!("Fetching JSON content from: {}", url);

        let bytes = self
            .send(url)
            .await?
            .bytes()
            .await
            .map_err(|e| SourceError::network(url, format!("Failed to read response: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| SourceError::decode(url, format!("Failed to parse JSON: {e}")))
    }

    /// GET `url` and return the raw body
    pub async fn fetch_bytes(&self, url: &str) -> SourceResult<Vec<u8>> {
        debug!("Fetching binary content from: {}", url);

        let bytes = self
            .send(url)
            .await?
            .bytes()
            .await
            .map_err(|e| SourceError::network(url, format!("Failed to read response: {e}")))?;

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

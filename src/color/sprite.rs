//! Sprite download feeding the color pipeline

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::pipeline::ColorExtractor;
use crate::errors::{AppResult, ColorError, SourceResult};
use crate::models::{Entry, Rgb};
use crate::utils::StandardHttpClient;

pub struct SpriteLoader {
    http: StandardHttpClient,
}

impl SpriteLoader {
    pub fn new(http: StandardHttpClient) -> Self {
        Self { http }
    }

    /// Raw sprite bytes for `entry`
    pub async fn fetch(&self, entry: &Entry) -> SourceResult<Vec<u8>> {
        self.http.fetch_bytes(&entry.image_url).await
    }

    /// Resolve the dominant color of `entry`, downloading its sprite only when
    /// the color is not memoized yet
    pub async fn dominant_color(
        &self,
        extractor: &ColorExtractor,
        entry: &Entry,
        cancel: &CancellationToken,
    ) -> AppResult<Rgb> {
        if let Some(color) = extractor.cached(entry.numeric_id).await {
            return Ok(color);
        }

        let bytes = tokio::select! {
            fetched = self.fetch(entry) => fetched?,
            _ = cancel.cancelled() => return Err(ColorError::Cancelled.into()),
        };
        debug!("Downloaded sprite for {} ({} bytes)", entry.name, bytes.len());

        Ok(extractor
            .extract_from_bytes(entry.numeric_id, bytes, cancel)
            .await?)
    }
}

//! Shared data model for the catalog engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// One materialized catalog item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Display name, first character capitalized
    pub name: String,
    /// Sprite location derived from `numeric_id`
    pub image_url: String,
    /// Unique across a collection; derived from the record's reference URL
    pub numeric_id: u32,
}

impl Entry {
    /// Search predicate: name contains the trimmed query (case-insensitive)
    /// or the id string equals it exactly.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim();
        self.name.to_lowercase().contains(&needle.to_lowercase())
            || self.numeric_id.to_string() == needle
    }
}

/// Request for one page of the catalog, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub key: u32,
}

impl PageRequest {
    pub fn first() -> Self {
        Self { key: 1 }
    }

    /// Offset into the remote listing for this page
    pub fn offset(&self, page_size: u32) -> u32 {
        page_size.saturating_mul(self.key.saturating_sub(1))
    }
}

/// Normalized result of one page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub entries: Vec<Entry>,
    /// Absent once the source returns an empty page
    pub next_key: Option<u32>,
    pub prev_key: Option<u32>,
    /// Records skipped because no numeric id could be derived
    pub malformed: usize,
}

impl PageResult {
    pub fn is_end(&self) -> bool {
        self.next_key.is_none()
    }
}

/// One summary record as returned by the remote listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    /// Reference URL of the detail resource, e.g. `.../pokemon/25/`
    pub url: String,
}

/// A page of the remote listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub count: u32,
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<CatalogRecord>,
}

/// Detail record for a single catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    /// Decimetres
    pub height: u32,
    /// Hectograms
    pub weight: u32,
    pub base_experience: Option<u32>,
    /// Type names ordered by slot
    pub types: Vec<String>,
    /// `(stat name, base value)` in source order
    pub stats: Vec<(String, u32)>,
    pub sprite_url: Option<String>,
}

/// An opaque 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Shown for an entry until its dominant color is known
    pub const DEFAULT: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// HSL lightness in `0.0..=1.0`
    pub fn lightness(&self) -> f32 {
        let max = self.r.max(self.g).max(self.b) as f32 / 255.0;
        let min = self.r.min(self.g).min(self.b) as f32 / 255.0;
        (max + min) / 2.0
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

//! Dominant-color extraction
//!
//! - `palette`: the deterministic histogram algorithm and image decoding
//! - `pipeline`: memoized, coalescing, cancellable extraction jobs
//! - `sprite`: downloads sprites so an `Entry` alone is enough to get a color

pub mod palette;
pub mod pipeline;
pub mod sprite;

pub use palette::{decode_image, dominant_color};
pub use pipeline::{ColorExtractor, ColorStats};
pub use sprite::SpriteLoader;

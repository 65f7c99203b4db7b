//! Dominant color from a quantized pixel histogram
//!
//! The image is scaled down to a bounded area with nearest-neighbour
//! sampling, translucent pixels are ignored, and the remaining pixels are
//! bucketed at 5 bits per channel. The most populated bucket wins, after
//! dropping near-black and near-white buckets unless nothing else is left.
//! Every step is deterministic, so the same image always yields the same color.

use std::collections::BTreeMap;

use image::DynamicImage;
use image::imageops::FilterType;

use crate::errors::{ColorError, ColorResult};
use crate::models::Rgb;

/// Pixel budget after scaling
pub const MAX_SAMPLE_AREA: u32 = 112 * 112;
const QUANTIZE_SHIFT: u8 = 3;
const MIN_ALPHA: u8 = 128;
const BLACK_MAX_LIGHTNESS: f32 = 0.05;
const WHITE_MIN_LIGHTNESS: f32 = 0.95;

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    population: u32,
    r: u64,
    g: u64,
    b: u64,
}

impl Bucket {
    fn add(&mut self, r: u8, g: u8, b: u8) {
        self.population += 1;
        self.r += r as u64;
        self.g += g as u64;
        self.b += b as u64;
    }

    fn mean(&self) -> Rgb {
        let n = self.population.max(1) as u64;
        Rgb::new((self.r / n) as u8, (self.g / n) as u8, (self.b / n) as u8)
    }

    fn is_extreme(&self) -> bool {
        let lightness = self.mean().lightness();
        lightness <= BLACK_MAX_LIGHTNESS || lightness >= WHITE_MIN_LIGHTNESS
    }
}

fn bucket_index(r: u8, g: u8, b: u8) -> u16 {
    let q = |c: u8| (c >> QUANTIZE_SHIFT) as u16;
    (q(r) << 10) | (q(g) << 5) | q(b)
}

fn scale_down(image: &DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let area = width as u64 * height as u64;
    if area <= MAX_SAMPLE_AREA as u64 {
        return image.clone();
    }

    let scale = (MAX_SAMPLE_AREA as f64 / area as f64).sqrt();
    let new_width = ((width as f64 * scale).ceil() as u32).max(1);
    let new_height = ((height as f64 * scale).ceil() as u32).max(1);
    image.resize_exact(new_width, new_height, FilterType::Nearest)
}

/// Decode PNG/JPEG/GIF/WebP bytes
pub fn decode_image(bytes: &[u8]) -> ColorResult<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Compute the dominant color of `image`
pub fn dominant_color(image: &DynamicImage) -> ColorResult<Rgb> {
    let sample = scale_down(image).to_rgba8();

    let mut histogram: BTreeMap<u16, Bucket> = BTreeMap::new();
    for pixel in sample.pixels() {
        let [r, g, b, a] = pixel.0;
        if a < MIN_ALPHA {
            continue;
        }
        histogram.entry(bucket_index(r, g, b)).or_default().add(r, g, b);
    }

    if histogram.is_empty() {
        return Err(ColorError::decode("image has no opaque pixels"));
    }

    let most_populated = |include_extremes: bool| {
        histogram
            .values()
            .filter(|bucket| include_extremes || !bucket.is_extreme())
            .fold(None::<&Bucket>, |best, bucket| match best {
                Some(current) if current.population >= bucket.population => Some(current),
                _ => Some(bucket),
            })
    };

    most_populated(false)
        .or_else(|| most_populated(true))
        .map(Bucket::mean)
        .ok_or_else(|| ColorError::decode("image has no opaque pixels"))
}

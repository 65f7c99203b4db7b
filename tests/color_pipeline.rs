use std::sync::Arc;

use futures::future::join_all;
use futures::poll;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use pokedex_browser::color::ColorExtractor;
use pokedex_browser::errors::ColorError;
use pokedex_browser::models::Rgb;

fn sprite(r: u8, g: u8, b: u8) -> Arc<DynamicImage> {
    // Transparent border around an opaque body, like a real sprite sheet cell
    let img = RgbaImage::from_fn(96, 96, |x, y| {
        if (16..80).contains(&x) && (16..80).contains(&y) {
            Rgba([r, g, b, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    Arc::new(DynamicImage::ImageRgba8(img))
}

#[tokio::test]
async fn test_same_id_requests_share_one_computation() {
    let extractor = ColorExtractor::new(4);
    let cancel = CancellationToken::new();
    let image = sprite(248, 208, 48);

    let results = join_all((0..8).map(|_| extractor.extract(25, Arc::clone(&image), &cancel))).await;

    for result in results {
        assert_eq!(assert_ok!(result), Rgb::new(248, 208, 48));
    }
    let stats = extractor.stats();
    assert_eq!(stats.computations, 1);
    assert_eq!(stats.coalesced, 7);
    assert_eq!(extractor.len().await, 1);
}

#[tokio::test]
async fn test_distinct_ids_are_computed_independently() {
    let extractor = ColorExtractor::new(2);
    let cancel = CancellationToken::new();

    let (a, b, c) = tokio::join!(
        extractor.extract(1, sprite(120, 200, 80), &cancel),
        extractor.extract(4, sprite(240, 128, 48), &cancel),
        extractor.extract(7, sprite(104, 144, 240), &cancel),
    );

    assert_eq!(assert_ok!(a), Rgb::new(120, 200, 80));
    assert_eq!(assert_ok!(b), Rgb::new(240, 128, 48));
    assert_eq!(assert_ok!(c), Rgb::new(104, 144, 240));
    assert_eq!(extractor.stats().computations, 3);
}

#[tokio::test]
async fn test_cancelled_job_never_writes_cache() {
    let extractor = ColorExtractor::new(1);
    let caller_token = CancellationToken::new();

    let mut caller = Box::pin(extractor.extract(6, sprite(240, 80, 48), &caller_token));
    assert!(poll!(&mut caller).is_pending());
    assert!(extractor.is_in_flight(6).await);

    assert!(extractor.cancel(6).await);
    assert_eq!(assert_err!(caller.await), ColorError::Cancelled);

    assert_eq!(extractor.cached(6).await, None);
    assert_eq!(extractor.color_for(6).await, Rgb::DEFAULT);
    assert!(!extractor.is_in_flight(6).await);
    assert_eq!(extractor.stats().cancelled, 1);

    // A later request for the same id starts over and commits
    let color = extractor
        .extract(6, sprite(240, 80, 48), &CancellationToken::new())
        .await;
    assert_eq!(assert_ok!(color), Rgb::new(240, 80, 48));
    assert_eq!(extractor.cached(6).await, Some(Rgb::new(240, 80, 48)));
}

#[tokio::test]
async fn test_detached_caller_leaves_job_running_for_others() {
    let extractor = ColorExtractor::new(1);
    let leaving = CancellationToken::new();
    let staying = CancellationToken::new();

    let mut first = Box::pin(extractor.extract(9, sprite(48, 96, 200), &leaving));
    let mut second = Box::pin(extractor.extract(9, sprite(48, 96, 200), &staying));
    assert!(poll!(&mut first).is_pending());
    assert!(poll!(&mut second).is_pending());
    assert_eq!(extractor.stats().coalesced, 1);

    leaving.cancel();
    assert_eq!(assert_err!(first.await), ColorError::Cancelled);
    assert!(extractor.is_in_flight(9).await);

    assert_eq!(assert_ok!(second.await), Rgb::new(48, 96, 200));
    assert_eq!(extractor.cached(9).await, Some(Rgb::new(48, 96, 200)));
    let stats = extractor.stats();
    assert_eq!(stats.computations, 1);
    assert_eq!(stats.cancelled, 0);
}

#[tokio::test]
async fn test_last_caller_leaving_cancels_job() {
    let extractor = ColorExtractor::new(1);
    let token = CancellationToken::new();

    let mut only = Box::pin(extractor.extract(12, sprite(80, 160, 96), &token));
    assert!(poll!(&mut only).is_pending());

    token.cancel();
    assert_eq!(assert_err!(only.await), ColorError::Cancelled);
    assert!(!extractor.is_in_flight(12).await);
    assert_eq!(extractor.stats().cancelled, 1);
    assert_eq!(extractor.cached(12).await, None);
}

#[tokio::test]
async fn test_extract_from_encoded_sprite() {
    let extractor = ColorExtractor::new(1);
    let mut png = Vec::new();
    sprite(88, 168, 224)
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let color = extractor
        .extract_from_bytes(7, png.clone(), &CancellationToken::new())
        .await;
    assert_eq!(assert_ok!(color), Rgb::new(88, 168, 224));

    // Cached ids never decode again, even if the bytes are garbage now
    let again = extractor
        .extract_from_bytes(7, b"garbage".to_vec(), &CancellationToken::new())
        .await;
    assert_eq!(assert_ok!(again), Rgb::new(88, 168, 224));
    assert_eq!(extractor.stats().computations, 1);
}

//! Asynchronous, memoized dominant-color extraction
//!
//! Each entry id gets at most one committed color per session. Requests for
//! an id that is already being computed join the running job instead of
//! starting another one. Jobs run on spawned tasks and do the CPU work on the
//! blocking pool, bounded by a semaphore.
//!
//! Cancellation and commit both happen under the in-flight lock, so a job is
//! either cancelled before it writes the cache or its result is committed and
//! the cancellation is a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use image::DynamicImage;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::palette::{decode_image, dominant_color};
use crate::errors::{ColorError, ColorResult};
use crate::models::Rgb;

type SharedResult = Shared<BoxFuture<'static, ColorResult<Rgb>>>;
type PaletteFn = dyn Fn(&DynamicImage) -> ColorResult<Rgb> + Send + Sync;

struct InFlight {
    generation: u64,
    token: CancellationToken,
    waiters: usize,
    result: SharedResult,
}

#[derive(Debug, Default)]
struct Counters {
    computations: AtomicU64,
    cache_hits: AtomicU64,
    coalesced: AtomicU64,
    cancelled: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColorStats {
    /// Histogram computations actually started
    pub computations: u64,
    /// Requests answered from the color cache
    pub cache_hits: u64,
    /// Requests that joined an already running job
    pub coalesced: u64,
    /// Jobs cancelled before committing
    pub cancelled: u64,
}

#[derive(Clone)]
pub struct ColorExtractor {
    cache: Arc<RwLock<HashMap<u32, Rgb>>>,
    in_flight: Arc<Mutex<HashMap<u32, InFlight>>>,
    permits: Arc<Semaphore>,
    next_generation: Arc<AtomicU64>,
    counters: Arc<Counters>,
    palette: Arc<PaletteFn>,
}

impl ColorExtractor {
    pub fn new(max_concurrent_extractions: usize) -> Self {
        Self::with_palette(max_concurrent_extractions, dominant_color)
    }

    fn with_palette<F>(max_concurrent_extractions: usize, palette: F) -> Self
    where
        F: Fn(&DynamicImage) -> ColorResult<Rgb> + Send + Sync + 'static,
    {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(max_concurrent_extractions.max(1))),
            next_generation: Arc::new(AtomicU64::new(0)),
            counters: Arc::new(Counters::default()),
            palette: Arc::new(palette),
        }
    }

    /// Committed color for `entry_id`, if any
    pub async fn cached(&self, entry_id: u32) -> Option<Rgb> {
        self.cache.read().await.get(&entry_id).copied()
    }

    /// Committed color or the default placeholder
    pub async fn color_for(&self, entry_id: u32) -> Rgb {
        self.cached(entry_id).await.unwrap_or(Rgb::DEFAULT)
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Whether a job for `entry_id` is currently running
    pub async fn is_in_flight(&self, entry_id: u32) -> bool {
        self.in_flight.lock().await.contains_key(&entry_id)
    }

    pub fn stats(&self) -> ColorStats {
        ColorStats {
            computations: self.counters.computations.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            coalesced: self.counters.coalesced.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
        }
    }

    /// Dominant color of `image` for `entry_id`.
    ///
    /// Returns the memoized color when present. Otherwise starts a job, or
    /// joins the one already running for this id. Cancelling `cancel` detaches
    /// this caller; the job itself is cancelled once no caller is left.
    pub async fn extract(
        &self,
        entry_id: u32,
        image: Arc<DynamicImage>,
        cancel: &CancellationToken,
    ) -> ColorResult<Rgb> {
        if let Some(color) = self.cached(entry_id).await {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(color);
        }

        let (generation, result) = {
            let mut in_flight = self.in_flight.lock().await;

            // A job may have committed between the check above and taking the lock
            if let Some(color) = self.cached(entry_id).await {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(color);
            }

            match self.join_locked(&mut in_flight, entry_id) {
                Some(handle) => handle,
                None => {
                    let job = self.start_job(entry_id, image);
                    let handle = (job.generation, job.result.clone());
                    in_flight.insert(entry_id, job);
                    handle
                }
            }
        };

        self.wait_for(entry_id, generation, result, cancel).await
    }

    async fn wait_for(
        &self,
        entry_id: u32,
        generation: u64,
        result: SharedResult,
        cancel: &CancellationToken,
    ) -> ColorResult<Rgb> {
        tokio::select! {
            biased;
            outcome = result => outcome,
            _ = cancel.cancelled() => {
                self.release_waiter(entry_id, generation).await;
                Err(ColorError::Cancelled)
            }
        }
    }

    /// Decode `bytes` and extract. A cached id skips decoding entirely, and so
    /// does an id whose job is already running. Two calls that race before
    /// either job starts may both decode, but still share one histogram pass.
    pub async fn extract_from_bytes(
        &self,
        entry_id: u32,
        bytes: Vec<u8>,
        cancel: &CancellationToken,
    ) -> ColorResult<Rgb> {
        if let Some(color) = self.cached(entry_id).await {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(color);
        }

        let joined = {
            let mut in_flight = self.in_flight.lock().await;
            self.join_locked(&mut in_flight, entry_id)
        };
        if let Some((generation, result)) = joined {
            return self.wait_for(entry_id, generation, result, cancel).await;
        }

        let decode = tokio::task::spawn_blocking(move || decode_image(&bytes));
        let image = tokio::select! {
            decoded = decode => decoded??,
            _ = cancel.cancelled() => return Err(ColorError::Cancelled),
        };

        self.extract(entry_id, Arc::new(image), cancel).await
    }

    /// Cancel the running job for `entry_id`, e.g. when it scrolls out of view.
    /// Returns false when nothing was running (including when the color is
    /// already committed).
    pub async fn cancel(&self, entry_id: u32) -> bool {
        let mut in_flight = self.in_flight.lock().await;
        match in_flight.remove(&entry_id) {
            Some(job) => {
                job.token.cancel();
                self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                debug!("Cancelled color job for entry {}", entry_id);
                true
            }
            None => false,
        }
    }

    fn join_locked(
        &self,
        in_flight: &mut HashMap<u32, InFlight>,
        entry_id: u32,
    ) -> Option<(u64, SharedResult)> {
        let job = in_flight.get_mut(&entry_id)?;
        job.waiters += 1;
        self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
        debug!("Joining running color job for entry {}", entry_id);
        Some((job.generation, job.result.clone()))
    }

    async fn release_waiter(&self, entry_id: u32, generation: u64) {
        let mut in_flight = self.in_flight.lock().await;
        let Some(job) = in_flight.get_mut(&entry_id) else {
            return;
        };
        if job.generation != generation {
            return;
        }

        job.waiters = job.waiters.saturating_sub(1);
        if job.waiters == 0 {
            job.token.cancel();
            in_flight.remove(&entry_id);
            self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
            debug!("Last waiter left, cancelled color job for entry {}", entry_id);
        }
    }

    fn start_job(&self, entry_id: u32, image: Arc<DynamicImage>) -> InFlight {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let job_token = token.clone();
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let permits = Arc::clone(&self.permits);
        let counters = Arc::clone(&self.counters);
        let palette = Arc::clone(&self.palette);

        let handle = tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = job_token.cancelled() => Err(ColorError::Cancelled),
                computed = compute(permits, counters, palette, image) => computed,
            };

            let mut in_flight = in_flight.lock().await;
            let outcome = if job_token.is_cancelled() {
                Err(ColorError::Cancelled)
            } else {
                outcome
            };

            match &outcome {
                Ok(color) => {
                    cache.write().await.entry(entry_id).or_insert(*color);
                    debug!("Committed dominant color {} for entry {}", color, entry_id);
                }
                Err(ColorError::Cancelled) => {}
                Err(e) => warn!("Color extraction for entry {} failed: {}", entry_id, e),
            }

            if in_flight
                .get(&entry_id)
                .is_some_and(|job| job.generation == generation)
            {
                in_flight.remove(&entry_id);
            }

            outcome
        });

        let result = async move { handle.await.unwrap_or_else(|e| Err(ColorError::from(e))) }
            .boxed()
            .shared();

        InFlight {
            generation,
            token,
            waiters: 1,
            result,
        }
    }
}

/// The permit moves into the blocking closure: a cancelled job stops waiting
/// for its result, but the pass it started keeps its slot until it returns.
async fn compute(
    permits: Arc<Semaphore>,
    counters: Arc<Counters>,
    palette: Arc<PaletteFn>,
    image: Arc<DynamicImage>,
) -> ColorResult<Rgb> {
    let permit = permits.acquire_owned().await.map_err(|e| ColorError::Task {
        message: e.to_string(),
    })?;
    counters.computations.fetch_add(1, Ordering::Relaxed);
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        palette(image.as_ref())
    })
    .await?
}

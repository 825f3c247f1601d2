//! Video Registry for managing video lifecycle and caching.
//!
//! The registry provides:
//! - LRU caching of opened videos so properties are probed once
//! - Singleflight pattern to prevent duplicate opens for the same video
//!
//! # Example
//!
//! ```ignore
//! use video_slide::registry::VideoRegistry;
//! use video_slide::source::FfmpegFrameSource;
//!
//! let registry = VideoRegistry::new(FfmpegFrameSource::new());
//!
//! // Opens and caches on first access
//! let slide = registry.get_video("clips/cells.mp4").await?;
//! let canvas = slide.read_region(&RegionRequest::new(0, 0, 256, 256)).await?;
//! ```

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tokio::sync::{Notify, RwLock};
use tracing::debug;

use crate::error::SourceError;
use crate::region::VideoSlide;
use crate::source::FrameSource;

/// Default capacity for the video cache (number of videos).
pub const DEFAULT_VIDEO_CACHE_CAPACITY: usize = 32;

type OpenResult<S> = Result<Arc<VideoSlide<S>>, SourceError>;
type InFlightMap<S> = HashMap<String, Arc<InFlightState<S>>>;

/// Registry of opened videos.
///
/// The registry:
/// - Caches opened [`VideoSlide`]s with LRU eviction
/// - Opens videos on demand through the shared frame source
/// - Uses singleflight so concurrent first requests open a video once
pub struct VideoRegistry<S: FrameSource> {
    /// Source used for opening and decoding
    source: Arc<S>,

    /// Cached videos indexed by identifier
    cache: RwLock<LruCache<String, Arc<VideoSlide<S>>>>,

    /// In-flight opens for singleflight pattern
    in_flight: Mutex<InFlightMap<S>>,
}

/// State for an in-flight open operation.
struct InFlightState<S> {
    /// Notification for waiters
    notify: Notify,
    /// Result of the open operation (set when complete)
    result: Mutex<Option<OpenResult<S>>>,
}

impl<S> InFlightState<S> {
    fn new() -> Self {
        Self {
            notify: Notify::new(),
            result: Mutex::new(None),
        }
    }

    fn result(&self) -> Option<OpenResult<S>> {
        lock(&self.result).clone()
    }
}

/// Held by the task performing an open.
///
/// Dropping it, on completion or because the caller's future was cancelled,
/// retires the in-flight entry and wakes every waiter. Waiters that find no
/// result retry and one of them becomes the new leader.
struct LeaderGuard<'a, S> {
    in_flight: &'a Mutex<InFlightMap<S>>,
    video_id: &'a str,
    state: Arc<InFlightState<S>>,
}

impl<S> Drop for LeaderGuard<'_, S> {
    fn drop(&mut self) {
        {
            let mut in_flight = lock(self.in_flight);
            if in_flight
                .get(self.video_id)
                .is_some_and(|current| Arc::ptr_eq(current, &self.state))
            {
                in_flight.remove(self.video_id);
            }
        }
        self.state.notify.notify_waiters();
    }
}

/// The guarded data stays consistent even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: FrameSource> VideoRegistry<S> {
    /// Create a registry caching up to [`DEFAULT_VIDEO_CACHE_CAPACITY`] videos.
    pub fn new(source: S) -> Self {
        Self::with_capacity(source, DEFAULT_VIDEO_CACHE_CAPACITY)
    }

    /// Create a registry caching up to `capacity` videos (at least one).
    pub fn with_capacity(source: S, capacity: usize) -> Self {
        Self::with_shared_source(Arc::new(source), capacity)
    }

    /// Create a registry over a source that is also used elsewhere.
    pub fn with_shared_source(source: Arc<S>, capacity: usize) -> Self {
        Self {
            source,
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Get a video, opening it if not already cached.
    ///
    /// Concurrent callers asking for the same uncached video wait for a single
    /// open and share its result, including a failure. If the opening caller
    /// is cancelled, a waiting caller takes over the open.
    pub async fn get_video(&self, video_id: &str) -> OpenResult<S> {
        // Fast path: check cache
        {
            let mut cache = self.cache.write().await;
            if let Some(slide) = cache.get(video_id) {
                return Ok(Arc::clone(slide));
            }
        }

        // Slow path: wait on an in-flight open or become leader
        loop {
            let (state, is_leader) = {
                let mut in_flight = lock(&self.in_flight);
                match in_flight.get(video_id) {
                    Some(state) => (Arc::clone(state), false),
                    None => {
                        let state = Arc::new(InFlightState::new());
                        in_flight.insert(video_id.to_string(), Arc::clone(&state));
                        (state, true)
                    }
                }
            };

            if is_leader {
                return self.open_as_leader(video_id, state).await;
            }

            // Created before checking, so a notify between the check and the
            // await is not lost
            let notified = state.notify.notified();
            if let Some(result) = state.result() {
                return result;
            }
            if self.is_retired(video_id, &state) {
                continue;
            }
            notified.await;

            if let Some(result) = state.result() {
                return result;
            }
            // The leader was cancelled before producing a result; retry
        }
    }

    async fn open_as_leader(
        &self,
        video_id: &str,
        state: Arc<InFlightState<S>>,
    ) -> OpenResult<S> {
        let guard = LeaderGuard {
            in_flight: &self.in_flight,
            video_id,
            state,
        };

        let result = VideoSlide::open(Arc::clone(&self.source), video_id)
            .await
            .map(Arc::new);
        *lock(&guard.state.result) = Some(result.clone());

        if let Ok(ref slide) = result {
            debug!(video_id, "cached opened video");
            let mut cache = self.cache.write().await;
            cache.put(video_id.to_string(), Arc::clone(slide));
        }

        drop(guard);
        result
    }

    /// Whether `state` is no longer the registered open for `video_id`.
    fn is_retired(&self, video_id: &str, state: &Arc<InFlightState<S>>) -> bool {
        let in_flight = lock(&self.in_flight);
        !in_flight
            .get(video_id)
            .is_some_and(|current| Arc::ptr_eq(current, state))
    }

    /// Remove a video from the cache, forcing a re-probe on next access.
    pub async fn invalidate(&self, video_id: &str) {
        self.cache.write().await.pop(video_id);
        self.source.invalidate(video_id).await;
    }

    /// Clear all cached videos and the source's per-video state.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
        self.source.invalidate_all().await;
    }

    /// Number of cached videos.
    pub async fn cached_count(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

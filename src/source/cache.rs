//! Decoded frame cache.
//!
//! Decoding a frame means spawning a decoder and seeking, so neighbouring
//! region reads on the same frame (a viewer requesting several tiles of one
//! frame) benefit from keeping recent frames around.
//!
//! # Size-Based Eviction
//!
//! The cache tracks the total size of cached pixel buffers in bytes and
//! evicts least-recently-used frames when the capacity is exceeded.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::SourceError;

use super::{DecodedFrame, FrameSource, VideoHandle};

/// Default cache capacity: 256MB
pub const DEFAULT_FRAME_CACHE_CAPACITY: usize = 256 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 4_096;

// =============================================================================
// Cache Key
// =============================================================================

/// Identifies one decoded frame of one video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameCacheKey {
    /// Video identifier
    pub identifier: Arc<str>,

    /// Zero-based frame index
    pub frame: u64,
}

impl FrameCacheKey {
    pub fn new(identifier: impl Into<Arc<str>>, frame: u64) -> Self {
        Self {
            identifier: identifier.into(),
            frame,
        }
    }
}

// =============================================================================
// Frame Cache
// =============================================================================

struct CacheState {
    entries: LruCache<FrameCacheKey, DecodedFrame>,
    current_size: usize,
}

/// LRU cache for decoded frames with size-based capacity.
///
/// The cache is thread-safe and can be shared across async tasks via `Arc`.
pub struct FrameCache {
    state: RwLock<CacheState>,
    max_size: usize,
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCache {
    /// Create a new frame cache with default capacity (256MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FRAME_CACHE_CAPACITY)
    }

    /// Create a new frame cache holding at most `max_size` bytes of pixels.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a new frame cache with specified capacity and maximum entries.
    ///
    /// A zero entry bound is raised to one.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: LruCache::new(NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN)),
                current_size: 0,
            }),
            max_size,
        }
    }

    /// Get a frame, marking it as recently used.
    pub async fn get(&self, key: &FrameCacheKey) -> Option<DecodedFrame> {
        let mut state = self.state.write().await;
        state.entries.get(key).cloned()
    }

    /// Check for a frame without updating LRU order.
    pub async fn contains(&self, key: &FrameCacheKey) -> bool {
        let state = self.state.read().await;
        state.entries.contains(key)
    }

    /// Store a frame, evicting least-recently-used frames while over capacity.
    ///
    /// Frames larger than the whole capacity are not stored.
    pub async fn put(&self, key: FrameCacheKey, frame: DecodedFrame) {
        let frame_size = frame.data.len();
        if frame_size > self.max_size {
            return;
        }

        let mut state = self.state.write().await;

        if let Some(old) = state.entries.peek(&key) {
            let old_size = old.data.len();
            state.current_size = state.current_size.saturating_sub(old_size);
        }

        // `push` also reports an entry pushed out by the entry-count bound
        if let Some((evicted_key, evicted)) = state.entries.push(key.clone(), frame) {
            if evicted_key != key {
                state.current_size = state.current_size.saturating_sub(evicted.data.len());
            }
        }
        state.current_size += frame_size;

        while state.current_size > self.max_size {
            match state.entries.pop_lru() {
                Some((_, evicted)) => {
                    state.current_size = state.current_size.saturating_sub(evicted.data.len());
                }
                None => break,
            }
        }
    }

    /// Drop every cached frame of one video.
    pub async fn remove_video(&self, identifier: &str) {
        let mut state = self.state.write().await;
        let keys: Vec<FrameCacheKey> = state
            .entries
            .iter()
            .filter(|(k, _)| &*k.identifier == identifier)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            if let Some(frame) = state.entries.pop(&key) {
                state.current_size = state.current_size.saturating_sub(frame.data.len());
            }
        }
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.current_size = 0;
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Current total size of cached pixels in bytes.
    pub async fn size(&self) -> usize {
        self.state.read().await.current_size
    }

    /// Maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

// =============================================================================
// Caching Frame Source
// =============================================================================

/// A [`FrameSource`] decorator that remembers decoded frames.
///
/// Opens are always forwarded. Only successful decodes are cached, so a
/// transient decode failure is retried on the next request.
pub struct CachedFrameSource<S> {
    inner: S,
    cache: FrameCache,
}

impl<S: FrameSource> CachedFrameSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_cache(inner, FrameCache::new())
    }

    pub fn with_capacity(inner: S, max_size: usize) -> Self {
        Self::with_cache(inner, FrameCache::with_capacity(max_size))
    }

    pub fn with_cache(inner: S, cache: FrameCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }
}

#[async_trait]
impl<S: FrameSource> FrameSource for CachedFrameSource<S> {
    async fn open(&self, identifier: &str) -> Result<VideoHandle, SourceError> {
        self.inner.open(identifier).await
    }

    async fn decode(
        &self,
        handle: &VideoHandle,
        frame_index: u64,
    ) -> Result<DecodedFrame, SourceError> {
        let key = FrameCacheKey::new(handle.identifier_arc(), frame_index);
        if let Some(frame) = self.cache.get(&key).await {
            debug!(
                identifier = handle.identifier(),
                frame = frame_index,
                "frame cache hit"
            );
            return Ok(frame);
        }

        let frame = self.inner.decode(handle, frame_index).await?;
        self.cache.put(key, frame.clone()).await;
        Ok(frame)
    }

    async fn invalidate(&self, identifier: &str) {
        self.cache.remove_video(identifier).await;
        self.inner.invalidate(identifier).await;
    }

    async fn invalidate_all(&self) {
        self.cache.clear().await;
        self.inner.invalidate_all().await;
    }
}

// =============================================================================
// Tests
// =============================================================================

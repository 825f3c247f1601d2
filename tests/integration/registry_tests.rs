//! Registry and frame cache integration tests.
//!
//! Tests verify:
//! - Opened videos are probed once and shared
//! - Unknown videos are reported as not found
//! - The decoded frame cache avoids repeat decodes
//! - Invalidation drops cached frames along with the opened video

use async_trait::async_trait;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use video_slide::error::SourceError;
use video_slide::region::RegionRequest;
use video_slide::registry::VideoRegistry;
use video_slide::source::{
    CachedFrameSource, CodecTag, DecodedFrame, FrameCacheKey, FrameSource, PixelOrder,
    VideoHandle, VideoProperties,
};

use super::test_utils::{clip_source, opaque, MockFrameSource, MockVideo};

#[tokio::test]
async fn test_registry_opens_once() {
    let registry = VideoRegistry::new(clip_source());

    let a = registry.get_video("clip.mp4").await.unwrap();
    let b = registry.get_video("clip.mp4").await.unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.source().open_count(), 1);
    assert_eq!(registry.cached_count().await, 1);
}

#[tokio::test]
async fn test_registry_not_found() {
    let registry = VideoRegistry::new(clip_source());
    let result = registry.get_video("nope.mp4").await;

    assert!(matches!(result, Err(SourceError::NotFound(ref id)) if id == "nope.mp4"));
    assert_eq!(registry.cached_count().await, 0);
}

#[tokio::test]
async fn test_registry_concurrent_first_access() {
    let registry = Arc::new(VideoRegistry::new(clip_source()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            registry.get_video("clip.mp4").await.map(|s| s.frame_count())
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 10);
    }

    assert_eq!(registry.cached_count().await, 1);
}

#[tokio::test]
async fn test_frame_cache_avoids_repeat_decodes() {
    let registry = VideoRegistry::new(CachedFrameSource::new(clip_source()));
    let slide = registry.get_video("clip.mp4").await.unwrap();

    let request = RegionRequest::new(0, 0, 8, 8).with_frame(3);
    let first = slide.read_region(&request).await.unwrap();
    let second = slide
        .read_region(&RegionRequest::new(4, 4, 8, 8).with_frame(3))
        .await
        .unwrap();

    assert_eq!(registry.source().inner().decode_count(), 1);
    assert_eq!(first.get_pixel(4, 4).0, second.get_pixel(0, 0).0);
    assert_eq!(second.get_pixel(0, 0).0, opaque(3, 4, 4));
    assert!(
        registry
            .source()
            .cache()
            .contains(&FrameCacheKey::new("clip.mp4", 3))
            .await
    );
}

#[tokio::test]
async fn test_frame_cache_skips_failed_decodes() {
    let source = MockFrameSource::new().with_video("bad.mp4", MockVideo::new(8, 8, 4, 25.0).failing(1));
    let registry = VideoRegistry::new(CachedFrameSource::new(source));
    let slide = registry.get_video("bad.mp4").await.unwrap();

    let request = RegionRequest::new(0, 0, 8, 8).with_frame(1);
    slide.read_region(&request).await.unwrap();
    slide.read_region(&request).await.unwrap();

    assert_eq!(registry.source().inner().decode_count(), 2);
    assert!(registry.source().cache().is_empty().await);
}

#[tokio::test]
async fn test_invalidate_reopens() {
    let registry = VideoRegistry::new(clip_source());
    registry.get_video("clip.mp4").await.unwrap();
    registry.invalidate("clip.mp4").await;
    registry.get_video("clip.mp4").await.unwrap();

    assert_eq!(registry.source().open_count(), 2);
}

/// A video whose content is rewritten in place: every pixel of every frame
/// holds the current `version`.
struct RewrittenVideo {
    version: AtomicU8,
}

impl RewrittenVideo {
    fn new(version: u8) -> Self {
        Self {
            version: AtomicU8::new(version),
        }
    }

    fn rewrite(&self, version: u8) {
        self.version.store(version, Ordering::SeqCst);
    }
}

#[async_trait]
impl FrameSource for RewrittenVideo {
    async fn open(&self, identifier: &str) -> Result<VideoHandle, SourceError> {
        Ok(VideoHandle::new(
            identifier,
            VideoProperties {
                width: 4,
                height: 4,
                frame_count: 2,
                fps: 25.0,
                codec: CodecTag::UNKNOWN,
            },
        ))
    }

    async fn decode(
        &self,
        _handle: &VideoHandle,
        _frame_index: u64,
    ) -> Result<DecodedFrame, SourceError> {
        let version = self.version.load(Ordering::SeqCst);
        Ok(DecodedFrame::new(4, 4, PixelOrder::Rgb, vec![version; 4 * 4 * 3]))
    }
}

#[tokio::test]
async fn test_invalidate_drops_cached_frames() {
    let registry = VideoRegistry::new(CachedFrameSource::new(RewrittenVideo::new(1)));
    let request = RegionRequest::new(0, 0, 4, 4);

    let slide = registry.get_video("live.mp4").await.unwrap();
    let before = slide.read_region(&request).await.unwrap();
    assert_eq!(before.get_pixel(0, 0).0, [1, 1, 1, 255]);

    registry.source().inner().rewrite(9);
    registry.invalidate("live.mp4").await;
    assert!(registry.source().cache().is_empty().await);

    let slide = registry.get_video("live.mp4").await.unwrap();
    let after = slide.read_region(&request).await.unwrap();
    assert_eq!(after.get_pixel(0, 0).0, [9, 9, 9, 255]);
}

#[tokio::test]
async fn test_clear_drops_cached_frames() {
    let registry = VideoRegistry::new(CachedFrameSource::new(RewrittenVideo::new(1)));
    let request = RegionRequest::new(0, 0, 4, 4).with_frame(1);

    let slide = registry.get_video("live.mp4").await.unwrap();
    slide.read_region(&request).await.unwrap();
    assert_eq!(registry.source().cache().len().await, 1);

    registry.source().inner().rewrite(5);
    registry.clear().await;
    assert_eq!(registry.cached_count().await, 0);
    assert!(registry.source().cache().is_empty().await);

    let slide = registry.get_video("live.mp4").await.unwrap();
    let after = slide.read_region(&request).await.unwrap();
    assert_eq!(after.get_pixel(3, 3).0, [5, 5, 5, 255]);
}

//! Region read integration tests.
//!
//! Tests verify:
//! - Windows fully inside the frame copy pixels unscaled
//! - Windows outside the frame are fully transparent
//! - Partial overlap pastes the visible part at the right offset
//! - Frame indices are clamped into range
//! - Decode failures degrade to transparent canvases

use video_slide::error::RegionError;
use video_slide::region::{RegionReadable, RegionRequest, VideoSlide};

use super::test_utils::{
    clip_source, is_transparent, opaque, shared, MockFrameSource, MockVideo, TRANSPARENT,
};

async fn open_clip() -> VideoSlide<MockFrameSource> {
    VideoSlide::open(shared(clip_source()), "clip.mp4")
        .await
        .unwrap()
}

// =============================================================================
// Geometry
// =============================================================================

#[tokio::test]
async fn test_region_inside_frame() {
    let slide = open_clip().await;
    let request = RegionRequest::new(5, 6, 10, 8).with_frame(2);
    let canvas = slide.read_region(&request).await.unwrap();

    assert_eq!(canvas.dimensions(), (10, 8));
    for (x, y, px) in canvas.enumerate_pixels() {
        assert_eq!(px.0, opaque(2, x + 5, y + 6));
    }
}

#[tokio::test]
async fn test_full_frame_matches_decoded_frame() {
    let slide = open_clip().await;
    let canvas = slide
        .read_region(&RegionRequest::full_frame(40, 30).with_frame(7))
        .await
        .unwrap();

    assert_eq!(canvas.dimensions(), (40, 30));
    for (x, y, px) in canvas.enumerate_pixels() {
        assert_eq!(px.0, opaque(7, x, y));
    }
}

#[tokio::test]
async fn test_region_disjoint_is_transparent() {
    let slide = open_clip().await;
    for (x, y) in [(40, 0), (0, 30), (-20, 0), (0, -20), (1_000, -1_000)] {
        let canvas = slide
            .read_region(&RegionRequest::new(x, y, 20, 20))
            .await
            .unwrap();
        assert_eq!(canvas.dimensions(), (20, 20));
        assert!(is_transparent(&canvas), "window at ({}, {})", x, y);
    }
}

#[tokio::test]
async fn test_region_partial_overlap_left() {
    let slide = open_clip().await;
    let canvas = slide
        .read_region(&RegionRequest::new(-10, 5, 50, 20))
        .await
        .unwrap();

    assert_eq!(canvas.dimensions(), (50, 20));
    for (x, y, px) in canvas.enumerate_pixels() {
        if x < 10 {
            assert_eq!(px.0, TRANSPARENT, "({}, {})", x, y);
        } else {
            assert_eq!(px.0, opaque(0, x - 10, y + 5), "({}, {})", x, y);
        }
    }
}

#[tokio::test]
async fn test_region_larger_than_frame() {
    let slide = open_clip().await;
    let canvas = slide
        .read_region(&RegionRequest::new(-5, -5, 50, 40))
        .await
        .unwrap();

    let opaque_pixels = canvas.pixels().filter(|p| p.0[3] == 255).count();
    assert_eq!(opaque_pixels, 40 * 30);
    assert_eq!(canvas.get_pixel(5, 5).0, opaque(0, 0, 0));
    assert_eq!(canvas.get_pixel(44, 34).0, opaque(0, 39, 29));
    assert_eq!(canvas.get_pixel(45, 34).0, TRANSPARENT);
    assert_eq!(canvas.get_pixel(44, 35).0, TRANSPARENT);
}

#[tokio::test]
async fn test_region_reads_are_idempotent() {
    let slide = open_clip().await;
    let request = RegionRequest::new(30, 20, 16, 16).with_frame(4);

    let first = slide.read_region(&request).await.unwrap();
    let second = slide.read_region(&request).await.unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_zero_size_region() {
    let source = shared(clip_source());
    let slide = VideoSlide::open(source.clone(), "clip.mp4").await.unwrap();

    let canvas = slide
        .read_region(&RegionRequest::new(0, 0, 0, 0))
        .await
        .unwrap();
    assert_eq!(canvas.dimensions(), (0, 0));
    assert_eq!(source.decode_count(), 0);
}

#[tokio::test]
async fn test_negative_size_region() {
    let slide = open_clip().await;
    let result = slide.read_region(&RegionRequest::new(0, 0, -1, 10)).await;

    match result {
        Err(RegionError::InvalidSize { width, height }) => {
            assert_eq!((width, height), (-1, 10));
        }
        other => panic!("Expected InvalidSize, got {:?}", other.map(|c| c.dimensions())),
    }
}

#[tokio::test]
async fn test_nonzero_level_rejected() {
    let slide = open_clip().await;
    let result = slide
        .read_region(&RegionRequest::new(0, 0, 4, 4).at_level(1))
        .await;
    assert!(matches!(
        result,
        Err(RegionError::UnsupportedLevel {
            level: 1,
            level_count: 1
        })
    ));
}

// =============================================================================
// Frame Selection
// =============================================================================

#[tokio::test]
async fn test_frame_clamped_high_and_low() {
    let source = shared(clip_source());
    let slide = VideoSlide::open(source.clone(), "clip.mp4").await.unwrap();
    let request = RegionRequest::new(0, 0, 4, 4);

    let high = slide.read_region(&request.with_frame(500)).await.unwrap();
    let last = slide.read_region(&request.with_frame(9)).await.unwrap();
    assert_eq!(high, last);

    let low = slide.read_region(&request.with_frame(-1)).await.unwrap();
    let first = slide.read_region(&request.with_frame(0)).await.unwrap();
    assert_eq!(low, first);

    assert_eq!(source.decoded_frames(), vec![9, 9, 0, 0]);
}

#[tokio::test]
async fn test_decode_failure_is_transparent() {
    let source = shared(
        MockFrameSource::new().with_video("bad.mp4", MockVideo::new(16, 16, 4, 25.0).failing(2)),
    );
    let slide = VideoSlide::open(source, "bad.mp4").await.unwrap();

    let canvas = slide
        .read_region(&RegionRequest::new(-4, -4, 12, 12).with_frame(2))
        .await
        .unwrap();
    assert_eq!(canvas.dimensions(), (12, 12));
    assert!(is_transparent(&canvas));

    // Neighbouring frames still decode
    let canvas = slide
        .read_region(&RegionRequest::new(0, 0, 4, 4).with_frame(3))
        .await
        .unwrap();
    assert_eq!(canvas.get_pixel(1, 1).0, opaque(3, 1, 1));
}

#[tokio::test]
async fn test_short_buffer_is_transparent() {
    let source = shared(
        MockFrameSource::new().with_video("short.mp4", MockVideo::new(16, 16, 4, 25.0).short(1)),
    );
    let slide = VideoSlide::open(source, "short.mp4").await.unwrap();

    let canvas = slide
        .read_region(&RegionRequest::new(0, 0, 16, 16).with_frame(1))
        .await
        .unwrap();
    assert!(is_transparent(&canvas));
}

#[tokio::test]
async fn test_empty_video_reads_transparent() {
    let source = shared(
        MockFrameSource::new().with_video("empty.mp4", MockVideo::new(16, 16, 0, 25.0)),
    );
    let slide = VideoSlide::open(source, "empty.mp4").await.unwrap();

    let canvas = slide
        .read_region(&RegionRequest::new(0, 0, 8, 8).with_frame(3))
        .await
        .unwrap();
    assert_eq!(canvas.dimensions(), (8, 8));
    assert!(is_transparent(&canvas));
}

// =============================================================================
// Level Shims
// =============================================================================

#[tokio::test]
async fn test_level_shims_through_trait_object() {
    let slide = open_clip().await;
    let readable: &dyn RegionReadable = &slide;

    assert_eq!(readable.dimensions(), (40, 30));
    assert_eq!(readable.level_count(), 1);
    assert_eq!(readable.level_dimensions(), vec![(40, 30)]);

    let canvas = readable
        .read_region(&RegionRequest::new(38, 28, 4, 4))
        .await
        .unwrap();
    assert_eq!(canvas.get_pixel(1, 1).0, opaque(0, 39, 29));
    assert_eq!(canvas.get_pixel(2, 2).0, TRANSPARENT);
}

//! Time axis integration tests.
//!
//! Tests verify:
//! - Frame/time conversion through an opened slide
//! - Frame descriptors match frame start times
//! - Videos without a usable frame rate degrade to frame 0 / time 0

use video_slide::region::{RegionRequest, VideoSlide};
use video_slide::source::FrameType;

use super::test_utils::{opaque, shared, MockFrameSource, MockVideo};

async fn open_video(frame_count: u64, fps: f64) -> VideoSlide<MockFrameSource> {
    let source = MockFrameSource::new().with_video("t.mp4", MockVideo::new(8, 8, frame_count, fps));
    VideoSlide::open(shared(source), "t.mp4").await.unwrap()
}

#[tokio::test]
async fn test_temporal_metadata() {
    let slide = open_video(250, 25.0).await;

    assert_eq!(slide.frame_type(), FrameType::TimeSeries);
    assert_eq!(slide.default_frame(), 0);
    assert_eq!(slide.duration(), 10.0);
}

#[tokio::test]
async fn test_time_frame_round_trip() {
    let slide = open_video(3_000, 29.97).await;
    for frame in [0, 1, 2, 299, 1_000, 2_999] {
        assert_eq!(slide.time_to_frame(slide.frame_to_time(frame)), frame);
    }
}

#[tokio::test]
async fn test_time_to_frame_clamps() {
    let slide = open_video(100, 25.0).await;
    assert_eq!(slide.time_to_frame(-1.0), 0);
    assert_eq!(slide.time_to_frame(3.99), 99);
    assert_eq!(slide.time_to_frame(3_600.0), 99);
}

#[tokio::test]
async fn test_frame_descriptors_labels() {
    let slide = open_video(6, 4.0).await;
    let labels: Vec<String> = slide.frame_descriptors().collect();
    assert_eq!(labels, vec!["0.00", "0.25", "0.50", "0.75", "1.00", "1.25"]);
}

#[tokio::test]
async fn test_frame_descriptors_one_per_frame() {
    let slide = open_video(90, 30.0).await;
    let descriptors = slide.frame_descriptors();
    assert_eq!(descriptors.len(), 90);

    for (frame, label) in descriptors.enumerate() {
        let expected = format!("{:.2}", slide.frame_to_time(frame as u64));
        assert_eq!(label, expected);
    }
}

#[tokio::test]
async fn test_zero_fps_video() {
    let slide = open_video(5, 0.0).await;

    assert_eq!(slide.duration(), 0.0);
    assert_eq!(slide.frame_to_time(3), 0.0);
    assert_eq!(slide.time_to_frame(2.0), 0);
    assert!(slide.frame_descriptors().all(|label| label == "0.00"));
}

#[tokio::test]
async fn test_time_selects_region_frame() {
    let slide = open_video(50, 10.0).await;
    let frame = slide.time_to_frame(2.35);
    assert_eq!(frame, 23);

    let canvas = slide
        .read_region(&RegionRequest::new(0, 0, 2, 2).with_frame(frame as i64))
        .await
        .unwrap();
    assert_eq!(canvas.get_pixel(1, 0).0, opaque(23, 1, 0));
}

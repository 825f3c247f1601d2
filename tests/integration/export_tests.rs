//! Export integration tests.
//!
//! Tests verify:
//! - Regions are exported as lossless RGBA PNG
//! - Thumbnails keep the aspect ratio
//! - Missing videos and malformed requests map to export errors
//! - Exported files can be written and read back

use image::ImageFormat;

use video_slide::error::{ExportError, RegionError};
use video_slide::export::RegionService;
use video_slide::region::RegionRequest;
use video_slide::registry::VideoRegistry;

use super::test_utils::{clip_source, opaque, MockFrameSource, MockVideo, TRANSPARENT};

fn service() -> RegionService<MockFrameSource> {
    RegionService::new(VideoRegistry::new(clip_source()))
}

fn decode_png(data: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(data, ImageFormat::Png)
        .unwrap()
        .to_rgba8()
}

#[tokio::test]
async fn test_export_region_round_trips_pixels() {
    let service = service();
    let request = RegionRequest::new(-10, 5, 50, 20).with_frame(6);
    let response = service.read_region("clip.mp4", &request).await.unwrap();

    assert_eq!((response.width, response.height), (50, 20));
    let image = decode_png(&response.data);
    assert_eq!(image.dimensions(), (50, 20));
    assert_eq!(image.get_pixel(9, 0).0, TRANSPARENT);
    assert_eq!(image.get_pixel(10, 0).0, opaque(6, 0, 5));
    assert_eq!(image.get_pixel(49, 19).0, opaque(6, 39, 24));
}

#[tokio::test]
async fn test_export_missing_video() {
    let service = service();
    let result = service
        .read_region("other.mp4", &RegionRequest::new(0, 0, 4, 4))
        .await;
    assert!(matches!(
        result,
        Err(ExportError::VideoNotFound { ref video_id }) if video_id == "other.mp4"
    ));
}

#[tokio::test]
async fn test_export_invalid_size() {
    let service = service();
    let result = service
        .read_region("clip.mp4", &RegionRequest::new(0, 0, 4, -4))
        .await;
    assert!(matches!(
        result,
        Err(ExportError::Region(RegionError::InvalidSize { .. }))
    ));
}

#[tokio::test]
async fn test_export_failed_frame_is_transparent_png() {
    let source =
        MockFrameSource::new().with_video("bad.mp4", MockVideo::new(8, 8, 3, 25.0).failing(0));
    let service = RegionService::new(VideoRegistry::new(source));

    let response = service
        .read_region("bad.mp4", &RegionRequest::new(0, 0, 8, 8))
        .await
        .unwrap();
    let image = decode_png(&response.data);
    assert!(image.pixels().all(|p| p.0 == TRANSPARENT));
}

#[tokio::test]
async fn test_thumbnail_aspect_ratio() {
    let service = service();
    let response = service.thumbnail("clip.mp4", 20).await.unwrap();

    assert_eq!((response.width, response.height), (20, 15));
    let image = decode_png(&response.data);
    assert_eq!(image.dimensions(), (20, 15));
    assert!(image.pixels().all(|p| p.0[3] == 255));
}

#[tokio::test]
async fn test_thumbnail_zero_dimension() {
    let service = service();
    let result = service.thumbnail("clip.mp4", 0).await;
    assert!(matches!(result, Err(ExportError::InvalidDimension { .. })));
}

#[tokio::test]
async fn test_metadata_json() {
    let service = service();
    let metadata = service.metadata("clip.mp4").await.unwrap();
    let json = serde_json::to_value(&metadata).unwrap();

    assert_eq!(json["video_id"], "clip.mp4");
    assert_eq!(json["width"], 40);
    assert_eq!(json["height"], 30);
    assert_eq!(json["frame_count"], 10);
    assert_eq!(json["codec"], "avc1");
    assert_eq!(json["level_count"], 1);
}

#[tokio::test]
async fn test_export_written_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("region.png");

    let service = service();
    let response = service
        .read_region("clip.mp4", &RegionRequest::new(0, 0, 16, 16))
        .await
        .unwrap();
    tokio::fs::write(&path, &response.data).await.unwrap();

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (16, 16));
    assert_eq!(image.get_pixel(3, 7).0, opaque(0, 3, 7));
}

//! Region Service for turning region reads into encoded images.
//!
//! The RegionService is the entry point used by the command line tool and by
//! anything embedding the crate. It orchestrates:
//! - Video access via the registry
//! - Region reads and thumbnails on the video slide
//! - PNG encoding
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RegionService                         │
//! │   read_region()        thumbnail()        metadata()        │
//! │         │                   │                  │            │
//! │         ▼                   ▼                  ▼            │
//! │  ┌───────────────┐  ┌──────────────┐  ┌─────────────────┐   │
//! │  │ VideoRegistry │  │  VideoSlide  │  │ PngRegionEncoder│   │
//! │  └───────────────┘  └──────────────┘  └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{ExportError, SourceError};
use crate::region::{RegionReadable, RegionRequest, VideoSlide};
use crate::registry::VideoRegistry;
use crate::source::{FrameSource, FrameType};

use super::encoder::PngRegionEncoder;

// =============================================================================
// Responses
// =============================================================================

/// An encoded region or thumbnail.
#[derive(Debug, Clone)]
pub struct RegionResponse {
    /// PNG bytes
    pub data: Bytes,

    /// Width of the encoded image
    pub width: u32,

    /// Height of the encoded image
    pub height: u32,
}

/// Metadata of one resolution level.
#[derive(Debug, Clone, Serialize)]
pub struct LevelMetadata {
    pub level: usize,
    pub width: u32,
    pub height: u32,
    pub downsample: f64,
}

/// Metadata of an opened video.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    /// Video identifier
    pub video_id: String,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Number of frames
    pub frame_count: u64,

    /// Frames per second (0 when unknown)
    pub fps: f64,

    /// Length in seconds
    pub duration: f64,

    /// FourCC of the video stream
    pub codec: String,

    pub frame_type: FrameType,

    pub default_frame: u64,

    /// Number of resolution levels
    pub level_count: usize,

    /// Metadata for each level
    pub levels: Vec<LevelMetadata>,
}

// =============================================================================
// Region Service
// =============================================================================

/// Service for reading and encoding regions of registered videos.
///
/// # Example
///
/// ```ignore
/// use video_slide::export::RegionService;
/// use video_slide::region::RegionRequest;
/// use video_slide::registry::VideoRegistry;
///
/// let service = RegionService::new(VideoRegistry::new(source));
///
/// let request = RegionRequest::new(100, 100, 512, 512).with_frame(42);
/// let response = service.read_region("clips/cells.mp4", &request).await?;
/// std::fs::write("region.png", &response.data)?;
/// ```
pub struct RegionService<S: FrameSource> {
    /// The video registry
    registry: Arc<VideoRegistry<S>>,

    /// PNG encoder
    encoder: PngRegionEncoder,
}

impl<S: FrameSource> RegionService<S> {
    /// Create a new region service owning its registry.
    pub fn new(registry: VideoRegistry<S>) -> Self {
        Self::with_shared_registry(Arc::new(registry))
    }

    /// Create a new region service with a shared registry.
    pub fn with_shared_registry(registry: Arc<VideoRegistry<S>>) -> Self {
        Self {
            registry,
            encoder: PngRegionEncoder::new(),
        }
    }

    /// Replace the PNG encoder.
    pub fn with_encoder(mut self, encoder: PngRegionEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Get a reference to the underlying registry.
    pub fn registry(&self) -> &Arc<VideoRegistry<S>> {
        &self.registry
    }

    /// Read a region of a video and encode it as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The video cannot be found or opened
    /// - The region request is malformed (unsupported level, negative size)
    /// - The canvas is empty or cannot be encoded
    pub async fn read_region(
        &self,
        video_id: &str,
        request: &RegionRequest,
    ) -> Result<RegionResponse, ExportError> {
        let slide = self.get_video(video_id).await?;
        let canvas = slide.read_region(request).await?;
        let data = self.encoder.encode(&canvas)?;

        Ok(RegionResponse {
            data,
            width: canvas.width(),
            height: canvas.height(),
        })
    }

    /// Generate a PNG thumbnail of the default frame.
    ///
    /// The longer side is scaled to `max_dimension` and the aspect ratio is
    /// preserved; videos already within the bound are returned at native size.
    pub async fn thumbnail(
        &self,
        video_id: &str,
        max_dimension: u32,
    ) -> Result<RegionResponse, ExportError> {
        if max_dimension == 0 {
            return Err(ExportError::InvalidDimension { max_dimension });
        }

        let slide = self.get_video(video_id).await?;
        let (width, height) = thumbnail_size(slide.dimensions(), max_dimension);
        let canvas = slide
            .thumbnail_at(width, height, slide.default_frame() as i64)
            .await?;
        let data = self.encoder.encode(&canvas)?;

        Ok(RegionResponse {
            data,
            width: canvas.width(),
            height: canvas.height(),
        })
    }

    /// Describe a video and its single level.
    pub async fn metadata(&self, video_id: &str) -> Result<VideoMetadata, ExportError> {
        let slide = self.get_video(video_id).await?;
        let handle = slide.handle();

        let levels = (0..slide.level_count())
            .filter_map(|level| {
                slide.level_info(level).map(|info| LevelMetadata {
                    level,
                    width: info.width,
                    height: info.height,
                    downsample: info.downsample,
                })
            })
            .collect();

        Ok(VideoMetadata {
            video_id: video_id.to_string(),
            width: handle.width(),
            height: handle.height(),
            frame_count: handle.frame_count(),
            fps: handle.fps(),
            duration: handle.duration(),
            codec: handle.codec().to_string(),
            frame_type: handle.frame_type(),
            default_frame: handle.default_frame(),
            level_count: slide.level_count(),
            levels,
        })
    }

    async fn get_video(&self, video_id: &str) -> Result<Arc<VideoSlide<S>>, ExportError> {
        self.registry.get_video(video_id).await.map_err(|e| match e {
            SourceError::NotFound(_) => ExportError::VideoNotFound {
                video_id: video_id.to_string(),
            },
            other => ExportError::Source(other),
        })
    }
}

/// Fit `(width, height)` within a `max_dimension` square, keeping the aspect
/// ratio. Each side is at least one pixel unless the video itself is empty.
pub fn thumbnail_size((width, height): (u32, u32), max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension {
        return (width, height);
    }

    let scale = f64::from(max_dimension) / f64::from(longest);
    let fit = |side: u32| -> u32 {
        if side == 0 {
            0
        } else {
            ((f64::from(side) * scale).round() as u32).clamp(1, max_dimension)
        }
    };
    (fit(width), fit(height))
}

// =============================================================================
// Tests
// =============================================================================

//! Video-backed region reader.
//!
//! [`VideoSlide`] adapts a [`FrameSource`] to the [`RegionReadable`]
//! interface. Validation failures are returned as errors; everything that can
//! go wrong with a single frame (decode failure, timeout, short buffer) is
//! logged and rendered as a fully transparent canvas instead.

use std::sync::Arc;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use tracing::{debug, error, warn};

use crate::error::{RegionError, SourceError};
use crate::source::{FrameSource, FrameType, VideoHandle};
use crate::timeline::{self, FrameDescriptors};

use super::geometry::{composite, transparent_canvas, visible_rect};
use super::{Canvas, RegionReadable, RegionRequest};

/// Videos expose a single level: full frame resolution.
pub const VIDEO_LEVEL_COUNT: usize = 1;

/// A video opened as a single-level virtual slide.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use video_slide::region::{RegionRequest, VideoSlide};
/// use video_slide::source::FfmpegFrameSource;
///
/// let slide = VideoSlide::open(Arc::new(FfmpegFrameSource::new()), "cells.mp4").await?;
///
/// // 256x256 window hanging off the top-left corner, on frame 120
/// let request = RegionRequest::new(-64, -64, 256, 256).with_frame(120);
/// let canvas = slide.read_region(&request).await?;
/// assert_eq!(canvas.dimensions(), (256, 256));
/// ```
pub struct VideoSlide<S> {
    source: Arc<S>,
    handle: VideoHandle,
}

impl<S: FrameSource> VideoSlide<S> {
    /// Open `identifier` through `source`.
    pub async fn open(source: Arc<S>, identifier: &str) -> Result<Self, SourceError> {
        let handle = source.open(identifier).await?;
        Ok(Self::new(source, handle))
    }

    /// Wrap an already opened handle.
    pub fn new(source: Arc<S>, handle: VideoHandle) -> Self {
        Self { source, handle }
    }

    pub fn handle(&self) -> &VideoHandle {
        &self.handle
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn identifier(&self) -> &str {
        self.handle.identifier()
    }

    pub fn frame_count(&self) -> u64 {
        self.handle.frame_count()
    }

    pub fn fps(&self) -> f64 {
        self.handle.fps()
    }

    pub fn frame_type(&self) -> FrameType {
        self.handle.frame_type()
    }

    pub fn default_frame(&self) -> u64 {
        self.handle.default_frame()
    }

    pub fn duration(&self) -> f64 {
        self.handle.duration()
    }

    pub fn frame_descriptors(&self) -> FrameDescriptors {
        self.handle.frame_descriptors()
    }

    pub fn frame_to_time(&self, frame: u64) -> f64 {
        self.handle.frame_to_time(frame)
    }

    pub fn time_to_frame(&self, seconds: f64) -> u64 {
        self.handle.time_to_frame(seconds)
    }

    /// Read a region of one frame.
    ///
    /// Checks run in order, the first failure wins:
    /// 1. `level != 0` → [`RegionError::UnsupportedLevel`]
    /// 2. negative width or height → [`RegionError::InvalidSize`]
    /// 3. a size that cannot be allocated → [`RegionError::SizeTooLarge`]
    ///
    /// A zero width or height returns an empty canvas without decoding. The
    /// frame index is clamped into `[0, frame_count - 1]`.
    pub async fn read_region(&self, request: &RegionRequest) -> Result<Canvas, RegionError> {
        let (width, height) = validate(request)?;
        if width == 0 || height == 0 {
            return Ok(transparent_canvas(width, height));
        }

        let frame_index = timeline::clamp_frame(request.frame, self.handle.frame_count());
        let frame = match self.source.decode(&self.handle, frame_index).await {
            Ok(frame) if frame.is_complete() => frame,
            Ok(frame) => {
                warn!(
                    identifier = self.handle.identifier(),
                    frame = frame_index,
                    expected = frame.expected_len(),
                    actual = frame.data.len(),
                    "decoded frame has wrong buffer size, returning transparent region"
                );
                return Ok(transparent_canvas(width, height));
            }
            Err(e) if e.is_frame_error() => {
                warn!(
                    identifier = self.handle.identifier(),
                    frame = frame_index,
                    error = %e,
                    "frame decode failed, returning transparent region"
                );
                return Ok(transparent_canvas(width, height));
            }
            Err(e) => {
                error!(
                    identifier = self.handle.identifier(),
                    frame = frame_index,
                    error = %e,
                    "video unreadable, returning transparent region"
                );
                return Ok(transparent_canvas(width, height));
            }
        };

        let rect = visible_rect(
            i64::from(frame.width),
            i64::from(frame.height),
            request.x,
            request.y,
            request.width,
            request.height,
        );

        debug!(
            identifier = self.handle.identifier(),
            frame = frame_index,
            x = request.x,
            y = request.y,
            width,
            height,
            visible_width = rect.width(),
            visible_height = rect.height(),
            "read region"
        );

        Ok(composite(&frame, &rect, width, height))
    }

    /// Whole default frame resampled to `width × height`.
    pub async fn thumbnail(&self, width: u32, height: u32) -> Result<Canvas, RegionError> {
        self.thumbnail_at(width, height, 0).await
    }

    /// Whole `frame` resampled to `width × height` (bilinear).
    pub async fn thumbnail_at(
        &self,
        width: u32,
        height: u32,
        frame: i64,
    ) -> Result<Canvas, RegionError> {
        let (full_width, full_height) = self.handle.dimensions();
        let request = RegionRequest::full_frame(full_width, full_height).with_frame(frame);
        let canvas = self.read_region(&request).await?;

        if width == 0 || height == 0 || canvas.width() == 0 || canvas.height() == 0 {
            return Ok(transparent_canvas(width, height));
        }
        if canvas.dimensions() == (width, height) {
            return Ok(canvas);
        }
        Ok(imageops::resize(&canvas, width, height, FilterType::Triangle))
    }
}

/// Validate a request and return its canvas size.
fn validate(request: &RegionRequest) -> Result<(u32, u32), RegionError> {
    if request.level != 0 {
        return Err(RegionError::UnsupportedLevel {
            level: request.level,
            level_count: VIDEO_LEVEL_COUNT,
        });
    }

    if request.width < 0 || request.height < 0 {
        return Err(RegionError::InvalidSize {
            width: request.width,
            height: request.height,
        });
    }

    let too_large = || RegionError::SizeTooLarge {
        width: request.width,
        height: request.height,
    };
    let width = u32::try_from(request.width).map_err(|_| too_large())?;
    let height = u32::try_from(request.height).map_err(|_| too_large())?;
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(too_large)?;

    Ok((width, height))
}

#[async_trait]
impl<S: FrameSource> RegionReadable for VideoSlide<S> {
    fn dimensions(&self) -> (u32, u32) {
        self.handle.dimensions()
    }

    fn level_count(&self) -> usize {
        VIDEO_LEVEL_COUNT
    }

    fn level_dimensions(&self) -> Vec<(u32, u32)> {
        vec![self.handle.dimensions()]
    }

    async fn read_region(&self, request: &RegionRequest) -> Result<Canvas, RegionError> {
        VideoSlide::read_region(self, request).await
    }
}

//! Region reading.
//!
//! This module exposes a video as a single-level "virtual slide": callers ask
//! for a pixel rectangle at a level, optionally on a specific frame, and get
//! back a canvas of exactly the requested size.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     Viewers / thumbnailing / export     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │        RegionReadable Trait             │
//! │  (dimensions, levels, read_region)      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            VideoSlide<S>                │
//! │  validate → clamp frame → decode →      │
//! │  geometry::composite                    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            FrameSource                  │
//! └─────────────────────────────────────────┘
//! ```

pub mod geometry;
mod reader;

use async_trait::async_trait;
use image::RgbaImage;

use crate::error::RegionError;

pub use geometry::{composite, transparent_canvas, visible_rect, VisibleRect};
pub use reader::{VideoSlide, VIDEO_LEVEL_COUNT};

/// Output of a region read: RGBA, row-major, 4 bytes per pixel.
pub type Canvas = RgbaImage;

// =============================================================================
// Region Request
// =============================================================================

/// A request for a rectangular region of one frame.
///
/// Coordinates are level-0 pixels and may be negative or extend past the
/// frame; the frame index is clamped into range by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionRequest {
    /// Left edge of the window
    pub x: i64,

    /// Top edge of the window
    pub y: i64,

    /// Resolution level (only 0 exists)
    pub level: usize,

    /// Window width in pixels
    pub width: i64,

    /// Window height in pixels
    pub height: i64,

    /// Frame index along the time axis
    pub frame: i64,
}

impl RegionRequest {
    /// Request a window at level 0 on frame 0.
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            level: 0,
            width,
            height,
            frame: 0,
        }
    }

    /// Request the whole `width × height` frame.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self::new(0, 0, i64::from(width), i64::from(height))
    }

    pub fn at_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    pub fn with_frame(mut self, frame: i64) -> Self {
        self.frame = frame;
        self
    }

    pub fn location(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (i64, i64) {
        (self.width, self.height)
    }
}

// =============================================================================
// Level Information
// =============================================================================

/// Metadata of one resolution level, for pyramidal-image consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelInfo {
    /// Width of this level in pixels
    pub width: u32,

    /// Height of this level in pixels
    pub height: u32,

    /// Downsample factor relative to level 0
    pub downsample: f64,
}

// =============================================================================
// RegionReadable Trait
// =============================================================================

/// Capability of serving rectangular pixel regions by level.
///
/// This is the interface whole-slide viewers program against; a video is one
/// implementation with a single level and a time axis.
#[async_trait]
pub trait RegionReadable: Send + Sync {
    /// `(width, height)` of level 0.
    fn dimensions(&self) -> (u32, u32);

    /// Number of resolution levels.
    fn level_count(&self) -> usize;

    /// Dimensions of every level, level 0 first.
    fn level_dimensions(&self) -> Vec<(u32, u32)>;

    /// Complete information about a level, or `None` if it does not exist.
    fn level_info(&self, level: usize) -> Option<LevelInfo> {
        let dims = self.level_dimensions();
        let (width, height) = *dims.get(level)?;
        let (base_width, _) = self.dimensions();
        let downsample = if width == 0 {
            1.0
        } else {
            f64::from(base_width) / f64::from(width)
        };
        Some(LevelInfo {
            width,
            height,
            downsample,
        })
    }

    /// Read a `width × height` canvas at `(x, y)` on `level`.
    ///
    /// # Errors
    ///
    /// Only malformed requests fail: an unknown level, a negative size, or a
    /// size too large for a canvas.
    async fn read_region(&self, request: &RegionRequest) -> Result<Canvas, RegionError>;
}

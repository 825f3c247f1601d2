//! Frame source layer.
//!
//! A frame source turns a video identifier into a [`VideoHandle`] carrying
//! immutable properties, and decodes individual frames into raw pixel buffers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        VideoSlide (region reader)       │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          CachedFrameSource              │
//! │   (optional LRU of decoded frames)      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           FrameSource Trait             │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │  FfmpegFrameSource (ffprobe + ffmpeg)   │
//! └─────────────────────────────────────────┘
//! ```

mod cache;
mod ffmpeg;
mod probe;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::SourceError;
use crate::timeline;

pub use cache::{CachedFrameSource, FrameCache, FrameCacheKey, DEFAULT_FRAME_CACHE_CAPACITY};
pub use ffmpeg::{FfmpegFrameSource, DEFAULT_DECODE_TIMEOUT};
pub use probe::{parse_frame_rate, parse_probe_output};

// =============================================================================
// Codec Tag
// =============================================================================

/// Four-character codec identifier (FourCC), e.g. `avc1` or `mp4v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecTag([u8; 4]);

impl CodecTag {
    /// Tag used when the container reports nothing usable.
    pub const UNKNOWN: CodecTag = CodecTag(*b"    ");

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Decode a packed FourCC value, least significant byte first.
    pub fn from_fourcc(value: u32) -> Self {
        Self(value.to_le_bytes())
    }

    /// Build a tag from a string, truncating or space-padding to four bytes.
    ///
    /// Non-ASCII characters are replaced with `?`.
    pub fn from_str_lossy(s: &str) -> Self {
        let mut bytes = *b"    ";
        for (slot, c) in bytes.iter_mut().zip(s.chars()) {
            *slot = if c.is_ascii() { c as u8 } else { b'?' };
        }
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Pack back into a FourCC integer.
    pub fn to_fourcc(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl fmt::Display for CodecTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

// =============================================================================
// Frame Type
// =============================================================================

/// How the frames of a multi-frame image relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    /// Frames are focal planes of the same field of view
    ZStack,
    /// Frames are successive points in time
    TimeSeries,
    Undefined,
}

// =============================================================================
// Video Handle
// =============================================================================

/// Properties captured once when a video is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProperties {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Total number of decodable frames
    pub frame_count: u64,

    /// Frames per second (may be 0 for degenerate sources)
    pub fps: f64,

    /// Codec FourCC
    pub codec: CodecTag,
}

/// An opened video source.
///
/// The handle is immutable: re-opening the same identifier yields identical
/// properties. Decode operations borrow it.
#[derive(Debug, Clone)]
pub struct VideoHandle {
    identifier: Arc<str>,
    properties: VideoProperties,
}

impl VideoHandle {
    pub fn new(identifier: impl Into<Arc<str>>, properties: VideoProperties) -> Self {
        Self {
            identifier: identifier.into(),
            properties,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Shared identifier, cheap to clone into cache keys.
    pub fn identifier_arc(&self) -> Arc<str> {
        Arc::clone(&self.identifier)
    }

    pub fn properties(&self) -> &VideoProperties {
        &self.properties
    }

    pub fn width(&self) -> u32 {
        self.properties.width
    }

    pub fn height(&self) -> u32 {
        self.properties.height
    }

    /// `(width, height)` of every frame.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.properties.width, self.properties.height)
    }

    pub fn frame_count(&self) -> u64 {
        self.properties.frame_count
    }

    pub fn fps(&self) -> f64 {
        self.properties.fps
    }

    pub fn codec(&self) -> CodecTag {
        self.properties.codec
    }

    /// Videos are always time series.
    pub fn frame_type(&self) -> FrameType {
        FrameType::TimeSeries
    }

    /// Frame shown when no frame is requested.
    pub fn default_frame(&self) -> u64 {
        0
    }

    /// Length of the video in seconds (0 if fps is not positive).
    pub fn duration(&self) -> f64 {
        timeline::duration(self.properties.frame_count, self.properties.fps)
    }

    pub fn frame_to_time(&self, frame: u64) -> f64 {
        timeline::frame_to_time(self.properties.fps, frame)
    }

    pub fn time_to_frame(&self, seconds: f64) -> u64 {
        timeline::time_to_frame(self.properties.fps, self.properties.frame_count, seconds)
    }

    pub fn frame_descriptors(&self) -> timeline::FrameDescriptors {
        timeline::frame_descriptors(&self.properties)
    }
}

// =============================================================================
// Decoded Frame
// =============================================================================

/// Channel order of a 3-channel decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    Rgb,
    Bgr,
}

/// One decoded frame: `height` rows of `width` pixels, 3 bytes per pixel.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub order: PixelOrder,
    pub data: Bytes,
}

impl DecodedFrame {
    pub fn new(width: u32, height: u32, order: PixelOrder, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            order,
            data: data.into(),
        }
    }

    /// Buffer length implied by the dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Whether the buffer length matches the dimensions.
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    /// `[r, g, b]` of the pixel at `(x, y)`. Caller guarantees bounds.
    #[inline]
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        let p = &self.data[i..i + 3];
        match self.order {
            PixelOrder::Rgb => [p[0], p[1], p[2]],
            PixelOrder::Bgr => [p[2], p[1], p[0]],
        }
    }
}

// =============================================================================
// FrameSource Trait
// =============================================================================

/// Collaborator that opens videos and decodes single frames.
///
/// Implementations must not hold mutable decode state across calls on the
/// same handle: each `decode` acquires and releases whatever lower-level
/// resource it needs, so concurrent callers never share a positional decoder.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Open a video and capture its properties.
    async fn open(&self, identifier: &str) -> Result<VideoHandle, SourceError>;

    /// Decode the frame at `frame_index`.
    ///
    /// Indices outside `[0, frame_count)` are a failure; callers clamp first.
    async fn decode(&self, handle: &VideoHandle, frame_index: u64)
        -> Result<DecodedFrame, SourceError>;

    /// Drop any state held for `identifier`, such as cached frames.
    async fn invalidate(&self, _identifier: &str) {}

    /// Drop state held for every video.
    async fn invalidate_all(&self) {}
}

#[async_trait]
impl<S: FrameSource + ?Sized> FrameSource for Arc<S> {
    async fn open(&self, identifier: &str) -> Result<VideoHandle, SourceError> {
        (**self).open(identifier).await
    }

    async fn decode(
        &self,
        handle: &VideoHandle,
        frame_index: u64,
    ) -> Result<DecodedFrame, SourceError> {
        (**self).decode(handle, frame_index).await
    }

    async fn invalidate(&self, identifier: &str) {
        (**self).invalidate(identifier).await
    }

    async fn invalidate_all(&self) {
        (**self).invalidate_all().await
    }
}

// =============================================================================
// Tests
// =============================================================================

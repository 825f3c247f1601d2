//! # Video Slide
//!
//! Read video files the way whole-slide image viewers read slides.
//!
//! A video is exposed as a single-level virtual slide with a time axis: callers
//! ask for a pixel rectangle of one frame and always get back a canvas of
//! exactly the requested size. Parts of the window outside the frame, and
//! whole frames that fail to decode, come back fully transparent.
//!
//! ## Features
//!
//! - **Region reads**: Unscaled windows that may hang off any edge of the frame
//! - **Frame selection**: Out-of-range frame indices are clamped, never rejected
//! - **Time axis**: Frame ↔ time conversion and per-frame labels for viewers
//! - **Caching**: Opened videos and decoded frames are kept in LRU caches
//! - **ffmpeg backend**: Properties via ffprobe, frames via ffmpeg subprocesses
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`source`] - Frame source trait, ffmpeg implementation and frame cache
//! - [`region`] - Region requests, geometry and the video slide reader
//! - [`timeline`] - Time ↔ frame conversion and frame descriptors
//! - [`registry`] - Cache of opened videos
//! - [`export`] - PNG encoding and the region service
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use video_slide::{FfmpegFrameSource, RegionRequest, VideoSlide};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = Arc::new(FfmpegFrameSource::new());
//!     let slide = VideoSlide::open(source, "cells.mp4").await.unwrap();
//!
//!     // 512x512 window starting left of the frame, on frame 42
//!     let request = RegionRequest::new(-100, 0, 512, 512).with_frame(42);
//!     let canvas = slide.read_region(&request).await.unwrap();
//!     assert_eq!(canvas.dimensions(), (512, 512));
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod region;
pub mod registry;
pub mod source;
pub mod timeline;

// Re-export commonly used types
pub use config::{Cli, Command, DecoderConfig};
pub use error::{ExportError, RegionError, SourceError};
pub use export::{PngRegionEncoder, RegionResponse, RegionService, VideoMetadata};
pub use region::{
    Canvas, LevelInfo, RegionReadable, RegionRequest, VideoSlide, VisibleRect, VIDEO_LEVEL_COUNT,
};
pub use registry::VideoRegistry;
pub use source::{
    CachedFrameSource, CodecTag, DecodedFrame, FfmpegFrameSource, FrameCache, FrameSource,
    FrameType, PixelOrder, VideoHandle, VideoProperties,
};
pub use timeline::{frame_descriptors, frame_to_time, time_to_frame, FrameDescriptors};

//! Configuration management for the video slide tool.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `VSLIDE_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use video_slide::config::Cli;
//!
//! let cli = Cli::parse();
//! cli.decoder.validate()?;
//! let source = cli.decoder.build_source();
//! ```
//!
//! # Environment Variables
//!
//! Decoder settings can be set via environment variables with the `VSLIDE_` prefix:
//!
//! - `VSLIDE_FFMPEG` - ffmpeg executable (default: ffmpeg)
//! - `VSLIDE_FFPROBE` - ffprobe executable (default: ffprobe)
//! - `VSLIDE_DECODE_TIMEOUT_MS` - Per-frame decode timeout, 0 disables (default: 30000)
//! - `VSLIDE_CACHE_FRAMES` - Decoded frame cache size in bytes, 0 disables (default: 256MB)
//! - `VSLIDE_CACHE_VIDEOS` - Max opened videos to keep (default: 32)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::region::RegionRequest;
use crate::registry::DEFAULT_VIDEO_CACHE_CAPACITY;
use crate::source::{FfmpegFrameSource, DEFAULT_DECODE_TIMEOUT, DEFAULT_FRAME_CACHE_CAPACITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default ffmpeg executable, resolved through `PATH`.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Default ffprobe executable, resolved through `PATH`.
pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// Default bound of the thumbnail's longer side.
pub const DEFAULT_THUMBNAIL_DIMENSION: u32 = 256;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Video Slide - read videos as single-level virtual slides.
///
/// Inspects videos and exports rectangular regions of single frames as PNG,
/// decoding through ffmpeg.
#[derive(Parser, Debug, Clone)]
#[command(name = "video-slide")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub decoder: DecoderConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Split into decoder settings and the command to run.
    pub fn into_parts(self) -> (DecoderConfig, Command) {
        (self.decoder, self.command)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print video properties and level metadata
    Info(InfoArgs),

    /// Export a region of one frame as PNG
    Export(ExportArgs),

    /// Export a downscaled full frame as PNG
    Thumbnail(ThumbnailArgs),
}

// =============================================================================
// Decoder Configuration
// =============================================================================

/// Settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct DecoderConfig {
    /// ffmpeg executable used to decode frames.
    #[arg(long, global = true, default_value = DEFAULT_FFMPEG, env = "VSLIDE_FFMPEG")]
    pub ffmpeg: PathBuf,

    /// ffprobe executable used to read video properties.
    #[arg(long, global = true, default_value = DEFAULT_FFPROBE, env = "VSLIDE_FFPROBE")]
    pub ffprobe: PathBuf,

    /// Per-frame decode timeout in milliseconds (0 disables the timeout).
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_DECODE_TIMEOUT.as_millis() as u64,
        env = "VSLIDE_DECODE_TIMEOUT_MS"
    )]
    pub decode_timeout_ms: u64,

    /// Decoded frame cache size in bytes (0 disables the cache).
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_FRAME_CACHE_CAPACITY,
        env = "VSLIDE_CACHE_FRAMES"
    )]
    pub cache_frames: usize,

    /// Maximum number of opened videos to keep.
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_VIDEO_CACHE_CAPACITY,
        env = "VSLIDE_CACHE_VIDEOS"
    )]
    pub cache_videos: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl DecoderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.ffmpeg.as_os_str().is_empty() {
            return Err("ffmpeg path is empty. Set --ffmpeg or VSLIDE_FFMPEG".to_string());
        }
        if self.ffprobe.as_os_str().is_empty() {
            return Err("ffprobe path is empty. Set --ffprobe or VSLIDE_FFPROBE".to_string());
        }
        if self.cache_videos == 0 {
            return Err("cache_videos must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Decode timeout, or `None` when disabled.
    pub fn decode_timeout(&self) -> Option<Duration> {
        (self.decode_timeout_ms > 0).then(|| Duration::from_millis(self.decode_timeout_ms))
    }

    /// Whether decoded frames should be cached.
    pub fn frame_cache_enabled(&self) -> bool {
        self.cache_frames > 0
    }

    /// Build the ffmpeg-backed frame source described by this configuration.
    pub fn build_source(&self) -> FfmpegFrameSource {
        FfmpegFrameSource::with_binaries(&self.ffmpeg, &self.ffprobe)
            .with_decode_timeout(self.decode_timeout())
    }
}

// =============================================================================
// Command Arguments
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// Path or URL of the video
    pub video: String,

    /// Also list the label of every frame
    #[arg(long, default_value_t = false)]
    pub descriptors: bool,

    /// Print metadata as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Path or URL of the video
    pub video: String,

    /// Left edge of the region (may be negative)
    #[arg(long, allow_negative_numbers = true)]
    pub x: i64,

    /// Top edge of the region (may be negative)
    #[arg(long, allow_negative_numbers = true)]
    pub y: i64,

    /// Region width in pixels
    #[arg(long, allow_negative_numbers = true)]
    pub width: i64,

    /// Region height in pixels
    #[arg(long, allow_negative_numbers = true)]
    pub height: i64,

    /// Frame index (clamped into range)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub frame: i64,

    /// Time offset in seconds, converted to a frame index
    #[arg(long, conflicts_with = "frame")]
    pub time: Option<f64>,

    /// Output PNG file
    #[arg(short, long)]
    pub out: PathBuf,
}

impl ExportArgs {
    /// Region request for `frame`.
    pub fn request(&self, frame: i64) -> RegionRequest {
        RegionRequest::new(self.x, self.y, self.width, self.height).with_frame(frame)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ThumbnailArgs {
    /// Path or URL of the video
    pub video: String,

    /// Bound of the thumbnail's longer side in pixels
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_DIMENSION)]
    pub max_dimension: u32,

    /// Output PNG file
    #[arg(short, long)]
    pub out: PathBuf,
}

// =============================================================================
// Tests
// =============================================================================

use thiserror::Error;

/// Errors raised by a frame source while opening or decoding a video.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The identifier does not resolve to an existing resource
    #[error("Video not found: {0}")]
    NotFound(String),

    /// The resource exists but cannot be opened as a video
    #[error("Cannot open video {identifier}: {reason}")]
    Open { identifier: String, reason: String },

    /// Probe output could not be interpreted
    #[error("Invalid probe output: {0}")]
    Probe(String),

    /// Frame index outside `[0, frame_count)`
    #[error("Frame {frame} out of range: video has {frame_count} frames")]
    FrameOutOfRange { frame: u64, frame_count: u64 },

    /// A single frame could not be decoded
    #[error("Failed to decode frame {frame}: {reason}")]
    Decode { frame: u64, reason: String },

    /// Decoding did not finish in time
    #[error("Decoding frame {frame} timed out after {timeout_ms}ms")]
    Timeout { frame: u64, timeout_ms: u64 },
}

impl SourceError {
    /// Whether this error concerns a single frame rather than the whole video.
    ///
    /// Region reads recover every decode error as a transparent canvas, but only
    /// frame-level errors are expected there; the rest are logged as errors.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            SourceError::FrameOutOfRange { .. }
                | SourceError::Decode { .. }
                | SourceError::Timeout { .. }
        )
    }
}

/// Errors surfaced to callers of a region read.
///
/// Per-frame decode failures never appear here; they degrade to a transparent canvas.
#[derive(Debug, Clone, Error)]
pub enum RegionError {
    /// Only level 0 (full frame resolution) exists
    #[error("Unsupported level {level}: video slides have {level_count} level(s)")]
    UnsupportedLevel { level: usize, level_count: usize },

    /// A size component is negative
    #[error("Invalid region size {width}x{height}: size must be non-negative")]
    InvalidSize { width: i64, height: i64 },

    /// Requested size does not fit in a canvas
    #[error("Region size {width}x{height} exceeds the maximum canvas dimension")]
    SizeTooLarge { width: i64, height: i64 },
}

/// Errors from the export layer (registry lookup, region read, PNG encoding).
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    /// No video with this identifier
    #[error("Video not found: {video_id}")]
    VideoNotFound { video_id: String },

    /// The video could not be opened
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The region request was malformed
    #[error("Region error: {0}")]
    Region(#[from] RegionError),

    /// Invalid thumbnail bound
    #[error("Invalid thumbnail dimension {max_dimension}: must be greater than 0")]
    InvalidDimension { max_dimension: u32 },

    /// PNG encoding failed
    #[error("Failed to encode region: {message}")]
    Encode { message: String },
}

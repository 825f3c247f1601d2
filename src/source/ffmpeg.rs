//! ffmpeg-backed frame source.
//!
//! Videos are opened with `ffprobe` and frames are decoded by spawning one
//! `ffmpeg` process per frame that writes a single `bgr24` rawvideo frame to
//! stdout.
//!
//! # Resource Scope
//!
//! Every decode owns its process for exactly the duration of the call. The
//! child is spawned with `kill_on_drop`, so it is reaped on every exit path:
//! success, decode error, and timeout (the timed-out future is dropped along
//! with the child). No decoder state is shared between calls, which makes the
//! source safe to use from any number of concurrent tasks.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::SourceError;
use crate::timeline;

use super::probe::parse_probe_output;
use super::{DecodedFrame, FrameSource, PixelOrder, VideoHandle};

/// Default upper bound for a single frame decode.
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Frame source that shells out to `ffprobe` and `ffmpeg`.
///
/// # Example
///
/// ```ignore
/// use video_slide::source::{FfmpegFrameSource, FrameSource};
///
/// let source = FfmpegFrameSource::new();
/// let handle = source.open("clips/cells.mp4").await?;
/// let frame = source.decode(&handle, 42).await?;
/// assert_eq!(frame.width, handle.width());
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    decode_timeout: Option<Duration>,
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegFrameSource {
    /// Use `ffmpeg` and `ffprobe` from `PATH` with the default timeout.
    pub fn new() -> Self {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    /// Use explicit tool locations.
    pub fn with_binaries(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            decode_timeout: Some(DEFAULT_DECODE_TIMEOUT),
        }
    }

    /// Set the per-frame decode timeout (`None` waits indefinitely).
    pub fn with_decode_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.decode_timeout = timeout;
        self
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe(&self) -> &Path {
        &self.ffprobe
    }

    pub fn decode_timeout(&self) -> Option<Duration> {
        self.decode_timeout
    }
}

/// Identifiers with a scheme (`http://`, `rtsp://`, ...) are passed to ffmpeg as-is.
fn is_local_path(identifier: &str) -> bool {
    !identifier.contains("://")
}

fn probe_args(input: &str) -> Vec<String> {
    [
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_streams",
        "-show_format",
        "-of",
        "json",
        input,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Arguments that make ffmpeg print exactly one bgr24 frame on stdout.
///
/// With a known frame rate the input is seeked to the frame's timestamp;
/// otherwise frames are counted with the `select` filter. Rotation metadata is
/// ignored so the output keeps the coded width and height reported by ffprobe.
fn decode_args(input: &str, frame: u64, fps: f64) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostdin",
        "-noautorotate",
    ]
    .iter()
        .map(|s| s.to_string())
        .collect();

    if fps > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{:.6}", timeline::frame_to_time(fps, frame)));
        args.push("-i".to_string());
        args.push(input.to_string());
    } else {
        args.push("-i".to_string());
        args.push(input.to_string());
        args.push("-vf".to_string());
        args.push(format!("select=eq(n\\,{})", frame));
        args.push("-vsync".to_string());
        args.push("0".to_string());
    }

    args.extend(
        [
            "-map", "0:v:0", "-frames:v", "1", "-an", "-f", "rawvideo", "-pix_fmt", "bgr24", "-",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args
}

fn stderr_summary(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "no diagnostic output".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn open(&self, identifier: &str) -> Result<VideoHandle, SourceError> {
        if is_local_path(identifier) && tokio::fs::metadata(identifier).await.is_err() {
            return Err(SourceError::NotFound(identifier.to_string()));
        }

        let output = Command::new(&self.ffprobe)
            .args(probe_args(identifier))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SourceError::Open {
                identifier: identifier.to_string(),
                reason: format!("cannot run {}: {}", self.ffprobe.display(), e),
            })?;

        if !output.status.success() {
            return Err(SourceError::Open {
                identifier: identifier.to_string(),
                reason: stderr_summary(&output.stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let properties = parse_probe_output(&stdout).map_err(|e| SourceError::Open {
            identifier: identifier.to_string(),
            reason: e.to_string(),
        })?;

        debug!(
            identifier,
            width = properties.width,
            height = properties.height,
            frames = properties.frame_count,
            fps = properties.fps,
            codec = %properties.codec,
            "opened video"
        );

        Ok(VideoHandle::new(identifier, properties))
    }

    async fn decode(
        &self,
        handle: &VideoHandle,
        frame_index: u64,
    ) -> Result<DecodedFrame, SourceError> {
        let frame_count = handle.frame_count();
        if frame_index >= frame_count {
            return Err(SourceError::FrameOutOfRange {
                frame: frame_index,
                frame_count,
            });
        }

        let (width, height) = handle.dimensions();
        let expected = width as usize * height as usize * 3;
        if expected == 0 {
            return Err(SourceError::Decode {
                frame: frame_index,
                reason: "video has zero-area frames".to_string(),
            });
        }

        let child = Command::new(&self.ffmpeg)
            .args(decode_args(handle.identifier(), frame_index, handle.fps()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::Decode {
                frame: frame_index,
                reason: format!("cannot run {}: {}", self.ffmpeg.display(), e),
            })?;

        let run = child.wait_with_output();
        let result = match self.decode_timeout {
            Some(timeout) => tokio::time::timeout(timeout, run).await.map_err(|_| {
                SourceError::Timeout {
                    frame: frame_index,
                    timeout_ms: timeout.as_millis() as u64,
                }
            })?,
            None => run.await,
        };

        let output = result.map_err(|e| SourceError::Decode {
            frame: frame_index,
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(SourceError::Decode {
                frame: frame_index,
                reason: stderr_summary(&output.stderr),
            });
        }

        let mut data = output.stdout;
        if data.len() < expected {
            return Err(SourceError::Decode {
                frame: frame_index,
                reason: format!("expected {} bytes, got {}", expected, data.len()),
            });
        }
        data.truncate(expected);

        debug!(
            identifier = handle.identifier(),
            frame = frame_index,
            "decoded frame"
        );

        Ok(DecodedFrame::new(width, height, PixelOrder::Bgr, data))
    }
}

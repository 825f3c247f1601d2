//! Time axis of a video slide.
//!
//! Converts between frame indices and time offsets and produces the per-frame
//! labels shown by slide viewers (`"0.00"`, `"0.04"`, ...).
//!
//! A frame rate that is not positive is tolerated: every conversion then
//! reports time 0 and frame 0 instead of dividing by zero.

use crate::source::VideoProperties;

/// Tolerance (in frames) absorbed before flooring a time to a frame index.
///
/// `frame / fps * fps` can land a hair below `frame` in floating point; the
/// tolerance keeps `time_to_frame(frame_to_time(f)) == f`.
const FRAME_EPSILON: f64 = 1e-6;

/// Start time of `frame` in seconds, or 0 when `fps <= 0`.
pub fn frame_to_time(fps: f64, frame: u64) -> f64 {
    if fps > 0.0 {
        frame as f64 / fps
    } else {
        0.0
    }
}

/// Frame shown at `seconds`, clamped to `[0, frame_count - 1]`.
///
/// Negative, NaN and pre-start times map to frame 0, as does any time when the
/// video has no frames or no positive frame rate.
pub fn time_to_frame(fps: f64, frame_count: u64, seconds: f64) -> u64 {
    if frame_count == 0 || fps <= 0.0 {
        return 0;
    }
    let position = (seconds * fps + FRAME_EPSILON).floor();
    if position.is_nan() || position < 0.0 {
        return 0;
    }
    // `as` saturates for values beyond u64::MAX
    (position as u64).min(frame_count - 1)
}

/// Length of the video in seconds, or 0 when `fps <= 0`.
pub fn duration(frame_count: u64, fps: f64) -> f64 {
    frame_to_time(fps, frame_count)
}

/// Clamp a requested frame index into `[0, frame_count - 1]`.
///
/// A video without frames clamps everything to 0; decoding that frame then
/// fails and the region read degrades to a transparent canvas.
pub fn clamp_frame(frame: i64, frame_count: u64) -> u64 {
    if frame <= 0 || frame_count == 0 {
        return 0;
    }
    (frame as u64).min(frame_count - 1)
}

/// Label of `frame`: its start time in seconds with two decimals.
pub fn frame_label(fps: f64, frame: u64) -> String {
    format!("{:.2}", frame_to_time(fps, frame))
}

/// Lazily produce one label per frame, in frame order.
pub fn frame_descriptors(properties: &VideoProperties) -> FrameDescriptors {
    FrameDescriptors {
        fps: properties.fps,
        next: 0,
        end: properties.frame_count,
    }
}

/// Iterator over frame labels.
///
/// Clone it to restart from the current position; the labels are a pure
/// function of the video properties.
#[derive(Debug, Clone)]
pub struct FrameDescriptors {
    fps: f64,
    next: u64,
    end: u64,
}

impl Iterator for FrameDescriptors {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.next >= self.end {
            return None;
        }
        let label = frame_label(self.fps, self.next);
        self.next += 1;
        Some(label)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<String> {
        self.next = self.next.saturating_add(n as u64).min(self.end);
        self.next()
    }
}

impl ExactSizeIterator for FrameDescriptors {}

impl DoubleEndedIterator for FrameDescriptors {
    fn next_back(&mut self) -> Option<String> {
        if self.next >= self.end {
            return None;
        }
        self.end -= 1;
        Some(frame_label(self.fps, self.end))
    }
}

impl std::iter::FusedIterator for FrameDescriptors {}

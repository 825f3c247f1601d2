//! ffprobe output parsing.
//!
//! `ffprobe -show_streams -show_format -of json` reports most numeric fields
//! as strings; this module turns that output into [`VideoProperties`].

use serde::Deserialize;

use crate::error::SourceError;

use super::{CodecTag, VideoProperties};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    streams: Option<Vec<ProbeStream>>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_tag_string: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Parse ffprobe JSON into video properties.
///
/// The first stream with `codec_type == "video"` is used. The frame count
/// comes from `nb_frames` when present, otherwise from `duration * fps`.
pub fn parse_probe_output(json: &str) -> Result<VideoProperties, SourceError> {
    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| SourceError::Probe(e.to_string()))?;

    let stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or_else(|| SourceError::Probe("no video stream".to_string()))?;

    let width = stream
        .width
        .ok_or_else(|| SourceError::Probe("video stream has no width".to_string()))?;
    let height = stream
        .height
        .ok_or_else(|| SourceError::Probe("video stream has no height".to_string()))?;

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .filter(|r| *r > 0.0)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<u64>().ok())
        .or_else(|| {
            let duration = stream
                .duration
                .as_deref()
                .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))?
                .trim()
                .parse::<f64>()
                .ok()?;
            let frames = (duration * fps).round();
            (frames.is_finite() && frames >= 0.0).then_some(frames as u64)
        })
        .unwrap_or(0);

    let codec = stream
        .codec_tag_string
        .as_deref()
        .filter(|t| is_printable_tag(t))
        .or(stream.codec_name.as_deref())
        .map(CodecTag::from_str_lossy)
        .unwrap_or(CodecTag::UNKNOWN);

    Ok(VideoProperties {
        width,
        height,
        frame_count,
        fps,
        codec,
    })
}

/// Parse a frame rate string (`"30/1"`, `"30000/1001"` or `"29.97"`).
///
/// A zero denominator yields `Some(0.0)` (ffprobe reports `"0/0"` for unknown
/// rates); malformed input yields `None`.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let rate = rate.trim();
    if let Some((num, den)) = rate.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            return Some(0.0);
        }
        return Some(num / den);
    }
    rate.parse().ok()
}

/// ffprobe prints untagged streams as `[0][0][0][0]`.
fn is_printable_tag(tag: &str) -> bool {
    tag.len() == 4 && tag.bytes().all(|b| b.is_ascii_graphic() || b == b' ')
}

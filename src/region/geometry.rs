//! Viewport geometry and compositing.
//!
//! A region request is a window `[x, x + w) × [y, y + h)` in frame pixel
//! coordinates that may hang off any edge of the frame. The part of the frame
//! seen through that window is copied, unscaled, onto a `w × h` canvas whose
//! remaining pixels stay fully transparent.
//!
//! ```text
//!   x < 0                         canvas (w × h)
//!   ┌──────────────────────┐      ┌──────────────────────┐
//!   │      ┌───────────────┼─┐    │░░░░┌─────────────────┤
//!   │      │   visible     │ │ →  │░░░░│  copied pixels  │
//!   │      │   rectangle   │ │    │░░░░│                 │
//!   └──────┼───────────────┘ │    │░░░░└─────────────────┤
//!          │ frame           │    │░░░░░░░ transparent ░░│
//!          └─────────────────┘    └──────────────────────┘
//! ```

use image::RgbaImage;

use crate::source::DecodedFrame;

use super::Canvas;

/// Portion of the frame visible through a request window.
///
/// `src_*` are frame coordinates (half-open), `dst_*` the canvas offset the
/// visible pixels are pasted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRect {
    pub src_x1: i64,
    pub src_y1: i64,
    pub src_x2: i64,
    pub src_y2: i64,
    pub dst_x1: i64,
    pub dst_y1: i64,
}

impl VisibleRect {
    /// Number of visible columns.
    pub fn width(&self) -> i64 {
        (self.src_x2 - self.src_x1).max(0)
    }

    /// Number of visible rows.
    pub fn height(&self) -> i64 {
        (self.src_y2 - self.src_y1).max(0)
    }

    /// True when no frame pixel is visible.
    pub fn is_empty(&self) -> bool {
        self.src_x2 <= self.src_x1 || self.src_y2 <= self.src_y1
    }
}

/// Intersect the window `(x, y, w, h)` with a `img_w × img_h` frame.
///
/// Sizes must already be validated as non-negative.
pub fn visible_rect(img_w: i64, img_h: i64, x: i64, y: i64, w: i64, h: i64) -> VisibleRect {
    VisibleRect {
        src_x1: x.clamp(0, img_w),
        src_y1: y.clamp(0, img_h),
        src_x2: x.saturating_add(w).clamp(0, img_w),
        src_y2: y.saturating_add(h).clamp(0, img_h),
        dst_x1: x.saturating_neg().max(0),
        dst_y1: y.saturating_neg().max(0),
    }
}

/// A fully transparent `width × height` canvas.
pub fn transparent_canvas(width: u32, height: u32) -> Canvas {
    RgbaImage::new(width, height)
}

/// Paste the visible part of `frame` onto a transparent `width × height` canvas.
///
/// Pixels are converted from the frame's 3-channel order to RGBA with full
/// opacity; nothing is resampled. A frame whose buffer is shorter than its
/// dimensions, or a rectangle reaching outside the frame, yields the
/// transparent canvas.
pub fn composite(frame: &DecodedFrame, rect: &VisibleRect, width: u32, height: u32) -> Canvas {
    let mut canvas = transparent_canvas(width, height);
    if rect.is_empty() || !frame.is_complete() || !within_frame(frame, rect) {
        return canvas;
    }

    // The window bounds the visible rectangle, but clip anyway so a frame
    // larger than the handle advertised can never write out of the canvas.
    let cols = rect.width().min(i64::from(width) - rect.dst_x1);
    let rows = rect.height().min(i64::from(height) - rect.dst_y1);
    if cols <= 0 || rows <= 0 {
        return canvas;
    }

    let canvas_stride = width as usize * 4;
    let buffer: &mut [u8] = &mut canvas;
    for row in 0..rows {
        let src_y = (rect.src_y1 + row) as u32;
        let dst_row = (rect.dst_y1 + row) as usize;
        let row_start = dst_row * canvas_stride + rect.dst_x1 as usize * 4;
        let dst = &mut buffer[row_start..row_start + cols as usize * 4];

        for (col, px) in dst.chunks_exact_mut(4).enumerate() {
            let src_x = (rect.src_x1 + col as i64) as u32;
            let [r, g, b] = frame.rgb_at(src_x, src_y);
            px.copy_from_slice(&[r, g, b, u8::MAX]);
        }
    }

    canvas
}

fn within_frame(frame: &DecodedFrame, rect: &VisibleRect) -> bool {
    rect.src_x1 >= 0
        && rect.src_y1 >= 0
        && rect.src_x2 <= i64::from(frame.width)
        && rect.src_y2 <= i64::from(frame.height)
        && rect.dst_x1 >= 0
        && rect.dst_y1 >= 0
}

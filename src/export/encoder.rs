//! PNG region encoder.
//!
//! Region canvases carry transparency outside the frame, so they are encoded
//! losslessly as 8-bit RGBA PNG.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};

use crate::error::ExportError;
use crate::region::Canvas;

// =============================================================================
// PNG Encoder
// =============================================================================

/// Encoder turning region canvases into PNG bytes.
///
/// # Example
///
/// ```ignore
/// use video_slide::export::PngRegionEncoder;
///
/// let encoder = PngRegionEncoder::new();
/// let png = encoder.encode(&canvas)?;
/// std::fs::write("region.png", &png)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PngRegionEncoder {
    compression: CompressionType,
}

impl Default for PngRegionEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PngRegionEncoder {
    /// Create an encoder with default compression.
    pub fn new() -> Self {
        Self {
            compression: CompressionType::Default,
        }
    }

    /// Create an encoder favouring speed over output size.
    pub fn fast() -> Self {
        Self {
            compression: CompressionType::Fast,
        }
    }

    /// Encode `canvas` as RGBA PNG.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Encode`] for an empty canvas (PNG has no
    /// zero-sized images) or when the underlying encoder fails.
    pub fn encode(&self, canvas: &Canvas) -> Result<Bytes, ExportError> {
        let (width, height) = canvas.dimensions();
        if width == 0 || height == 0 {
            return Err(ExportError::Encode {
                message: format!("cannot encode empty {}x{} canvas", width, height),
            });
        }

        let mut output = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut output, self.compression, FilterType::Adaptive);
        encoder
            .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| ExportError::Encode {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }

    /// Get PNG dimensions without fully decoding.
    pub fn dimensions(&self, source: &[u8]) -> Result<(u32, u32), ExportError> {
        let reader = ImageReader::with_format(Cursor::new(source), ImageFormat::Png);
        reader.into_dimensions().map_err(|e| ExportError::Encode {
            message: e.to_string(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

// File: crates/export-core/src/encode.rs
// Summary: PNG/JPEG byte encoding of rasterized charts and data-URL rendering.

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::bitmap::Bitmap;
use crate::error::{ExportError, Result};
use crate::request::Color;

/// Encoder quality used when a JPEG request carries none.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.92;

pub fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            bitmap.pixels(),
            bitmap.width(),
            bitmap.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ExportError::EncodingFailed(format!("png: {e}")))?;
    Ok(out)
}

/// Map a `0..=1` quality factor onto the encoder's `1..=100` scale.
pub fn jpeg_quality_percent(quality: f32) -> u8 {
    if !quality.is_finite() {
        return (DEFAULT_JPEG_QUALITY * 100.0).round() as u8;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// JPEG has no alpha channel; transparent pixels are composited onto `background` first.
pub fn encode_jpeg(bitmap: &Bitmap, quality: f32, background: Color) -> Result<Vec<u8>> {
    let rgb = bitmap.flatten_rgb(background);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, jpeg_quality_percent(quality))
        .write_image(&rgb, bitmap.width(), bitmap.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ExportError::EncodingFailed(format!("jpeg: {e}")))?;
    Ok(out)
}

/// `data:<mime>;base64,<payload>`
pub fn data_url(bytes: &[u8], mime: &str) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, b64)
}

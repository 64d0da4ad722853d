// File: crates/export-core/src/raster.rs
// Summary: Rasterization seam: turn a renderable region into an RGBA bitmap.

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::request::Color;

/// Scale the PDF path never goes below, whatever the caller asked for.
pub const MIN_PDF_SCALE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterOptions {
    /// Painted first; charts are often transparent.
    pub background: Color,
    /// Device pixels per logical pixel.
    pub scale: f32,
    /// Allow externally sourced imagery inside the region (CORS / tainted content).
    pub allow_cross_origin: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self { background: Color::WHITE, scale: 1.0, allow_cross_origin: true }
    }
}

/// Renders an element of type `E` to pixels.
///
/// Implementations may yield while painting; the engine awaits each call to
/// completion and bounds it with its rasterize timeout.
#[allow(async_fn_in_trait)]
pub trait Rasterize<E: ?Sized> {
    async fn rasterize(&self, element: &E, opts: &RasterOptions) -> Result<Bitmap>;
}

// File: crates/export-core/src/bitmap.rs
// Summary: RGBA8 pixel buffer produced by the rasterization primitive.

use crate::error::{ExportError, Result};
use crate::request::Color;

/// Straight-alpha RGBA8 pixels, row-major, tightly packed (stride = width * 4).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Validate a rasterizer's output. Zero-sized or short buffers are unusable.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ExportError::RasterizationFailed(format!(
                "empty bitmap {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ExportError::RasterizationFailed(format!(
                "bitmap {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Solid bitmap, mostly useful for tests and placeholders.
    pub fn filled(width: u32, height: u32, color: Color) -> Result<Self> {
        let px = [color.r, color.g, color.b, color.a];
        let pixels = px.repeat(width as usize * height as usize);
        Self::from_rgba8(width, height, pixels)
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn pixels(&self) -> &[u8] { &self.pixels }
    pub fn stride(&self) -> usize { self.width as usize * 4 }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.stride() + x as usize * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Composite onto an opaque background and drop alpha (RGB8 output).
    pub fn flatten_rgb(&self, background: Color) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.pixels.chunks_exact(4) {
            let a = px[3] as u32;
            let blend = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
            out.push(blend(px[0], background.r));
            out.push(blend(px[1], background.g));
            out.push(blend(px[2], background.b));
        }
        out
    }

    /// Keep the top `rows` rows. Clipping a tall image for a page never rescales it.
    pub fn top_rows(&self, rows: u32) -> Bitmap {
        let rows = rows.clamp(1, self.height);
        let len = rows as usize * self.stride();
        Bitmap { width: self.width, height: rows, pixels: self.pixels[..len].to_vec() }
    }
}

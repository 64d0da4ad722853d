// File: crates/export-core/src/pdf.rs
// Summary: Single-page PDF composition (A4 layout math) and the PDF primitive seam.
// Notes:
// - All coordinates are millimetres from the page's top-left corner; text y is the baseline.
// - Backends convert to their own units (skia works in points).

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::request::Color;

/// A4 short edge, mm.
pub const A4_SHORT_MM: f32 = 210.0;
/// A4 long edge, mm.
pub const A4_LONG_MM: f32 = 297.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

impl PageOrientation {
    /// Landscape only when the bitmap is strictly wider than tall.
    pub fn for_bitmap(width: u32, height: u32) -> Self {
        if width > height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    pub fn a4(orientation: PageOrientation) -> Self {
        match orientation {
            PageOrientation::Portrait => Self { width_mm: A4_SHORT_MM, height_mm: A4_LONG_MM },
            PageOrientation::Landscape => Self { width_mm: A4_LONG_MM, height_mm: A4_SHORT_MM },
        }
    }
}

/// Fixed offsets and font sizes for the export page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfLayoutConfig {
    pub side_margin_mm: f32,
    pub bottom_margin_mm: f32,
    pub image_top_mm: f32,
    pub title_y_mm: f32,
    pub title_size_pt: f32,
    pub subtitle_y_mm: f32,
    pub subtitle_size_pt: f32,
    pub title_color: Color,
    pub subtitle_color: Color,
}

impl Default for PdfLayoutConfig {
    fn default() -> Self {
        Self {
            side_margin_mm: 10.0,
            bottom_margin_mm: 10.0,
            image_top_mm: 30.0,
            title_y_mm: 15.0,
            title_size_pt: 16.0,
            subtitle_y_mm: 22.0,
            subtitle_size_pt: 10.0,
            title_color: Color::rgb(0x1f, 0x29, 0x37),
            subtitle_color: Color::rgb(0x6b, 0x72, 0x80),
        }
    }
}

/// A line of text centered on `center_x_mm`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextPlacement {
    pub text: String,
    pub center_x_mm: f32,
    pub baseline_y_mm: f32,
    pub size_pt: f32,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePlacement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    /// Share of the bitmap's rows (from the top) that fit on the page. 1.0 when nothing is clipped.
    pub visible_fraction: f32,
}

impl ImagePlacement {
    pub fn is_clipped(&self) -> bool {
        self.visible_fraction < 1.0
    }

    pub fn visible_rows(&self, bitmap_height: u32) -> u32 {
        ((bitmap_height as f32 * self.visible_fraction).round() as u32).clamp(1, bitmap_height.max(1))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PdfPageLayout {
    pub orientation: PageOrientation,
    pub page: PageSize,
    pub title: TextPlacement,
    pub subtitle: TextPlacement,
    pub image: ImagePlacement,
}

impl PdfPageLayout {
    pub fn compute(
        bitmap_width: u32,
        bitmap_height: u32,
        cfg: &PdfLayoutConfig,
        title: &str,
        subtitle: &str,
    ) -> Self {
        let orientation = PageOrientation::for_bitmap(bitmap_width, bitmap_height);
        let page = PageSize::a4(orientation);
        let center = page.width_mm / 2.0;

        let width_mm = (page.width_mm - 2.0 * cfg.side_margin_mm).max(1.0);
        let natural_height = width_mm * bitmap_height.max(1) as f32 / bitmap_width.max(1) as f32;
        let max_height = (page.height_mm - cfg.image_top_mm - cfg.bottom_margin_mm).max(1.0);
        let (height_mm, visible_fraction) = if natural_height > max_height {
            (max_height, max_height / natural_height)
        } else {
            (natural_height, 1.0)
        };

        Self {
            orientation,
            page,
            title: TextPlacement {
                text: title.to_string(),
                center_x_mm: center,
                baseline_y_mm: cfg.title_y_mm,
                size_pt: cfg.title_size_pt,
                color: cfg.title_color,
            },
            subtitle: TextPlacement {
                text: subtitle.to_string(),
                center_x_mm: center,
                baseline_y_mm: cfg.subtitle_y_mm,
                size_pt: cfg.subtitle_size_pt,
                color: cfg.subtitle_color,
            },
            image: ImagePlacement {
                x_mm: cfg.side_margin_mm,
                y_mm: cfg.image_top_mm,
                width_mm,
                height_mm,
                visible_fraction,
            },
        }
    }
}

/// Page-layout primitive: one document, pages with text and images, serialized at the end.
pub trait PdfDocument: Send + 'static {
    fn begin_page(&mut self, orientation: PageOrientation, page: PageSize) -> Result<()>;
    fn place_text(&mut self, text: &TextPlacement) -> Result<()>;
    /// Draw `bitmap` stretched to exactly fill the placement box.
    fn place_image(&mut self, bitmap: &Bitmap, placement: &ImagePlacement) -> Result<()>;
    fn finish(self) -> Result<Vec<u8>>;
}

pub trait PdfBackend {
    type Document: PdfDocument;

    fn create(&self, title: &str) -> Result<Self::Document>;
}

/// Lay out one export page into `doc`. Tall bitmaps are cropped to the rows that fit.
pub fn compose_page<D: PdfDocument>(doc: &mut D, bitmap: &Bitmap, layout: &PdfPageLayout) -> Result<()> {
    doc.begin_page(layout.orientation, layout.page)?;
    doc.place_text(&layout.title)?;
    doc.place_text(&layout.subtitle)?;
    if layout.image.is_clipped() {
        let visible = bitmap.top_rows(layout.image.visible_rows(bitmap.height()));
        doc.place_image(&visible, &layout.image)
    } else {
        doc.place_image(bitmap, &layout.image)
    }
}

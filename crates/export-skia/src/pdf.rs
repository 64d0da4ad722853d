// File: crates/export-skia/src/pdf.rs
// Summary: PDF backend on skia's PDF document writer.
// Notes:
// - Skia's document borrows its output stream, so pages are recorded as owned ops and
//   replayed into a fresh writer on `finish`. The recorded document is Send and can be
//   finished on the blocking pool.
// - Layout arrives in millimetres; skia PDF canvases work in points.

use chart_export::pdf::{ImagePlacement, PageOrientation, PageSize, TextPlacement};
use chart_export::{Bitmap, ExportError, PdfBackend, PdfDocument};
use log::debug;
use skia_safe as skia;

use crate::text::TextShaper;
use crate::theme::to_skia;

type Result<T> = chart_export::error::Result<T>;

pub const PT_PER_MM: f32 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

#[derive(Clone, Debug)]
pub struct SkiaPdf {
    creator: String,
}

impl Default for SkiaPdf {
    fn default() -> Self {
        Self { creator: "chart-export".to_string() }
    }
}

impl SkiaPdf {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PdfBackend for SkiaPdf {
    type Document = SkiaPdfDocument;

    fn create(&self, title: &str) -> Result<SkiaPdfDocument> {
        Ok(SkiaPdfDocument { title: title.to_string(), creator: self.creator.clone(), pages: Vec::new() })
    }
}

enum PageOp {
    Text(TextPlacement),
    Image { bitmap: Bitmap, placement: ImagePlacement },
}

struct Page {
    size: PageSize,
    ops: Vec<PageOp>,
}

pub struct SkiaPdfDocument {
    title: String,
    creator: String,
    pages: Vec<Page>,
}

impl SkiaPdfDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current(&mut self) -> Result<&mut Page> {
        self.pages
            .last_mut()
            .ok_or_else(|| ExportError::EncodingFailed("no page begun".into()))
    }
}

impl PdfDocument for SkiaPdfDocument {
    fn begin_page(&mut self, orientation: PageOrientation, page: PageSize) -> Result<()> {
        debug!("PDF page {:?} {}x{}mm", orientation, page.width_mm, page.height_mm);
        self.pages.push(Page { size: page, ops: Vec::new() });
        Ok(())
    }

    fn place_text(&mut self, text: &TextPlacement) -> Result<()> {
        self.current()?.ops.push(PageOp::Text(text.clone()));
        Ok(())
    }

    fn place_image(&mut self, bitmap: &Bitmap, placement: &ImagePlacement) -> Result<()> {
        self.current()?.ops.push(PageOp::Image { bitmap: bitmap.clone(), placement: *placement });
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(ExportError::EncodingFailed("document has no pages".into()));
        }
        let shaper = TextShaper::new();
        let mut metadata = skia::pdf::Metadata::default();
        metadata.title = self.title.clone();
        metadata.creator = self.creator.clone();

        let mut out: Vec<u8> = Vec::new();
        {
            let mut doc = skia::pdf::new_document(&mut out, Some(&metadata));
            for page in &self.pages {
                let size = (mm_to_pt(page.size.width_mm), mm_to_pt(page.size.height_mm));
                let mut on_page = doc.begin_page(size, None);
                let canvas = on_page.canvas();
                for op in &page.ops {
                    match op {
                        PageOp::Text(t) => draw_text(canvas, &shaper, t),
                        PageOp::Image { bitmap, placement } => draw_image(canvas, bitmap, placement)?,
                    }
                }
                doc = on_page.end_page();
            }
            doc.close();
        }
        if out.is_empty() {
            return Err(ExportError::EncodingFailed("skia produced an empty PDF".into()));
        }
        debug!("PDF '{}': {} page(s), {} bytes", self.title, self.pages.len(), out.len());
        Ok(out)
    }
}

fn draw_text(canvas: &skia::Canvas, shaper: &TextShaper, t: &TextPlacement) {
    shaper.draw_centered(
        canvas,
        &t.text,
        mm_to_pt(t.center_x_mm),
        mm_to_pt(t.baseline_y_mm),
        t.size_pt,
        to_skia(t.color),
        false,
    );
}

fn draw_image(canvas: &skia::Canvas, bitmap: &Bitmap, placement: &ImagePlacement) -> Result<()> {
    let info = skia::ImageInfo::new(
        (bitmap.width() as i32, bitmap.height() as i32),
        skia::ColorType::RGBA8888,
        skia::AlphaType::Unpremul,
        None,
    );
    let data = skia::Data::new_copy(bitmap.pixels());
    let image = skia::images::raster_from_data(&info, data, bitmap.stride())
        .ok_or_else(|| ExportError::EncodingFailed("could not wrap bitmap as a skia image".into()))?;

    let dst = skia::Rect::from_xywh(
        mm_to_pt(placement.x_mm),
        mm_to_pt(placement.y_mm),
        mm_to_pt(placement.width_mm),
        mm_to_pt(placement.height_mm),
    );
    let mut paint = skia::Paint::default();
    paint.set_anti_alias(true);
    canvas.draw_image_rect(&image, None, dst, &paint);
    Ok(())
}

// File: crates/export-skia/tests/pdf.rs
// Purpose: End-to-end exports through the skia primitives: PNG, JPEG and PDF bytes.

use chart_export::pdf::TextPlacement;
use chart_export::{
    Color, ExportEngine, ExportError, ExportFormat, ExportRequest, MemorySink, PdfBackend, PdfDocument,
};
use chart_export_skia::pdf::mm_to_pt;
use chart_export_skia::{ChartView, Series, SkiaPdf, SkiaRasterizer};

fn chart() -> ChartView {
    ChartView::new("Wage Index")
        .with_size(160, 90)
        .with_series(Series::line("wages", vec![(2019.0, 100.0), (2020.0, 103.5), (2021.0, 108.2)]))
        .autoscaled()
}

fn engine() -> ExportEngine<SkiaRasterizer, SkiaPdf, MemorySink> {
    ExportEngine::new(SkiaRasterizer::new().without_labels(), SkiaPdf::new(), MemorySink::new())
}

#[tokio::test]
async fn pdf_export_writes_a_pdf() {
    let engine = engine();
    let chart = chart();
    engine
        .export(&ExportRequest::new(ExportFormat::Pdf, "Wage Index").target(&chart))
        .await
        .expect("pdf export");

    let downloads = engine.sink().downloads();
    assert_eq!(downloads[0].file_name, "wage_index.pdf");
    assert_eq!(downloads[0].mime, "application/pdf");
    assert!(downloads[0].bytes.starts_with(b"%PDF"), "missing %PDF header");
}

#[tokio::test]
async fn png_export_matches_requested_scale() {
    let engine = engine();
    let chart = chart();
    engine
        .export(
            &ExportRequest::new(ExportFormat::Png, "Wage Index")
                .target(&chart)
                .background(Color::rgb(18, 18, 20))
                .quality_or_scale(1.0),
        )
        .await
        .expect("png export");

    let downloads = engine.sink().downloads();
    let bytes = &downloads[0].bytes;
    let img = image::load_from_memory(bytes).expect("decode").to_rgba8();
    assert_eq!((img.width(), img.height()), (160, 90));
    assert_eq!(img.get_pixel(0, 0).0, [18, 18, 20, 255]);
}

#[tokio::test]
async fn jpeg_export_is_opaque() {
    let engine = engine();
    let chart = chart();
    engine
        .export(
            &ExportRequest::new(ExportFormat::Jpeg, "Wage Index")
                .target(&chart)
                .background(Color::TRANSPARENT),
        )
        .await
        .expect("jpeg export");

    let downloads = engine.sink().downloads();
    let bytes = &downloads[0].bytes;
    let img = image::load_from_memory(bytes).expect("decode jpeg");
    assert!(!img.color().has_alpha());
    // default raster scale is 2
    assert_eq!((img.width(), img.height()), (320, 180));
}

#[test]
fn document_without_pages_fails() {
    let doc = SkiaPdf::new().create("Empty").expect("create");
    assert!(matches!(doc.finish(), Err(ExportError::EncodingFailed(_))));
}

#[test]
fn text_before_page_is_rejected() {
    let mut doc = SkiaPdf::new().create("Early").expect("create");
    let text = TextPlacement {
        text: "Title".into(),
        center_x_mm: 105.0,
        baseline_y_mm: 15.0,
        size_pt: 16.0,
        color: Color::BLACK,
    };
    assert!(doc.place_text(&text).is_err());
    assert_eq!(doc.page_count(), 0);
}

#[test]
fn a4_width_in_points() {
    assert!((mm_to_pt(210.0) - 595.28).abs() < 0.01);
    assert!((mm_to_pt(297.0) - 841.89).abs() < 0.01);
}

// File: crates/export-core/tests/engine.rs
// Purpose: Single-chart export: raster dispatch, missing targets, failures, rasterize/encode timeouts, cancel.

mod common;

use std::time::Duration;

use chart_export::{
    CancelToken, Color, ExportConfig, ExportEngine, ExportError, ExportFormat, ExportRequest, MemorySink,
    Stage,
};
use common::{engine, engine_with, engine_with_config, FakeChart, RecordingPdf, RecordingRasterizer};

#[tokio::test]
async fn png_export_encodes_and_downloads() {
    let engine = engine();
    let chart = FakeChart::new("rent", 40, 20);
    let request = ExportRequest::new(ExportFormat::Png, "Rent Index (EUR)")
        .target(&chart)
        .background(Color::rgb(18, 18, 20))
        .quality_or_scale(1.5);
    engine.export(&request).await.expect("png export");

    let calls = engine.rasterizer().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].scale, 1.5);
    assert_eq!(calls[0].background, Color::rgb(18, 18, 20));
    assert!(calls[0].allow_cross_origin);

    let downloads = engine.sink().downloads();
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].file_name, "rent_index__eur_.png");
    assert_eq!(downloads[0].mime, "image/png");

    let img = image::load_from_memory(&downloads[0].bytes).expect("decode png").to_rgba8();
    assert_eq!((img.width(), img.height()), (60, 30));
    assert_eq!(img.get_pixel(0, 0).0, [18, 18, 20, 255]);
}

#[tokio::test]
async fn jpeg_uses_quality_not_scale() {
    let engine = engine();
    let chart = FakeChart::new("cpi", 32, 16);
    let request = ExportRequest::new(ExportFormat::Jpeg, "CPI")
        .target(&chart)
        .file_name_base("cpi-monthly")
        .quality_or_scale(0.8);
    engine.export(&request).await.expect("jpeg export");

    let calls = engine.rasterizer().calls();
    assert_eq!(calls[0].scale, engine.config().raster_scale);

    let downloads = engine.sink().downloads();
    assert_eq!(downloads[0].file_name, "cpi-monthly.jpg");
    assert_eq!(downloads[0].mime, "image/jpeg");
    assert_eq!(&downloads[0].bytes[..2], &[0xFF, 0xD8], "jpeg SOI marker");
}

#[tokio::test]
async fn default_background_comes_from_config() {
    let mut cfg = ExportConfig::default();
    cfg.background = "#fafafc".parse().expect("color");
    let engine = engine_with_config(RecordingRasterizer::default(), cfg);
    let chart = FakeChart::new("bg", 4, 4);
    engine
        .export(&ExportRequest::new(ExportFormat::Png, "bg").target(&chart))
        .await
        .expect("export");
    assert_eq!(engine.rasterizer().calls()[0].background, Color::rgb(0xfa, 0xfa, 0xfc));
}

#[tokio::test]
async fn missing_target_fails_before_rasterizing() {
    let engine = engine();
    for format in [ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Pdf] {
        let request = ExportRequest::<FakeChart>::new(format, "No element");
        let err = engine.export(&request).await.unwrap_err();
        assert!(matches!(err, ExportError::MissingElement), "{format}: {err:?}");
    }
    assert_eq!(engine.rasterizer().call_count(), 0);
    assert!(engine.sink().is_empty());
}

#[tokio::test]
async fn rasterizer_failure_is_reported_unchanged() {
    let engine = engine_with(RecordingRasterizer::failing_on("broken"));
    let chart = FakeChart::new("broken", 10, 10);
    let err = engine
        .export(&ExportRequest::new(ExportFormat::Png, "Broken").target(&chart))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::RasterizationFailed(ref m) if m.contains("broken")), "{err:?}");
    assert!(engine.sink().is_empty());
}

#[tokio::test]
async fn hanging_rasterizer_times_out() {
    let mut cfg = ExportConfig::default();
    cfg.raster_timeout_ms = 50;
    let engine = engine_with_config(RecordingRasterizer::hanging_on("slow"), cfg);
    let chart = FakeChart::new("slow", 10, 10);
    let err = engine
        .export(&ExportRequest::new(ExportFormat::Pdf, "Slow").target(&chart))
        .await
        .unwrap_err();
    match err {
        ExportError::Timeout { stage, after } => {
            assert_eq!(stage, Stage::Rasterize);
            assert_eq!(after, Duration::from_millis(50));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_pdf_finish_times_out_in_encode_stage() {
    let mut cfg = ExportConfig::default();
    cfg.encode_timeout_ms = 50;
    let engine = ExportEngine::new(
        RecordingRasterizer::default(),
        RecordingPdf::slow_finish(Duration::from_millis(300)),
        MemorySink::new(),
    )
    .with_config(cfg);
    let chart = FakeChart::new("report", 40, 20);

    let err = engine
        .export(&ExportRequest::new(ExportFormat::Pdf, "Report").target(&chart))
        .await
        .unwrap_err();
    match err {
        ExportError::Timeout { stage, after } => {
            assert_eq!(stage, Stage::Encode);
            assert_eq!(after, Duration::from_millis(50));
        }
        other => panic!("expected encode timeout, got {other:?}"),
    }
    assert_eq!(engine.rasterizer().call_count(), 1);
    assert!(engine.sink().is_empty());
}

#[tokio::test]
async fn cancel_interrupts_rasterization() {
    let engine = engine_with(RecordingRasterizer::hanging_on("slow"));
    let chart = FakeChart::new("slow", 10, 10);
    let token = CancelToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let request = ExportRequest::new(ExportFormat::Png, "Slow").target(&chart);
    let err = engine.export_with_cancel(&request, &token).await.unwrap_err();
    assert!(matches!(err, ExportError::Cancelled));
    assert!(engine.sink().is_empty());
}

#[tokio::test]
async fn already_cancelled_token_skips_work() {
    let engine = engine();
    let chart = FakeChart::new("c", 10, 10);
    let token = CancelToken::new();
    token.cancel();
    let err = engine
        .export_with_cancel(&ExportRequest::new(ExportFormat::Png, "c").target(&chart), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Cancelled));
    assert_eq!(engine.rasterizer().call_count(), 0);
}

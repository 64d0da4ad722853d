// File: crates/export-core/tests/config.rs
// Purpose: Config defaults, JSON loading, and range validation.

use std::time::Duration;

use chart_export::{Color, ExportConfig, ExportError};

#[test]
fn defaults_match_documented_values() {
    let cfg = ExportConfig::default();
    assert_eq!(cfg.bulk_delay(), Duration::from_millis(500));
    assert_eq!(cfg.pdf_scale, 2.0);
    assert_eq!(cfg.background, Color::WHITE);
    assert_eq!(cfg.container_selector, "data-chart-container");
    assert_eq!(cfg.pdf.side_margin_mm, 10.0);
}

#[test]
fn partial_json_keeps_other_defaults() {
    let cfg = ExportConfig::from_json_str(
        r##"{ "bulk_delay_ms": 750, "background": "#121214", "pdf": { "title_size_pt": 20 } }"##,
    )
    .expect("config");
    assert_eq!(cfg.bulk_delay_ms, 750);
    assert_eq!(cfg.background, Color::rgb(0x12, 0x12, 0x14));
    assert_eq!(cfg.pdf.title_size_pt, 20.0);
    assert_eq!(cfg.pdf.subtitle_size_pt, 10.0);
    assert_eq!(cfg.product_label, "Economic Data Dashboard");
}

#[test]
fn out_of_range_values_are_clamped() {
    let cfg = ExportConfig::from_json_str(
        r#"{ "pdf_scale": 1.0, "jpeg_quality": 7.5, "raster_scale": 100, "raster_timeout_ms": 0 }"#,
    )
    .expect("config");
    assert_eq!(cfg.pdf_scale, 2.0);
    assert_eq!(cfg.jpeg_quality, 1.0);
    assert_eq!(cfg.raster_scale, 8.0);
    assert_eq!(cfg.raster_timeout_ms, 30_000);
}

#[test]
fn bad_color_is_a_config_error() {
    let err = ExportConfig::from_json_str(r#"{ "background": "not-a-color" }"#).unwrap_err();
    assert!(matches!(err, ExportError::Config(_)));
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("export.json");
    std::fs::write(&path, r#"{ "product_label": "City Prices" }"#).expect("write");
    let cfg = ExportConfig::from_json_file(&path).expect("load");
    assert_eq!(cfg.product_label, "City Prices");

    let missing = ExportConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, ExportError::Config(_)));
}

#[test]
fn colors_parse_short_and_alpha_forms() {
    assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
    assert_eq!("#00000080".parse::<Color>().unwrap(), Color::rgba(0, 0, 0, 0x80));
    assert!("#12345".parse::<Color>().is_err());
    assert_eq!(Color::rgb(1, 2, 3).to_string(), "#010203");
}

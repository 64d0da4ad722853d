// File: crates/export-core/src/config.rs
// Summary: Export configuration (timeouts, throttle delay, scales, PDF page text) with JSON loading.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encode::DEFAULT_JPEG_QUALITY;
use crate::error::{ExportError, Result};
use crate::pdf::PdfLayoutConfig;
use crate::raster::MIN_PDF_SCALE;
use crate::registry::CHART_CONTAINER_MARKER;
use crate::request::Color;

const MIN_SCALE: f32 = 0.1;
const MAX_SCALE: f32 = 8.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Pause between two charts of a bulk export.
    pub bulk_delay_ms: u64,
    pub raster_timeout_ms: u64,
    pub encode_timeout_ms: u64,
    /// Default raster scale (PNG without an explicit scale, and every JPEG).
    pub raster_scale: f32,
    /// PDF rasterization scale; never below 2.
    pub pdf_scale: f32,
    pub jpeg_quality: f32,
    pub background: Color,
    /// Fixed label on the PDF subtitle line, before the export date.
    pub product_label: String,
    /// chrono format string for the PDF subtitle date.
    pub date_format: String,
    pub container_selector: String,
    pub pdf: PdfLayoutConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bulk_delay_ms: 500,
            raster_timeout_ms: 30_000,
            encode_timeout_ms: 30_000,
            raster_scale: 2.0,
            pdf_scale: MIN_PDF_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            background: Color::WHITE,
            product_label: "Economic Data Dashboard".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            container_selector: CHART_CONTAINER_MARKER.to_string(),
            pdf: PdfLayoutConfig::default(),
        }
    }
}

fn clamp_or(value: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if value.is_finite() { value.clamp(lo, hi) } else { fallback }
}

impl ExportConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: ExportConfig =
            serde_json::from_str(text).map_err(|e| ExportError::Config(e.to_string()))?;
        Ok(cfg.validated())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExportError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Pull every value back into its supported range.
    pub fn validated(mut self) -> Self {
        let defaults = ExportConfig::default();
        self.raster_scale = clamp_or(self.raster_scale, MIN_SCALE, MAX_SCALE, defaults.raster_scale);
        self.pdf_scale = clamp_or(self.pdf_scale, MIN_PDF_SCALE, MAX_SCALE, defaults.pdf_scale);
        self.jpeg_quality = clamp_or(self.jpeg_quality, 0.01, 1.0, defaults.jpeg_quality);
        if self.raster_timeout_ms == 0 {
            self.raster_timeout_ms = defaults.raster_timeout_ms;
        }
        if self.encode_timeout_ms == 0 {
            self.encode_timeout_ms = defaults.encode_timeout_ms;
        }
        if self.container_selector.trim().is_empty() {
            self.container_selector = defaults.container_selector;
        }
        self
    }

    pub fn bulk_delay(&self) -> Duration {
        Duration::from_millis(self.bulk_delay_ms)
    }

    pub fn raster_timeout(&self) -> Duration {
        Duration::from_millis(self.raster_timeout_ms)
    }

    pub fn encode_timeout(&self) -> Duration {
        Duration::from_millis(self.encode_timeout_ms)
    }

    /// Scale applied to a raster request, clamped like the config values.
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        clamp_or(scale, MIN_SCALE, MAX_SCALE, self.raster_scale)
    }
}

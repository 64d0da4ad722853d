// File: crates/export-skia/src/raster.rs
// Summary: Rasterization primitive for ChartView: renders on tokio's blocking pool.

use chart_export::{Bitmap, ExportError, RasterOptions, Rasterize};
use log::debug;

use crate::chart::{ChartView, RenderOptions};

#[derive(Clone, Copy, Debug)]
pub struct SkiaRasterizer {
    draw_labels: bool,
}

impl Default for SkiaRasterizer {
    fn default() -> Self {
        Self { draw_labels: true }
    }
}

impl SkiaRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip all text; output then depends on geometry only.
    pub fn without_labels(mut self) -> Self {
        self.draw_labels = false;
        self
    }
}

impl Rasterize<ChartView> for SkiaRasterizer {
    async fn rasterize(&self, chart: &ChartView, opts: &RasterOptions) -> chart_export::error::Result<Bitmap> {
        // Charts carry no external imagery, so `allow_cross_origin` has nothing to gate.
        let render = RenderOptions { scale: opts.scale, background: opts.background, draw_labels: self.draw_labels };
        let chart = chart.clone();
        debug!("Rasterizing {}x{} chart at {}x", chart.width, chart.height, render.scale);
        tokio::task::spawn_blocking(move || chart.render_rgba8(&render))
            .await
            .map_err(|e| ExportError::RasterizationFailed(format!("render task failed: {e}")))?
            .map_err(|e| ExportError::RasterizationFailed(format!("{e:#}")))
    }
}

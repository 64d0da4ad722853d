// File: crates/export-skia/src/chart.rs
// Summary: ChartView (title, axes, line/bar series) and its CPU raster rendering pipeline.
// Notes:
// - Geometry is in logical pixels; `RenderOptions::scale` multiplies the device size and
//   the canvas transform together, so a 2x export is the same picture with twice the pixels.
// - Output is straight-alpha RGBA8, read back from an N32 premul surface.

use anyhow::{anyhow, Result};
use chart_export::{Bitmap, Color};
use skia_safe as skia;

use crate::axis::{format_tick, Axis};
use crate::series::{Series, SeriesKind};
use crate::text::TextShaper;
use crate::theme::{to_skia, Theme};
use crate::types::{Insets, HEIGHT, WIDTH};

/// Largest device edge we agree to allocate.
const MAX_DEVICE_EDGE: i32 = 16_384;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    pub scale: f32,
    pub background: Color,
    /// Title, axis labels and tick labels. Off gives font-independent pixels.
    pub draw_labels: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { scale: 1.0, background: Color::WHITE, draw_labels: true }
    }
}

#[derive(Clone, Debug)]
pub struct ChartView {
    pub title: Option<String>,
    /// Logical size.
    pub width: u32,
    pub height: u32,
    pub insets: Insets,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<Series>,
    pub theme: Theme,
}

impl Default for ChartView {
    fn default() -> Self {
        Self {
            title: None,
            width: WIDTH,
            height: HEIGHT,
            insets: Insets::default(),
            x_axis: Axis::default(),
            y_axis: Axis::default(),
            series: Vec::new(),
            theme: Theme::default(),
        }
    }
}

impl ChartView {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Self::default() }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_axes(mut self, x: Axis, y: Axis) -> Self {
        self.x_axis = x;
        self.y_axis = y;
        self
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.add_series(series);
        self
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Fit both axis ranges to the data, with `margin` (fraction of the span) above
    /// and below on y. Bars always keep their zero baseline in view.
    pub fn autoscale_axes(&mut self, margin: f64) {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for s in &self.series {
            for &(x, y) in &s.points {
                x_min = x_min.min(x);
                x_max = x_max.max(x);
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
            if s.kind == SeriesKind::Bar && !s.is_empty() {
                y_min = y_min.min(0.0);
                y_max = y_max.max(0.0);
            }
        }
        if !x_min.is_finite() || !x_max.is_finite() || !y_min.is_finite() || !y_max.is_finite() {
            (x_min, x_max, y_min, y_max) = (0.0, 1.0, 0.0, 1.0);
        }
        if (x_max - x_min).abs() < 1e-9 { x_max = x_min + 1.0; }
        if (y_max - y_min).abs() < 1e-9 { y_max = y_min + 1.0; }
        let ym = (y_max - y_min) * margin.max(0.0);
        self.x_axis.min = x_min;
        self.x_axis.max = x_max;
        self.y_axis.min = y_min - ym;
        self.y_axis.max = y_max + ym;
    }

    pub fn autoscaled(mut self) -> Self {
        self.autoscale_axes(0.02);
        self
    }

    /// Device size for `scale`, at least 1x1.
    pub fn device_size(&self, scale: f32) -> (i32, i32) {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let w = (self.width as f32 * scale).round().clamp(1.0, MAX_DEVICE_EDGE as f32) as i32;
        let h = (self.height as f32 * scale).round().clamp(1.0, MAX_DEVICE_EDGE as f32) as i32;
        (w, h)
    }

    /// Render to straight-alpha RGBA8 pixels.
    pub fn render_rgba8(&self, opts: &RenderOptions) -> Result<Bitmap> {
        let (w, h) = self.device_size(opts.scale);
        let mut surface = skia::surfaces::raster_n32_premul((w, h))
            .ok_or_else(|| anyhow!("failed to create {w}x{h} raster surface"))?;

        {
            let canvas = surface.canvas();
            canvas.clear(to_skia(opts.background));
            canvas.save();
            canvas.scale((w as f32 / self.width as f32, h as f32 / self.height as f32));
            self.paint(canvas, opts.draw_labels);
            canvas.restore();
        }

        let info = skia::ImageInfo::new((w, h), skia::ColorType::RGBA8888, skia::AlphaType::Unpremul, None);
        let row_bytes = w as usize * 4;
        let mut pixels = vec![0u8; row_bytes * h as usize];
        if !surface.read_pixels(&info, &mut pixels, row_bytes, (0, 0)) {
            return Err(anyhow!("reading back {w}x{h} pixels failed"));
        }
        Ok(Bitmap::from_rgba8(w as u32, h as u32, pixels)?)
    }

    /// PNG bytes of [`ChartView::render_rgba8`].
    pub fn render_to_png_bytes(&self, opts: &RenderOptions) -> Result<Vec<u8>> {
        let bitmap = self.render_rgba8(opts)?;
        Ok(chart_export::encode::encode_png(&bitmap)?)
    }

    fn plot_rect(&self) -> skia::Rect {
        let l = self.insets.left as f32;
        let t = self.insets.top as f32;
        let r = (self.width.saturating_sub(self.insets.right) as f32).max(l + 1.0);
        let b = (self.height.saturating_sub(self.insets.bottom) as f32).max(t + 1.0);
        skia::Rect::from_ltrb(l, t, r, b)
    }

    fn paint(&self, canvas: &skia::Canvas, draw_labels: bool) {
        let plot = self.plot_rect();
        let shaper = draw_labels.then(TextShaper::new);

        draw_grid(canvas, plot, &self.theme);
        draw_axes(canvas, plot, &self.theme);

        canvas.save();
        canvas.clip_rect(plot, skia::ClipOp::Intersect, true);
        for s in &self.series {
            match s.kind {
                SeriesKind::Line => draw_line_series(canvas, plot, &self.x_axis, &self.y_axis, s, &self.theme),
                SeriesKind::Bar => draw_bar_series(canvas, plot, &self.x_axis, &self.y_axis, s, &self.theme),
            }
        }
        canvas.restore();

        if let Some(shaper) = &shaper {
            draw_labels_and_title(canvas, shaper, plot, self);
        }
    }
}

// ---- helpers ----------------------------------------------------------------

const X_TICKS: usize = 6;
const Y_TICKS: usize = 5;

fn projector(plot: skia::Rect, x_axis: &Axis, y_axis: &Axis) -> impl Fn(f64, f64) -> (f32, f32) {
    let (xmin, xspan) = (x_axis.min, x_axis.span());
    let (ymin, yspan) = (y_axis.min, y_axis.span());
    move |x, y| {
        let px = plot.left + ((x - xmin) / xspan) as f32 * plot.width();
        let py = plot.bottom - ((y - ymin) / yspan) as f32 * plot.height();
        (px, py)
    }
}

fn draw_grid(canvas: &skia::Canvas, plot: skia::Rect, theme: &Theme) {
    let mut paint = skia::Paint::default();
    paint.set_color(theme.grid);
    paint.set_anti_alias(true);
    paint.set_stroke_width(1.0);

    for x in crate::axis::linspace(plot.left as f64, plot.right as f64, X_TICKS) {
        canvas.draw_line((x as f32, plot.top), (x as f32, plot.bottom), &paint);
    }
    for y in crate::axis::linspace(plot.top as f64, plot.bottom as f64, Y_TICKS) {
        canvas.draw_line((plot.left, y as f32), (plot.right, y as f32), &paint);
    }
}

fn draw_axes(canvas: &skia::Canvas, plot: skia::Rect, theme: &Theme) {
    let mut axis_paint = skia::Paint::default();
    axis_paint.set_color(theme.axis_line);
    axis_paint.set_anti_alias(true);
    axis_paint.set_stroke_width(1.5);

    canvas.draw_line((plot.left, plot.bottom), (plot.right, plot.bottom), &axis_paint);
    canvas.draw_line((plot.left, plot.top), (plot.left, plot.bottom), &axis_paint);
}

fn draw_labels_and_title(canvas: &skia::Canvas, shaper: &TextShaper, plot: skia::Rect, chart: &ChartView) {
    let theme = &chart.theme;

    for (v, x) in chart
        .x_axis
        .ticks(X_TICKS)
        .into_iter()
        .zip(crate::axis::linspace(plot.left as f64, plot.right as f64, X_TICKS))
    {
        shaper.draw_centered(canvas, &format_tick(v), x as f32, plot.bottom + 16.0, 11.0, theme.tick, true);
    }
    for (v, y) in chart
        .y_axis
        .ticks(Y_TICKS)
        .into_iter()
        .zip(crate::axis::linspace(plot.bottom as f64, plot.top as f64, Y_TICKS))
    {
        shaper.draw_right(canvas, &format_tick(v), plot.left - 6.0, y as f32 + 4.0, 11.0, theme.tick, true);
    }

    if !chart.x_axis.label.is_empty() {
        shaper.draw_right(canvas, &chart.x_axis.label, plot.right, plot.bottom + 32.0, 12.0, theme.axis_label, false);
    }
    if !chart.y_axis.label.is_empty() {
        shaper.draw_left(canvas, &chart.y_axis.label, plot.left, plot.top - 8.0, 12.0, theme.axis_label, false);
    }
    if let Some(title) = chart.title.as_deref().filter(|t| !t.trim().is_empty()) {
        let cx = chart.width as f32 / 2.0;
        shaper.draw_centered(canvas, title, cx, 22.0, 16.0, theme.title, false);
    }
}

fn draw_line_series(
    canvas: &skia::Canvas,
    plot: skia::Rect,
    x_axis: &Axis,
    y_axis: &Axis,
    series: &Series,
    theme: &Theme,
) {
    let data = &series.points;
    if data.len() < 2 {
        return;
    }
    let project = projector(plot, x_axis, y_axis);

    let mut path = skia::Path::new();
    let (x0, y0) = data[0];
    path.move_to(project(x0, y0));
    for &(x, y) in data.iter().skip(1) {
        path.line_to(project(x, y));
    }

    let mut stroke = skia::Paint::default();
    stroke.set_anti_alias(true);
    stroke.set_style(skia::paint::Style::Stroke);
    stroke.set_stroke_width(2.0);
    stroke.set_color(series.color.map(to_skia).unwrap_or(theme.line_stroke));

    canvas.draw_path(&path, &stroke);
}

fn draw_bar_series(
    canvas: &skia::Canvas,
    plot: skia::Rect,
    x_axis: &Axis,
    y_axis: &Axis,
    series: &Series,
    theme: &Theme,
) {
    if series.is_empty() {
        return;
    }
    let project = projector(plot, x_axis, y_axis);

    let mut body = skia::Paint::default();
    body.set_anti_alias(true);
    body.set_style(skia::paint::Style::Fill);
    body.set_color(series.color.map(to_skia).unwrap_or(theme.bar_fill));

    // roughly one slot per point, 70% filled
    let n = series.points.len() as f32;
    let half = ((plot.width() / n).max(3.0) * 0.7) * 0.5;
    let baseline = 0.0f64.clamp(y_axis.min, y_axis.max);

    for &(x, y) in &series.points {
        let (px, py) = project(x, y);
        let (_, p0) = project(x, baseline);
        let top = py.min(p0);
        let bot = py.max(p0);
        let rect = skia::Rect::from_ltrb(px - half, top, px + half, bot.max(top + 1.0));
        canvas.draw_rect(rect, &body);
    }
}

// File: crates/export-skia/src/series.rs
// Summary: Series model for the export chart: named (x, y) data drawn as a line or bars.

use chart_export::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    /// Bars rise from y = 0.
    Bar,
}

#[derive(Clone, Debug)]
pub struct Series {
    pub name: String,
    pub kind: SeriesKind,
    pub points: Vec<(f64, f64)>,
    /// Overrides the theme's color for this kind.
    pub color: Option<Color>,
}

impl Series {
    pub fn new(name: impl Into<String>, kind: SeriesKind, points: Vec<(f64, f64)>) -> Self {
        let points = points.into_iter().filter(|(x, y)| x.is_finite() && y.is_finite()).collect();
        Self { name: name.into(), kind, points, color: None }
    }

    pub fn line(name: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self::new(name, SeriesKind::Line, points)
    }

    pub fn bar(name: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self::new(name, SeriesKind::Bar, points)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

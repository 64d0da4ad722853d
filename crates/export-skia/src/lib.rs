// File: crates/export-skia/src/lib.rs
// Summary: Skia-backed primitives for chart-export: ChartView rendering, rasterizer, PDF backend.

pub mod axis;
pub mod chart;
pub mod pdf;
pub mod raster;
pub mod series;
pub mod text;
pub mod theme;
pub mod types;

pub use axis::Axis;
pub use chart::{ChartView, RenderOptions};
pub use pdf::{SkiaPdf, SkiaPdfDocument};
pub use raster::SkiaRasterizer;
pub use series::{Series, SeriesKind};
pub use text::TextShaper;
pub use theme::Theme;
pub use types::Insets;

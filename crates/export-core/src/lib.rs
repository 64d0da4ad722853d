// File: crates/export-core/src/lib.rs
// Summary: Core library entry point; exports the chart export engine, bulk orchestrator and seams.

pub mod bitmap;
pub mod bulk;
pub mod cancel;
pub mod config;
pub mod download;
pub mod encode;
pub mod engine;
pub mod error;
pub mod filename;
pub mod format;
pub mod pdf;
pub mod raster;
pub mod registry;
pub mod request;
pub mod tabular;

pub use bitmap::Bitmap;
pub use bulk::{BulkExporter, BulkOptions, BulkReport, FailurePolicy};
pub use cancel::CancelToken;
pub use config::ExportConfig;
pub use download::{DirectorySink, Download, DownloadSink, MemorySink};
pub use engine::ExportEngine;
pub use error::{ExportError, Stage};
pub use filename::{file_name, sanitize};
pub use format::ExportFormat;
pub use pdf::{PageOrientation, PageSize, PdfBackend, PdfDocument, PdfLayoutConfig, PdfPageLayout};
pub use raster::{RasterOptions, Rasterize};
pub use registry::{ChartHandle, ChartId, ChartRegistry, MountedChart, CHART_CONTAINER_MARKER};
pub use request::{Color, ExportRequest, Row};
pub use tabular::build_csv;

// File: crates/export-core/src/error.rs
// Summary: Error taxonomy shared by the engine, the bulk orchestrator, and the platform seams.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::format::ExportFormat;

/// Which bounded step of an export exceeded its time budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Rasterize,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Rasterize => f.write_str("rasterize"),
            Stage::Encode => f.write_str("encode"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export target element is missing")]
    MissingElement,

    #[error("no data to export")]
    NoData,

    #[error("rasterization failed: {0}")]
    RasterizationFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("no charts found for selector `{0}`")]
    NoChartsFound(String),

    #[error("format `{0}` is not supported in bulk export")]
    UnsupportedBulkFormat(ExportFormat),

    #[error("{stage} step timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },

    #[error("export cancelled")]
    Cancelled,

    #[error("download failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ExportError {
    /// Short machine-readable kind, handy for log fields and UI messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::MissingElement => "missing_element",
            ExportError::NoData => "no_data",
            ExportError::RasterizationFailed(_) => "rasterization_failed",
            ExportError::EncodingFailed(_) => "encoding_failed",
            ExportError::NoChartsFound(_) => "no_charts_found",
            ExportError::UnsupportedBulkFormat(_) => "unsupported_bulk_format",
            ExportError::Timeout { .. } => "timeout",
            ExportError::Cancelled => "cancelled",
            ExportError::Io(_) => "io",
            ExportError::Config(_) => "config",
        }
    }
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;

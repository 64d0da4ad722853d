// File: crates/export-core/src/bulk.rs
// Summary: Bulk export orchestrator: every mounted chart, one at a time, with a throttle delay.
// Notes:
// - Strictly sequential. Export N+1 starts only after export N and the delay have finished.
// - No format logic lives here; each chart goes through ExportEngine::export.

use std::time::Duration;

use log::{info, warn};

use crate::cancel::CancelToken;
use crate::download::DownloadSink;
use crate::engine::ExportEngine;
use crate::error::{ExportError, Result};
use crate::format::ExportFormat;
use crate::pdf::PdfBackend;
use crate::raster::Rasterize;
use crate::registry::{ChartRegistry, MountedChart};
use crate::request::{Color, ExportRequest};

/// What to do when one chart of a batch fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and return it unchanged.
    #[default]
    FailFast,
    /// Record the failure in the report and keep going.
    Continue,
}

#[derive(Clone, Debug, Default)]
pub struct BulkOptions {
    pub background: Option<Color>,
    pub quality_or_scale: Option<f32>,
    /// Overrides the configured inter-item delay.
    pub delay: Option<Duration>,
    pub policy: FailurePolicy,
    pub cancel: Option<CancelToken>,
}

impl BulkOptions {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }
}

#[derive(Debug, Default)]
pub struct BulkReport {
    /// Resolved titles of charts that were delivered, in order.
    pub exported: Vec<String>,
    /// Charts that failed under `FailurePolicy::Continue`.
    pub failed: Vec<(String, ExportError)>,
}

impl BulkReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut s = format!("{} succeeded, {} failed", self.exported.len(), self.failed.len());
        if !self.failed.is_empty() {
            let names: Vec<String> = self
                .failed
                .iter()
                .map(|(title, err)| format!("{title} ({})", err.kind()))
                .collect();
            s.push_str(": ");
            s.push_str(&names.join(", "));
        }
        s
    }
}

pub struct BulkExporter<'e, R, P, D> {
    engine: &'e ExportEngine<R, P, D>,
}

impl<'e, R, P, D> BulkExporter<'e, R, P, D>
where
    P: PdfBackend,
    D: DownloadSink,
{
    pub fn new(engine: &'e ExportEngine<R, P, D>) -> Self {
        Self { engine }
    }

    /// Export every chart matching `selector` as `format`.
    ///
    /// CSV is rejected up front: a chart's rows are not part of what gets rasterized.
    /// Use [`BulkExporter::export_all_data`] for charts that registered a data provider.
    pub async fn export_all<E>(
        &self,
        registry: &ChartRegistry<E>,
        selector: &str,
        format: ExportFormat,
        options: &BulkOptions,
    ) -> Result<BulkReport>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        if format == ExportFormat::Csv {
            return Err(ExportError::UnsupportedBulkFormat(format));
        }
        let charts = discover(registry, selector)?;
        self.run(&charts, format, options).await
    }

    /// CSV for every chart matching `selector`, rows pulled from each chart's data provider.
    /// A chart without a provider fails with `NoData`.
    pub async fn export_all_data<E>(
        &self,
        registry: &ChartRegistry<E>,
        selector: &str,
        options: &BulkOptions,
    ) -> Result<BulkReport>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        let charts = discover(registry, selector)?;
        self.run(&charts, ExportFormat::Csv, options).await
    }

    async fn run<E>(
        &self,
        charts: &[MountedChart<E>],
        format: ExportFormat,
        options: &BulkOptions,
    ) -> Result<BulkReport>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        let delay = options.delay.unwrap_or_else(|| self.engine.config().bulk_delay());
        let total = charts.len();
        let mut report = BulkReport::default();

        for (i, chart) in charts.iter().enumerate() {
            if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                info!("Bulk export cancelled after {} of {} charts", i, total);
                return Err(ExportError::Cancelled);
            }

            let title = chart.resolved_title();
            info!("Exporting {}/{} '{}' as {}", i + 1, total, title, format);

            match self.export_one(chart, &title, format, options).await {
                Ok(()) => report.exported.push(title),
                Err(ExportError::Cancelled) => return Err(ExportError::Cancelled),
                Err(err) => match options.policy {
                    FailurePolicy::FailFast => {
                        warn!("Chart '{}' failed, stopping bulk export: {}", title, err);
                        return Err(err);
                    }
                    FailurePolicy::Continue => {
                        warn!("Chart '{}' failed, continuing: {}", title, err);
                        report.failed.push((title, err));
                    }
                },
            }

            if i + 1 < total {
                pause(delay, options.cancel.as_ref()).await?;
            }
        }

        info!("Bulk export finished: {}", report.summary());
        Ok(report)
    }

    async fn export_one<E>(
        &self,
        chart: &MountedChart<E>,
        title: &str,
        format: ExportFormat,
        options: &BulkOptions,
    ) -> Result<()>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        if format == ExportFormat::Csv {
            let rows = chart.rows().ok_or(ExportError::NoData)?;
            let request = ExportRequest::<E>::new(format, title).file_name_base(title).rows(&rows);
            return self.engine.export(&request).await;
        }

        let mut request = ExportRequest::new(format, title)
            .target(&*chart.element)
            .file_name_base(title);
        if let Some(bg) = options.background {
            request = request.background(bg);
        }
        if let Some(q) = options.quality_or_scale {
            request = request.quality_or_scale(q);
        }
        match &options.cancel {
            Some(token) => self.engine.export_with_cancel(&request, token).await,
            None => self.engine.export(&request).await,
        }
    }
}

fn discover<E: ?Sized>(registry: &ChartRegistry<E>, selector: &str) -> Result<Vec<MountedChart<E>>> {
    let charts = registry.query(selector);
    if charts.is_empty() {
        return Err(ExportError::NoChartsFound(selector.to_string()));
    }
    Ok(charts)
}

/// Inter-item throttle. A cancel during the wait ends the batch.
async fn pause(delay: Duration, cancel: Option<&CancelToken>) -> Result<()> {
    if delay.is_zero() {
        return Ok(());
    }
    match cancel {
        Some(token) => tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = token.cancelled() => Err(ExportError::Cancelled),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

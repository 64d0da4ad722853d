// File: crates/export-core/src/engine.rs
// Summary: Chart export engine: one ExportRequest in, one delivered file out.
// Notes:
// - Dispatch is purely on the request format. Raster and PDF paths rasterize first,
//   CSV never touches the element.
// - Rasterization and encoding each run under their own timeout; encoders run on
//   tokio's blocking pool so the executor keeps servicing other tasks.
// - Nothing is retried here. Callers decide what a failure means.

use std::fmt::Write as _;

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::bitmap::Bitmap;
use crate::cancel::CancelToken;
use crate::config::ExportConfig;
use crate::download::{Download, DownloadSink};
use crate::encode::{encode_jpeg, encode_png};
use crate::error::{ExportError, Result, Stage};
use crate::filename::file_name;
use crate::format::ExportFormat;
use crate::pdf::{compose_page, PdfBackend, PdfDocument, PdfPageLayout};
use crate::raster::{RasterOptions, Rasterize, MIN_PDF_SCALE};
use crate::request::ExportRequest;
use crate::tabular::build_csv;

pub struct ExportEngine<R, P, D> {
    rasterizer: R,
    pdf: P,
    sink: D,
    config: ExportConfig,
    date: Option<NaiveDate>,
}

impl<R, P, D> ExportEngine<R, P, D>
where
    P: PdfBackend,
    D: DownloadSink,
{
    pub fn new(rasterizer: R, pdf: P, sink: D) -> Self {
        Self { rasterizer, pdf, sink, config: ExportConfig::default(), date: None }
    }

    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config.validated();
        self
    }

    /// Pin the date printed on PDF pages instead of using today's local date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn config(&self) -> &ExportConfig { &self.config }
    pub fn rasterizer(&self) -> &R { &self.rasterizer }
    pub fn pdf_backend(&self) -> &P { &self.pdf }
    pub fn sink(&self) -> &D { &self.sink }

    /// Export one chart according to `request.format`.
    pub async fn export<E>(&self, request: &ExportRequest<'_, E>) -> Result<()>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        self.run(request, None).await
    }

    /// Like [`ExportEngine::export`], but gives up with `Cancelled` if `cancel` fires
    /// before or during rasterization.
    pub async fn export_with_cancel<E>(
        &self,
        request: &ExportRequest<'_, E>,
        cancel: &CancelToken,
    ) -> Result<()>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        self.run(request, Some(cancel)).await
    }

    async fn run<E>(&self, request: &ExportRequest<'_, E>, cancel: Option<&CancelToken>) -> Result<()>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(ExportError::Cancelled);
        }
        debug!("Export '{}' as {}", request.title, request.format);

        let format = request.format;
        let download = if !format.needs_element() {
            self.csv_download(request)?
        } else if format.is_raster() {
            self.raster_download(request, cancel).await?
        } else {
            self.pdf_download(request, cancel).await?
        };

        let name = download.file_name.clone();
        let size = download.bytes.len();
        self.sink.deliver(download).await?;
        info!("Exported '{}' -> {} ({} bytes)", request.title, name, size);
        Ok(())
    }

    async fn raster_download<E>(
        &self,
        request: &ExportRequest<'_, E>,
        cancel: Option<&CancelToken>,
    ) -> Result<Download>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        let element = request.target.ok_or(ExportError::MissingElement)?;
        let background = request.background.unwrap_or(self.config.background);
        let format = request.format;

        let scale = match format {
            ExportFormat::Png => request
                .quality_or_scale
                .map(|s| self.config.clamp_scale(s))
                .unwrap_or(self.config.raster_scale),
            _ => self.config.raster_scale,
        };
        let opts = RasterOptions { background, scale, allow_cross_origin: true };
        let bitmap = self.rasterize(element, &opts, cancel).await?;

        let quality = request.quality_or_scale.unwrap_or(self.config.jpeg_quality);
        let bytes = self
            .blocking(move || match format {
                ExportFormat::Jpeg => encode_jpeg(&bitmap, quality, background),
                _ => encode_png(&bitmap),
            })
            .await?;

        Ok(Download { file_name: file_name(request.base_name(), format), mime: format.mime(), bytes })
    }

    async fn pdf_download<E>(
        &self,
        request: &ExportRequest<'_, E>,
        cancel: Option<&CancelToken>,
    ) -> Result<Download>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        let element = request.target.ok_or(ExportError::MissingElement)?;
        // Print quality: the caller's scale is ignored on this path.
        let opts = RasterOptions {
            background: request.background.unwrap_or(self.config.background),
            scale: self.config.pdf_scale.max(MIN_PDF_SCALE),
            allow_cross_origin: true,
        };
        let bitmap = self.rasterize(element, &opts, cancel).await?;

        let layout = PdfPageLayout::compute(
            bitmap.width(),
            bitmap.height(),
            &self.config.pdf,
            request.title,
            &self.subtitle(),
        );
        debug!(
            "PDF page {:?} {}x{}mm, image {:.1}x{:.1}mm (visible {:.2})",
            layout.orientation,
            layout.page.width_mm,
            layout.page.height_mm,
            layout.image.width_mm,
            layout.image.height_mm,
            layout.image.visible_fraction
        );

        let mut doc = self.pdf.create(request.title).map_err(as_encoding_failure)?;
        compose_page(&mut doc, &bitmap, &layout).map_err(as_encoding_failure)?;
        let bytes = self
            .blocking(move || doc.finish().map_err(as_encoding_failure))
            .await?;

        Ok(Download {
            file_name: file_name(request.base_name(), ExportFormat::Pdf),
            mime: ExportFormat::Pdf.mime(),
            bytes,
        })
    }

    fn csv_download<E: ?Sized>(&self, request: &ExportRequest<'_, E>) -> Result<Download> {
        let bytes = build_csv(request.rows)?;
        debug!("CSV '{}': {} rows, {} bytes", request.title, request.rows.len(), bytes.len());
        Ok(Download {
            file_name: file_name(request.base_name(), ExportFormat::Csv),
            mime: ExportFormat::Csv.mime(),
            bytes,
        })
    }

    async fn rasterize<E>(
        &self,
        element: &E,
        opts: &RasterOptions,
        cancel: Option<&CancelToken>,
    ) -> Result<Bitmap>
    where
        E: ?Sized,
        R: Rasterize<E>,
    {
        let after = self.config.raster_timeout();
        let bounded = tokio::time::timeout(after, self.rasterizer.rasterize(element, opts));
        let outcome = match cancel {
            Some(token) => tokio::select! {
                res = bounded => res,
                _ = token.cancelled() => return Err(ExportError::Cancelled),
            },
            None => bounded.await,
        };
        match outcome {
            Ok(res) => res.map_err(as_raster_failure),
            Err(_) => {
                warn!("Rasterization exceeded {:?}", after);
                Err(ExportError::Timeout { stage: Stage::Rasterize, after })
            }
        }
    }

    /// Run a CPU-bound step on the blocking pool under the encode timeout.
    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let after = self.config.encode_timeout();
        match tokio::time::timeout(after, tokio::task::spawn_blocking(work)).await {
            Ok(Ok(res)) => res,
            Ok(Err(join)) => Err(ExportError::EncodingFailed(format!("encoder task failed: {join}"))),
            Err(_) => {
                warn!("Encoding exceeded {:?}", after);
                Err(ExportError::Timeout { stage: Stage::Encode, after })
            }
        }
    }

    fn subtitle(&self) -> String {
        let date = self.date.unwrap_or_else(|| chrono::Local::now().date_naive());
        let mut when = String::new();
        if write!(when, "{}", date.format(&self.config.date_format)).is_err() {
            when = date.format("%Y-%m-%d").to_string();
        }
        format!("{} - {}", self.config.product_label, when)
    }
}

fn as_raster_failure(err: ExportError) -> ExportError {
    match err {
        ExportError::RasterizationFailed(_) | ExportError::Timeout { .. } | ExportError::Cancelled => err,
        other => ExportError::RasterizationFailed(other.to_string()),
    }
}

fn as_encoding_failure(err: ExportError) -> ExportError {
    match err {
        ExportError::EncodingFailed(_) | ExportError::Timeout { .. } | ExportError::Cancelled => err,
        other => ExportError::EncodingFailed(other.to_string()),
    }
}

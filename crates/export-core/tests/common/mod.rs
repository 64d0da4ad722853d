// File: crates/export-core/tests/common/mod.rs
// Purpose: Recording doubles for the rasterize / PDF seams shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chart_export::pdf::{ImagePlacement, TextPlacement};
use chart_export::{
    Bitmap, Color, ExportConfig, ExportEngine, ExportError, MemorySink, PageOrientation, PageSize,
    PdfBackend, PdfDocument, RasterOptions, Rasterize, Row,
};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde_json::json;

#[derive(Clone, Debug)]
pub struct FakeChart {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl FakeChart {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self { name: name.to_string(), width, height }
    }
}

#[derive(Clone, Debug)]
pub struct RasterCall {
    pub chart: String,
    pub scale: f32,
    pub background: Color,
    pub allow_cross_origin: bool,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Default)]
pub struct RecordingRasterizer {
    calls: Mutex<Vec<RasterCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub fail_on: Option<String>,
    pub hang_on: Option<String>,
    pub work: Duration,
}

impl RecordingRasterizer {
    pub fn failing_on(name: &str) -> Self {
        Self { fail_on: Some(name.to_string()), ..Self::default() }
    }

    pub fn hanging_on(name: &str) -> Self {
        Self { hang_on: Some(name.to_string()), ..Self::default() }
    }

    pub fn with_work(work: Duration) -> Self {
        Self { work, ..Self::default() }
    }

    pub fn calls(&self) -> Vec<RasterCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Rasterize<FakeChart> for RecordingRasterizer {
    async fn rasterize(&self, chart: &FakeChart, opts: &RasterOptions) -> Result<Bitmap, ExportError> {
        let started = Instant::now();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hang_on.as_deref() == Some(chart.name.as_str()) {
            std::future::pending::<()>().await;
        }
        if !self.work.is_zero() {
            tokio::time::sleep(self.work).await;
        }

        let result = if self.fail_on.as_deref() == Some(chart.name.as_str()) {
            Err(ExportError::RasterizationFailed(format!("cannot paint {}", chart.name)))
        } else {
            let w = ((chart.width as f32) * opts.scale).round().max(1.0) as u32;
            let h = ((chart.height as f32) * opts.scale).round().max(1.0) as u32;
            Bitmap::filled(w, h, opts.background)
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().push(RasterCall {
            chart: chart.name.clone(),
            scale: opts.scale,
            background: opts.background,
            allow_cross_origin: opts.allow_cross_origin,
            started,
            finished: Instant::now(),
        });
        result
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PdfOp {
    Create(String),
    Page(PageOrientation, PageSize),
    Text(TextPlacement),
    Image { width: u32, height: u32, placement: ImagePlacement },
    Finish,
}

#[derive(Clone, Default)]
pub struct RecordingPdf {
    pub ops: Arc<Mutex<Vec<PdfOp>>>,
    pub fail_finish: bool,
    /// Blocks `finish` this long, on the calling thread.
    pub finish_delay: Duration,
}

impl RecordingPdf {
    pub fn slow_finish(delay: Duration) -> Self {
        Self { finish_delay: delay, ..Self::default() }
    }

    pub fn ops(&self) -> Vec<PdfOp> {
        self.ops.lock().clone()
    }

    pub fn page(&self) -> Option<(PageOrientation, PageSize)> {
        self.ops().into_iter().find_map(|op| match op {
            PdfOp::Page(o, s) => Some((o, s)),
            _ => None,
        })
    }
}

pub struct RecordingDoc {
    ops: Arc<Mutex<Vec<PdfOp>>>,
    fail_finish: bool,
    finish_delay: Duration,
}

impl PdfBackend for RecordingPdf {
    type Document = RecordingDoc;

    fn create(&self, title: &str) -> Result<RecordingDoc, ExportError> {
        self.ops.lock().push(PdfOp::Create(title.to_string()));
        Ok(RecordingDoc {
            ops: Arc::clone(&self.ops),
            fail_finish: self.fail_finish,
            finish_delay: self.finish_delay,
        })
    }
}

impl PdfDocument for RecordingDoc {
    fn begin_page(&mut self, orientation: PageOrientation, page: PageSize) -> Result<(), ExportError> {
        self.ops.lock().push(PdfOp::Page(orientation, page));
        Ok(())
    }

    fn place_text(&mut self, text: &TextPlacement) -> Result<(), ExportError> {
        self.ops.lock().push(PdfOp::Text(text.clone()));
        Ok(())
    }

    fn place_image(&mut self, bitmap: &Bitmap, placement: &ImagePlacement) -> Result<(), ExportError> {
        self.ops.lock().push(PdfOp::Image {
            width: bitmap.width(),
            height: bitmap.height(),
            placement: *placement,
        });
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        if !self.finish_delay.is_zero() {
            std::thread::sleep(self.finish_delay);
        }
        if self.fail_finish {
            return Err(ExportError::Io(std::io::Error::other("disk full")));
        }
        self.ops.lock().push(PdfOp::Finish);
        Ok(b"%PDF-1.4 recorded".to_vec())
    }
}

pub type TestEngine = ExportEngine<RecordingRasterizer, RecordingPdf, MemorySink>;

pub fn engine_with(rasterizer: RecordingRasterizer) -> TestEngine {
    ExportEngine::new(rasterizer, RecordingPdf::default(), MemorySink::new())
        .with_date(NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date"))
}

pub fn engine() -> TestEngine {
    engine_with(RecordingRasterizer::default())
}

pub fn engine_with_config(rasterizer: RecordingRasterizer, config: ExportConfig) -> TestEngine {
    engine_with(rasterizer).with_config(config)
}

pub fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn gdp_rows() -> Vec<Row> {
    vec![
        row(json!({"year": 2021, "color": "#ff0000", "fill": "#00ff00", "value": 2.5})),
        row(json!({"year": 2022, "color": "#ff0000", "fill": "#00ff00", "value": 1.9})),
    ]
}

// File: crates/export-cli/src/main.rs
// Summary: Loads a CSV table, mounts one chart per numeric column, and exports them
// (all of them in bulk, or a single one with --only).

mod table;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chart_export::{
    BulkExporter, BulkOptions, CancelToken, ChartHandle, ChartRegistry, Color, DirectorySink, ExportConfig,
    ExportEngine, ExportFormat, ExportRequest, FailurePolicy,
};
use chart_export::registry::normalize_selector;
use chart_export_skia::{theme, Axis, ChartView, Series, SkiaPdf, SkiaRasterizer, Theme};
use clap::Parser;
use log::{info, warn};

use crate::table::{load_table, Table};

#[derive(Parser, Debug)]
#[command(name = "chart-export")]
#[command(about = "Export charts built from a CSV table as PNG, JPEG, PDF or CSV")]
#[command(version)]
struct Cli {
    /// Input CSV; the first column is the x value, every numeric column becomes a chart
    input: PathBuf,

    /// Output format: png, jpeg (jpg), pdf or csv
    #[arg(short, long)]
    format: ExportFormat,

    /// Download directory
    #[arg(short, long, default_value = "exports")]
    out: PathBuf,

    /// JSON export configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export only the chart with this title
    #[arg(long)]
    only: Option<String>,

    /// Pause between bulk exports, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Keep exporting after a chart fails
    #[arg(long)]
    keep_going: bool,

    /// Label printed on the PDF subtitle line
    #[arg(long)]
    product_label: Option<String>,

    /// Background color (#rgb, #rrggbb or #rrggbbaa)
    #[arg(long)]
    background: Option<Color>,

    /// PNG scale or JPEG quality
    #[arg(long)]
    quality_or_scale: Option<f32>,

    /// Chart theme: light, dark or high-contrast
    #[arg(long, default_value = "light")]
    theme: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let theme = theme::find(&cli.theme);
    let config = load_config(&cli, &theme)?;
    let table = load_table(&cli.input).with_context(|| format!("failed to load CSV '{}'", cli.input.display()))?;
    if table.columns.is_empty() {
        anyhow::bail!("no numeric columns in {}", cli.input.display());
    }
    info!("Loaded {} chart(s) from {}", table.columns.len(), cli.input.display());

    let selector = config.container_selector.clone();
    let registry = mount_charts(&table, theme, &selector);
    let engine = ExportEngine::new(
        SkiaRasterizer::new(),
        SkiaPdf::new(),
        DirectorySink::new(&cli.out),
    )
    .with_config(config);

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling export");
            trigger.cancel();
        }
    });

    if let Some(only) = cli.only.as_deref() {
        let chart = registry
            .query(&selector)
            .into_iter()
            .find(|c| c.resolved_title() == only)
            .with_context(|| {
                let titles: Vec<String> = registry.query(&selector).iter().map(|c| c.resolved_title()).collect();
                format!("no chart titled '{only}' (available: {})", titles.join(", "))
            })?;
        let rows = chart.rows().unwrap_or_default();
        let mut request = ExportRequest::new(cli.format, only).target(&*chart.element).rows(&rows);
        if let Some(bg) = cli.background {
            request = request.background(bg);
        }
        if let Some(q) = cli.quality_or_scale {
            request = request.quality_or_scale(q);
        }
        engine
            .export_with_cancel(&request, &cancel)
            .await
            .with_context(|| format!("exporting '{only}' as {}", cli.format))?;
        println!("Exported '{only}' to {}", cli.out.display());
        return Ok(());
    }

    let mut options = BulkOptions::default().with_cancel(cancel);
    if cli.keep_going {
        options = options.with_policy(FailurePolicy::Continue);
    }
    if let Some(bg) = cli.background {
        options = options.with_background(bg);
    }
    options.quality_or_scale = cli.quality_or_scale;

    let bulk = BulkExporter::new(&engine);
    let report = match cli.format {
        ExportFormat::Csv => bulk.export_all_data(&registry, &selector, &options).await,
        format => bulk.export_all(&registry, &selector, format, &options).await,
    }
    .with_context(|| format!("bulk {} export", cli.format))?;

    println!("{}", report.summary());
    if !report.is_complete() {
        anyhow::bail!("{} chart(s) failed to export", report.failed.len());
    }
    Ok(())
}

/// File config, then flag overrides. Without `--background`, an unset background follows the theme.
fn load_config(cli: &Cli, theme: &Theme) -> Result<ExportConfig> {
    let mut config = match &cli.config {
        Some(path) => ExportConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExportConfig::default(),
    };
    if let Some(ms) = cli.delay_ms {
        config.bulk_delay_ms = ms;
    }
    if let Some(label) = &cli.product_label {
        config.product_label = label.clone();
    }
    match cli.background {
        Some(bg) => config.background = bg,
        None if config.background == ExportConfig::default().background => {
            config.background = theme.background_color();
        }
        None => {}
    }
    if config.bulk_delay() < Duration::from_millis(100) {
        warn!("Bulk delay {:?} is short; some download targets drop rapid saves", config.bulk_delay());
    }
    Ok(config.validated())
}

/// One line chart per column, registered in column order and tagged with `marker`.
fn mount_charts(table: &Table, theme: Theme, marker: &str) -> ChartRegistry<ChartView> {
    let registry = ChartRegistry::new();
    for column in &table.columns {
        let view = ChartView::new(column.header.clone())
            .with_theme(theme)
            .with_axes(Axis::new(table.x_header.clone(), 0.0, 1.0), Axis::new("", 0.0, 1.0))
            .with_series(Series::line(column.header.clone(), column.points.clone()))
            .autoscaled();
        let rows = column.rows.clone();
        registry.register(
            ChartHandle::new(Arc::new(view))
                .marker(normalize_selector(marker))
                .title(column.header.clone())
                .data(move || rows.clone()),
        );
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_numeric_column_is_mounted_with_its_data() {
        let table = table::parse_table("year,gdp,cpi\n2020,1.5,2\n2021,2.5,3\n").expect("parse");
        let registry = mount_charts(&table, Theme::light(), "[data-chart-container]");

        let charts = registry.query("data-chart-container");
        let titles: Vec<String> = charts.iter().map(|c| c.resolved_title()).collect();
        assert_eq!(titles, vec!["gdp", "cpi"]);
        assert_eq!(charts[0].element.x_axis.label, "year");
        assert_eq!(charts[1].rows().map(|r| r.len()), Some(2));
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "chart-export",
            "data.csv",
            "--format",
            "jpg",
            "--delay-ms",
            "750",
            "--product-label",
            "City Prices",
            "--background",
            "#121214",
        ]);
        assert_eq!(cli.format, ExportFormat::Jpeg);
        let config = load_config(&cli, &Theme::dark()).expect("config");
        assert_eq!(config.bulk_delay_ms, 750);
        assert_eq!(config.product_label, "City Prices");
        assert_eq!(config.background, Color::rgb(0x12, 0x12, 0x14));
    }

    #[test]
    fn theme_sets_background_unless_overridden() {
        let cli = Cli::parse_from(["chart-export", "data.csv", "--format", "png", "--theme", "dark"]);
        let config = load_config(&cli, &theme::find(&cli.theme)).expect("config");
        assert_eq!(config.background, Theme::dark().background_color());
        assert_ne!(config.background, Color::WHITE);

        let light = Cli::parse_from(["chart-export", "data.csv", "--format", "png"]);
        let config = load_config(&light, &theme::find(&light.theme)).expect("config");
        assert_eq!(config.background, Color::WHITE);
    }

    #[test]
    fn configured_background_beats_theme() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.json");
        std::fs::write(&path, r##"{ "background": "#202020" }"##).expect("write");
        let config_arg = path.to_string_lossy().into_owned();
        let cli = Cli::parse_from(["chart-export", "data.csv", "-f", "pdf", "-c", config_arg.as_str(), "--theme", "dark"]);
        let config = load_config(&cli, &Theme::dark()).expect("config");
        assert_eq!(config.background, Color::rgb(0x20, 0x20, 0x20));
    }
}

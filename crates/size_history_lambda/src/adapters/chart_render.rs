use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::register_font;
use size_history_core::trend::TrendSeries;

use crate::handlers::plotter::TrendRenderer;

const DEFAULT_CHART_SIZE: (u32, u32) = (1000, 600);
const SIZE_AXIS_HEADROOM: f64 = 1.1;
const CHART_FONT_FAMILY: &str = "sans-serif";
/// Chart text font, embedded in the binary.
const CHART_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

static FONT_REGISTRATION: OnceLock<Result<(), String>> = OnceLock::new();

fn ensure_chart_font() -> Result<(), String> {
    FONT_REGISTRATION
        .get_or_init(|| {
            register_font(CHART_FONT_FAMILY, FontStyle::Normal, CHART_FONT)
                .map_err(|_| "Bundled chart font is not a valid TrueType font".to_string())
        })
        .clone()
}

/// Renders trend charts to PNG with `plotters`' bitmap backend.
#[derive(Debug, Clone, Copy)]
pub struct PlottersTrendRenderer {
    size: (u32, u32),
}

impl Default for PlottersTrendRenderer {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHART_SIZE,
        }
    }
}

impl PlottersTrendRenderer {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
        }
    }
}

impl TrendRenderer for PlottersTrendRenderer {
    fn render_png(&self, series: &TrendSeries) -> Result<Vec<u8>, String> {
        ensure_chart_font()?;

        // The bitmap backend encodes by file extension, so render through a scratch file.
        let scratch = tempfile::Builder::new()
            .prefix("size-trend-")
            .suffix(".png")
            .tempfile()
            .map_err(|error| format!("Failed to create temporary chart file: {error}"))?;

        draw_trend_chart(scratch.path(), self.size, series)
            .map_err(|error| format!("Failed to draw trend chart: {error}"))?;

        fs::read(scratch.path()).map_err(|error| format!("Failed to read rendered chart: {error}"))
    }
}

pub fn chart_title(window_seconds: u64) -> String {
    format!("S3 Bucket Size Change in Last {window_seconds} Seconds")
}

pub fn size_axis_upper(series: &TrendSeries) -> f64 {
    (series.size_ceiling() as f64 * SIZE_AXIS_HEADROOM).max(1.0)
}

fn draw_trend_chart(
    path: &Path,
    size: (u32, u32),
    series: &TrendSeries,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let window_seconds = series.window.window_seconds;
    let span = window_seconds as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption(chart_title(window_seconds), (CHART_FONT_FAMILY, 24).into_font())
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(96)
        .build_cartesian_2d(-span..0f64, 0f64..size_axis_upper(series))?;

    chart
        .configure_mesh()
        .x_desc("Relative Time (seconds)")
        .y_desc("Size (Bytes)")
        .draw()?;

    let points: Vec<(f64, f64)> = series
        .points
        .iter()
        .map(|point| (point.relative_seconds, point.size_bytes as f64))
        .collect();

    chart
        .draw_series(LineSeries::new(points.clone(), &BLUE))?
        .label(format!("Bucket Size (Last {window_seconds} seconds)"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    // A single observation has no line segment; markers keep it visible.
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
    )?;

    let historical_max = series.historical_max_bytes as f64;
    chart
        .draw_series(DashedLineSeries::new(
            vec![(-span, historical_max), (0.0, historical_max)],
            8,
            6,
            RED.stroke_width(2),
        ))?
        .label("Historical High")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

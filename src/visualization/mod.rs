//! Visualization tools for sensor series.
//!
//! This module renders line plots of normalized sensor traces as PNG images
//! using the plotters library. Sample-category regions are drawn as shaded
//! vertical bands below the traces, and injection interval boundaries as
//! vertical markers.
//!
//! Captions, axis text and the legend need a font backend and are only drawn
//! when the crate is built with the `labels` feature. The legend itself is
//! always returned in the [`PlotSummary`] so callers can print it.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::core::series::{Baseline, IntervalId, NormalizedTrace, Region, SampleCategory, SensorSeries};
use crate::core::transforms::{
    derive_regions, interval_boundaries, normalize, normalize_sensor_per_interval,
    select_interval, shift_time, value_bounds,
};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Empty sensor series")]
    EmptySeries,

    #[error("No data for injection interval {0}")]
    EmptyInterval(IntervalId),

    #[error("Unknown sensor: {0}")]
    UnknownSensor(String),
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Color palette for trace lines.
const TRACE_COLORS: &[(u8, u8, u8)] = &[
    (31, 119, 180),  // Blue
    (255, 127, 14),  // Orange
    (44, 160, 44),   // Green
    (214, 39, 40),   // Red
    (148, 103, 189), // Purple
    (140, 86, 75),   // Brown
    (227, 119, 194), // Pink
    (127, 127, 127), // Gray
    (188, 189, 34),  // Olive
    (23, 190, 207),  // Cyan
];

/// Interval boundary marker color.
const MARKER_COLOR: RGBColor = RGBColor(255, 0, 0);

/// One legend row: category label and band colour (r, g, b, alpha).
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: (u8, u8, u8, f64),
}

/// What was drawn into a plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSummary {
    pub title: String,
    pub traces: usize,
    pub regions: Vec<Region>,
    pub markers: usize,
    pub legend: Vec<LegendEntry>,
}

struct Figure<'a> {
    title: String,
    x_desc: &'a str,
    y_desc: &'a str,
    traces: &'a [NormalizedTrace],
    regions: &'a [Region],
    markers: &'a [f64],
}

/// Plot every sensor of the series over time.
///
/// The whole series is one baseline window. Region bands and interval
/// markers follow the same (possibly shifted) time axis as the traces.
pub fn plot_series(
    output_path: &Path,
    series: &SensorSeries,
    baseline: Baseline,
    config: &PlotConfig,
) -> Result<PlotSummary> {
    if series.is_empty() {
        return Err(VisualizationError::EmptySeries);
    }

    let axis_series = time_adjusted(series, baseline);
    let traces = normalize(series, baseline);
    let regions = derive_regions(&axis_series);
    let markers = interval_boundaries(&axis_series);

    render(
        output_path,
        &Figure {
            title: title_for("Sensor values over time", baseline),
            x_desc: x_desc(baseline),
            y_desc: y_desc(baseline),
            traces: &traces,
            regions: &regions,
            markers: &markers,
        },
        config,
    )
}

/// Plot every sensor of one injection interval.
///
/// # Errors
///
/// Returns [`VisualizationError::EmptyInterval`] when no row has `interval_id`.
pub fn plot_interval(
    output_path: &Path,
    series: &SensorSeries,
    interval_id: &IntervalId,
    baseline: Baseline,
    config: &PlotConfig,
) -> Result<PlotSummary> {
    let window = select_interval(series, interval_id);
    if window.is_empty() {
        return Err(VisualizationError::EmptyInterval(interval_id.clone()));
    }

    let traces = normalize(&window, baseline);
    let regions = derive_regions(&time_adjusted(&window, baseline));

    render(
        output_path,
        &Figure {
            title: title_for(&format!("Sensor values - injection interval {}", interval_id), baseline),
            x_desc: x_desc(baseline),
            y_desc: y_desc(baseline),
            traces: &traces,
            regions: &regions,
            markers: &[],
        },
        config,
    )
}

/// Overlay one sensor across all injection intervals, one line per interval.
///
/// Each interval is baselined on its own samples.
pub fn plot_sensor_by_interval(
    output_path: &Path,
    series: &SensorSeries,
    sensor: &str,
    baseline: Baseline,
    config: &PlotConfig,
) -> Result<PlotSummary> {
    if series.is_empty() {
        return Err(VisualizationError::EmptySeries);
    }

    let traces = normalize_sensor_per_interval(series, sensor, baseline)
        .ok_or_else(|| VisualizationError::UnknownSensor(sensor.to_string()))?;

    render(
        output_path,
        &Figure {
            title: title_for(&format!("{} per injection interval", sensor), baseline),
            x_desc: x_desc(baseline),
            y_desc: y_desc(baseline),
            traces: &traces,
            regions: &[],
            markers: &[],
        },
        config,
    )
}

/// Legend rows for a set of regions: every known category, then any unknown
/// categories in order of first appearance.
pub fn legend_entries(regions: &[Region]) -> Vec<LegendEntry> {
    let mut categories: Vec<SampleCategory> = SampleCategory::KNOWN.to_vec();
    for region in regions {
        if !categories.contains(&region.category) {
            categories.push(region.category.clone());
        }
    }

    categories
        .into_iter()
        .map(|category| LegendEntry {
            label: category.label(),
            color: category.color(),
        })
        .collect()
}

fn time_adjusted(series: &SensorSeries, baseline: Baseline) -> SensorSeries {
    if baseline.shifts_time() {
        shift_time(series)
    } else {
        series.clone()
    }
}

fn title_for(base: &str, baseline: Baseline) -> String {
    match baseline {
        Baseline::None => base.to_string(),
        Baseline::Start => format!("{} (aligned to start)", base),
        Baseline::End => format!("{} (aligned to end)", base),
    }
}

fn x_desc(baseline: Baseline) -> &'static str {
    if baseline.shifts_time() {
        "Relative time (s)"
    } else {
        "Time (s)"
    }
}

fn y_desc(baseline: Baseline) -> &'static str {
    match baseline {
        Baseline::None => "Nanometer",
        Baseline::Start => "Δ sensor value (to start)",
        Baseline::End => "Δ sensor value (to end)",
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

fn render(output_path: &Path, figure: &Figure<'_>, config: &PlotConfig) -> Result<PlotSummary> {
    let (x_min, x_max, y_min, y_max) = compute_bounds(figure.traces, figure.regions);
    let x_padding = (x_max - x_min) * 0.02;
    let y_padding = (y_max - y_min) * 0.05;
    let (y_lo, y_hi) = (y_min - y_padding, y_max + y_padding);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(10);
    if cfg!(feature = "labels") {
        builder
            .caption(&figure.title, ("sans-serif", 28))
            .x_label_area_size(45)
            .y_label_area_size(70);
    }

    let mut chart = builder
        .build_cartesian_2d((x_min - x_padding)..(x_max + x_padding), y_lo..y_hi)
        .map_err(plot_err)?;

    if cfg!(feature = "labels") {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc(figure.x_desc)
            .y_desc(figure.y_desc)
            .draw()
            .map_err(plot_err)?;
    }

    // Bands go first so the traces stay on top
    let legend = legend_entries(figure.regions);
    for entry in &legend {
        let (r, g, b, a) = entry.color;
        let fill = RGBAColor(r, g, b, (a * config.band_opacity).clamp(0.0, 1.0));
        let bands = figure
            .regions
            .iter()
            .filter(|region| region.category.label() == entry.label)
            .map(move |region| {
                Rectangle::new(
                    [(region.start_time, y_lo), (region.end_time, y_hi)],
                    fill.filled(),
                )
            });

        // Legend swatch uses the unscaled colour so it stays visible
        let swatch = RGBAColor(r, g, b, a.max(0.3));
        chart
            .draw_series(bands)
            .map_err(plot_err)?
            .label(entry.label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], swatch.filled()));
    }

    let marker_style = MARKER_COLOR.stroke_width(config.marker_width);
    if !figure.markers.is_empty() {
        chart
            .draw_series(
                figure
                    .markers
                    .iter()
                    .map(|&t| PathElement::new(vec![(t, y_lo), (t, y_hi)], marker_style)),
            )
            .map_err(plot_err)?
            .label("Injection change")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], marker_style));
    }

    for (i, trace) in figure.traces.iter().enumerate() {
        let c = TRACE_COLORS[i % TRACE_COLORS.len()];
        let style = RGBColor(c.0, c.1, c.2).stroke_width(config.line_width);
        let points = trace
            .x
            .iter()
            .zip(trace.y.iter())
            .filter(|(x, y)| !x.is_nan() && !y.is_nan())
            .map(|(&x, &y)| (x, y));

        chart
            .draw_series(LineSeries::new(points, style))
            .map_err(plot_err)?
            .label(trace.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], style));
    }

    if cfg!(feature = "labels") {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;

    log::info!(
        "Wrote {} ({} traces, {} regions, {} markers)",
        output_path.display(),
        figure.traces.len(),
        figure.regions.len(),
        figure.markers.len()
    );

    Ok(PlotSummary {
        title: figure.title.clone(),
        traces: figure.traces.len(),
        regions: figure.regions.to_vec(),
        markers: figure.markers.len(),
        legend,
    })
}

/// Compute the bounds (min/max) for x and y over traces and regions.
fn compute_bounds(traces: &[NormalizedTrace], regions: &[Region]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;

    let xs = traces
        .iter()
        .flat_map(|t| t.x.iter().copied())
        .chain(regions.iter().flat_map(|r| [r.start_time, r.end_time]))
        .filter(|x| !x.is_nan());
    for x in xs {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
    }

    let (mut y_min, mut y_max) = value_bounds(traces).unwrap_or((0.0, 0.0));

    if x_min > x_max {
        x_min = 0.0;
        x_max = 0.0;
    }
    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}

//! Injection-segmented transforms over sensor series.
//!
//! This module slices a [`SensorSeries`] by injection interval, applies a
//! [`Baseline`] policy to every sensor column and derives the contiguous
//! sample-category regions used for annotation bands. Everything here is a
//! pure function: inputs are borrowed, results are freshly allocated.

use std::collections::HashMap;

use super::series::{Baseline, IntervalId, NormalizedTrace, Region, SensorSeries};

/// Keep the rows belonging to one injection interval, preserving order.
///
/// Returns an empty series (same sensor names, no rows) when nothing matches;
/// callers must check [`SensorSeries::is_empty`] before taking baselines.
pub fn select_interval(series: &SensorSeries, interval_id: &IntervalId) -> SensorSeries {
    let indices: Vec<usize> = series
        .interval()
        .iter()
        .enumerate()
        .filter(|(_, id)| *id == interval_id)
        .map(|(i, _)| i)
        .collect();

    if indices.is_empty() {
        return series.empty_like();
    }

    series.take_rows(&indices)
}

/// Apply a baseline policy to every sensor of the series.
///
/// The whole series is treated as one window:
/// - `None`: raw time, raw values
/// - `Start`: time relative to the first sample, values minus the first value
/// - `End`: time relative to the first sample, values minus the last value
///
/// Traces are returned in sensor column order. An empty series yields empty
/// traces.
pub fn normalize(series: &SensorSeries, baseline: Baseline) -> Vec<NormalizedTrace> {
    let x = time_axis(series.time(), baseline);

    series
        .sensors()
        .iter()
        .map(|sensor| NormalizedTrace {
            name: sensor.name.clone(),
            x: x.clone(),
            y: apply_baseline(&sensor.values, baseline),
        })
        .collect()
}

/// Normalize each injection interval independently.
///
/// Every interval's own first/last sample is its baseline, so values never
/// leak across interval boundaries.
pub fn normalize_per_interval(
    series: &SensorSeries,
    baseline: Baseline,
) -> Vec<(IntervalId, Vec<NormalizedTrace>)> {
    group_by_interval(series)
        .into_iter()
        .map(|(id, group)| {
            let traces = normalize(&group, baseline);
            (id, traces)
        })
        .collect()
}

/// One trace per interval for a single sensor, named `Inj <id>`.
///
/// Returns `None` when the sensor does not exist.
pub fn normalize_sensor_per_interval(
    series: &SensorSeries,
    sensor: &str,
    baseline: Baseline,
) -> Option<Vec<NormalizedTrace>> {
    series.sensor(sensor)?;

    let traces = group_by_interval(series)
        .into_iter()
        .filter_map(|(id, group)| {
            let column = group.sensor(sensor)?;
            Some(NormalizedTrace {
                name: format!("Inj {}", id),
                x: time_axis(group.time(), baseline),
                y: apply_baseline(&column.values, baseline),
            })
        })
        .collect();

    Some(traces)
}

/// Find a trace by sensor name.
pub fn find_trace<'a>(traces: &'a [NormalizedTrace], name: &str) -> Option<&'a NormalizedTrace> {
    traces.iter().find(|t| t.name == name)
}

/// Split the series into contiguous sample-category regions.
///
/// A region closes at the timestamp of the first row with a different
/// category, so consecutive regions share their boundary and together cover
/// `[time[0], time[N-1]]`. The last region ends at the last timestamp.
pub fn derive_regions(series: &SensorSeries) -> Vec<Region> {
    let time = series.time();
    let category = series.category();

    let (Some(&first_time), Some(first_category)) = (time.first(), category.first()) else {
        return Vec::new();
    };

    let mut regions = Vec::new();
    let mut current = first_category;
    let mut start_time = first_time;

    for i in 1..time.len() {
        if category[i] != *current {
            regions.push(Region {
                start_time,
                end_time: time[i],
                category: current.clone(),
            });
            current = &category[i];
            start_time = time[i];
        }
    }

    regions.push(Region {
        start_time,
        end_time: time[time.len() - 1],
        category: current.clone(),
    });

    regions
}

/// Group rows by injection interval.
///
/// Groups appear in the order their interval id is first seen; rows inside a
/// group keep their original order. Empty groups are never emitted.
pub fn group_by_interval(series: &SensorSeries) -> Vec<(IntervalId, SensorSeries)> {
    let mut order: Vec<IntervalId> = Vec::new();
    let mut rows: HashMap<&IntervalId, Vec<usize>> = HashMap::new();

    for (i, id) in series.interval().iter().enumerate() {
        rows.entry(id)
            .or_insert_with(|| {
                order.push(id.clone());
                Vec::new()
            })
            .push(i);
    }

    order
        .into_iter()
        .filter_map(|id| {
            let indices = rows.get(&id)?;
            if indices.is_empty() {
                return None;
            }
            let group = series.take_rows(indices);
            Some((id, group))
        })
        .collect()
}

/// Timestamps at which the interval id changes from the previous row.
pub fn interval_boundaries(series: &SensorSeries) -> Vec<f64> {
    let time = series.time();
    series
        .interval()
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] != pair[1])
        .map(|(i, _)| time[i + 1])
        .collect()
}

/// Copy of the series with time relative to its first sample.
pub fn shift_time(series: &SensorSeries) -> SensorSeries {
    series.with_time(time_axis(series.time(), Baseline::Start))
}

/// Minimum and maximum `y` over all traces, ignoring NaN.
pub fn value_bounds(traces: &[NormalizedTrace]) -> Option<(f64, f64)> {
    traces
        .iter()
        .flat_map(|t| t.y.iter().copied())
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn time_axis(time: &[f64], baseline: Baseline) -> Vec<f64> {
    match (baseline, time.first()) {
        (Baseline::None, _) | (_, None) => time.to_vec(),
        (_, Some(&t0)) => time.iter().map(|&t| t - t0).collect(),
    }
}

fn apply_baseline(values: &[f64], baseline: Baseline) -> Vec<f64> {
    let reference = match baseline {
        Baseline::None => None,
        Baseline::Start => values.first().copied(),
        Baseline::End => values.last().copied(),
    };

    match reference {
        Some(r) => values.iter().map(|&v| v - r).collect(),
        None => values.to_vec(),
    }
}

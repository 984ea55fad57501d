//! Data writers for CSV and JSON formats.
//!
//! This module provides functions for writing measurement data to files:
//! - CSV with the time, sensor, interval and category columns of a series
//! - CSV from raw text rows (instrument output conversion)
//! - Pretty-printed JSON sidecar files

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::config::ColumnConfig;
use super::series::SensorSeries;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// JSON serialization error.
    #[error("JSON write error for '{path}': {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    ensure_parent_dirs(path)?;
    let buf_writer = create_buffered_writer(path)?;
    Ok(csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(buf_writer))
}

/// Write a sensor series to CSV.
///
/// Columns are written as time, sensors (in series order), interval and
/// category, using the names from `columns`. NaN readings become empty
/// cells so the file loads back the same way.
///
/// # Errors
///
/// Returns an error if the file or its parent directories cannot be created
/// or written to.
pub fn write_series_csv(path: &Path, series: &SensorSeries, columns: &ColumnConfig) -> Result<()> {
    let mut writer = csv_writer(path)?;
    let path_str = path.display().to_string();

    let mut header = Vec::with_capacity(series.sensors().len() + 3);
    header.push(columns.time_column.clone());
    header.extend(series.sensors().iter().map(|s| s.name.clone()));
    header.push(columns.interval_column.clone());
    header.push(columns.category_column.clone());

    writer.write_record(&header).map_err(|e| WriteError::CsvError {
        path: path_str.clone(),
        source: e,
    })?;

    for i in 0..series.len() {
        let mut record = Vec::with_capacity(header.len());
        record.push(format_number(series.time()[i]));
        record.extend(series.sensors().iter().map(|s| format_number(s.values[i])));
        record.push(series.interval()[i].to_string());
        record.push(series.category()[i].code());

        writer.write_record(&record).map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write raw text rows to a comma-delimited CSV, one record per row.
///
/// Rows may have different widths.
pub fn write_table_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    let path_str = path.display().to_string();

    for row in rows {
        writer.write_record(row).map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write a value as pretty-printed JSON (2-space indent, UTF-8).
///
/// # Example
///
/// ```no_run
/// use biosense_pipeline::core::writers::write_json;
/// use std::collections::BTreeMap;
/// use std::path::Path;
///
/// let mut value = BTreeMap::new();
/// value.insert("raw", "201253_25112022");
/// write_json(Path::new("201253_25112022.json"), &value).unwrap();
/// ```
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;
    let path_str = path.display().to_string();

    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| WriteError::JsonError {
        path: path_str.clone(),
        source: e,
    })?;
    writeln!(writer).map_err(|e| WriteError::WriteFile {
        path: path_str.clone(),
        source: e,
    })?;

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::load_series;
    use crate::core::series::{IntervalId, SampleCategory, SensorColumn};
    use std::fs;
    use tempfile::tempdir;

    fn create_test_series() -> SensorSeries {
        SensorSeries::new(
            vec![0.0, 0.5, 1.0],
            vec![
                SensorColumn {
                    name: "S1".to_string(),
                    values: vec![10.0, f64::NAN, 12.25],
                },
                SensorColumn {
                    name: "S2".to_string(),
                    values: vec![1.0, 2.0, 3.0],
                },
            ],
            vec![IntervalId::from(1), IntervalId::from(1), IntervalId::from(2)],
            vec![
                SampleCategory::Negative,
                SampleCategory::Other("x".to_string()),
                SampleCategory::Urea,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_write_series_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let columns = ColumnConfig::default();

        write_series_csv(&path, &create_test_series(), &columns).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "T  (s),S1,S2,Inj.,Val.");
        assert_eq!(lines[1], "0,10,1,1,1");
        assert_eq!(lines[2], "0.5,,2,1,x");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_written_series_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let columns = ColumnConfig {
            sensor_column_count: 2,
            ..ColumnConfig::default()
        };
        let series = create_test_series();

        write_series_csv(&path, &series, &columns).unwrap();
        let loaded = load_series(&path, &columns).unwrap();

        assert_eq!(loaded.time(), series.time());
        assert_eq!(loaded.interval(), series.interval());
        assert_eq!(loaded.category(), series.category());
        assert_eq!(loaded.sensor("S1").unwrap().values[2], 12.25);
    }

    #[test]
    fn test_write_table_csv_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let rows = vec![
            vec!["a".to_string(), "b c".to_string()],
            vec!["1".to_string()],
        ];

        write_table_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["a,b c", "1"]);
    }

    #[test]
    fn test_write_json_pretty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.json");
        let value = serde_json::json!({ "raw": "Grüße", "width": 12 });

        write_json(&path, &value).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"raw\": \"Grüße\""));
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["width"], 12);
    }
}

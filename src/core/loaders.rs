//! Data loaders for delimited measurement files.
//!
//! This module provides parsers for:
//! - Converted measurement CSVs (time, sensor, interval and category columns)
//! - Generic delimited tables (header plus rows of text cells)
//! - Raw instrument output, read row for row without header handling

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use thiserror::Error;

use crate::config::{ColumnConfig, Delimiter};
use super::series::{IntervalId, SampleCategory, SensorColumn, SensorSeries, SeriesError};

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Parse error at row {row}, column '{column}': {value:?} is not a number")]
    ParseError {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Inconsistent series: {0}")]
    Series(#[from] SeriesError),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// A delimited table held as text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Trimmed header names.
    pub headers: Vec<String>,
    /// Data rows; rows may be shorter or longer than the header.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of header columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Number of data rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Index of the column whose trimmed name equals the trimmed `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h == name)
    }

    /// Cell text, empty when the row is short.
    ///
    /// # Panics
    ///
    /// Panics if `row` is not below [`Table::height`].
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(String::as_str).unwrap_or("")
    }
}

/// Load a delimited table with a header row.
///
/// When `delimiter` is `None` it is sniffed from the header line (see
/// [`Delimiter::sniff`]). Cells are trimmed, so whitespace following a
/// delimiter is skipped.
pub fn load_table<P: AsRef<Path>>(path: P, delimiter: Option<Delimiter>) -> Result<Table> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let delimiter = delimiter.unwrap_or_else(|| {
        Delimiter::sniff(content.lines().next().unwrap_or_default())
    });

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter.as_byte())
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    let mut rows = Vec::with_capacity(1024);
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

/// Read every row of a raw delimited file verbatim, header included.
///
/// The first `skip_rows` lines (instrument preamble) are dropped before
/// parsing. Leading whitespace of each cell is dropped; row widths may vary.
pub fn load_raw_rows<P: AsRef<Path>>(
    path: P,
    delimiter: Delimiter,
    skip_rows: usize,
) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let body: String = content.split_inclusive('\n').skip(skip_rows).collect();

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter.as_byte())
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|cell| cell.trim_start().to_string()).collect());
    }

    if rows.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(rows)
}

/// Load a converted measurement file into a [`SensorSeries`].
///
/// Columns are resolved by name for time, interval and category. Sensor
/// columns are the configured names, or the positional range
/// `sensor_column_start..sensor_column_start + sensor_column_count`.
/// Empty numeric cells become NaN; any other unparsable cell is an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks required columns,
/// holds no data rows or contains a non-numeric time/sensor cell.
pub fn load_series<P: AsRef<Path>>(path: P, columns: &ColumnConfig) -> Result<SensorSeries> {
    let path = path.as_ref();
    let table = load_table(path, columns.delimiter)?;
    let series = table_to_series(&table, columns)?;

    if series.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    log::debug!(
        "Loaded {} rows x {} sensors from {}",
        series.len(),
        series.sensors().len(),
        path.display()
    );

    Ok(series)
}

/// Resolve the sensor column indices for a table.
pub fn sensor_column_indices(table: &Table, columns: &ColumnConfig) -> Result<Vec<usize>> {
    if !columns.sensor_columns.is_empty() {
        let mut indices = Vec::with_capacity(columns.sensor_columns.len());
        let mut missing = Vec::new();
        for name in &columns.sensor_columns {
            match table.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(LoaderError::MissingColumns(missing.join(", ")));
        }
        return Ok(indices);
    }

    let start = columns.sensor_column_start;
    let end = start.saturating_add(columns.sensor_column_count);
    if end > table.width() {
        return Err(LoaderError::MissingColumns(format!(
            "sensor columns {}..{} (file has {} columns)",
            start,
            end,
            table.width()
        )));
    }

    Ok((start..end).collect())
}

/// Build a series from an already loaded table.
pub fn table_to_series(table: &Table, columns: &ColumnConfig) -> Result<SensorSeries> {
    let required = [
        &columns.time_column,
        &columns.interval_column,
        &columns.category_column,
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(LoaderError::MissingColumns(missing.join(", ")));
    }

    // Presence checked above
    let time_idx = table.column_index(&columns.time_column).unwrap_or_default();
    let interval_idx = table.column_index(&columns.interval_column).unwrap_or_default();
    let category_idx = table.column_index(&columns.category_column).unwrap_or_default();
    let sensor_idx = sensor_column_indices(table, columns)?;

    let n = table.height();
    let mut time = Vec::with_capacity(n);
    let mut interval = Vec::with_capacity(n);
    let mut category = Vec::with_capacity(n);
    let mut sensors: Vec<SensorColumn> = sensor_idx
        .iter()
        .map(|&idx| SensorColumn {
            name: table.headers[idx].clone(),
            values: Vec::with_capacity(n),
        })
        .collect();

    for row in 0..n {
        time.push(parse_number(table, row, time_idx)?);
        for (sensor, &idx) in sensors.iter_mut().zip(sensor_idx.iter()) {
            sensor.values.push(parse_number(table, row, idx)?);
        }
        interval.push(IntervalId::parse(table.cell(row, interval_idx)));
        category.push(SampleCategory::from_code(table.cell(row, category_idx)));
    }

    Ok(SensorSeries::new(time, sensors, interval, category)?)
}

fn parse_number(table: &Table, row: usize, col: usize) -> Result<f64> {
    let cell = table.cell(row, col);
    if cell.is_empty() {
        return Ok(f64::NAN);
    }

    cell.parse().map_err(|_| LoaderError::ParseError {
        // 1-based data row, header excluded
        row: row + 1,
        column: table.headers.get(col).cloned().unwrap_or_default(),
        value: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    fn small_columns() -> ColumnConfig {
        ColumnConfig {
            sensor_column_count: 2,
            ..ColumnConfig::default()
        }
    }

    #[test]
    fn test_load_series_comma() -> Result<()> {
        let file = write_temp(
            "T  (s),S1,S2,Inj.,Val.\n\
             0.0,10,20,1,1\n\
             0.5,11,21,1,2\n\
             1.0,12,22,2,2\n",
        );

        let series = load_series(file.path(), &small_columns())?;
        assert_eq!(series.len(), 3);
        assert_eq!(series.time(), &[0.0, 0.5, 1.0]);
        assert_eq!(series.sensor_names(), vec!["S1", "S2"]);
        assert_eq!(series.sensor("S2").unwrap().values, vec![20.0, 21.0, 22.0]);
        assert_eq!(series.interval()[2], IntervalId::from(2));
        assert_eq!(series.category()[1], SampleCategory::Positive);

        Ok(())
    }

    #[test]
    fn test_load_series_tab_with_padding() -> Result<()> {
        let file = write_temp(
            "T  (s)\tS1\tS2\tInj.\tVal.\n\
             0\t  1.5\t 2.5\t1.0\t3\n",
        );

        let series = load_series(file.path(), &small_columns())?;
        assert_eq!(series.sensor("S1").unwrap().values, vec![1.5]);
        assert_eq!(series.interval()[0], IntervalId::from(1));
        assert_eq!(series.category()[0], SampleCategory::Urea);

        Ok(())
    }

    #[test]
    fn test_load_series_named_sensors() -> Result<()> {
        let file = write_temp("Inj.,Val.,T  (s),A,B\n1,1,0,5,6\n");
        let columns = ColumnConfig {
            sensor_columns: vec!["B".to_string()],
            ..ColumnConfig::default()
        };

        let series = load_series(file.path(), &columns)?;
        assert_eq!(series.sensor_names(), vec!["B"]);
        assert_eq!(series.sensor("B").unwrap().values, vec![6.0]);

        Ok(())
    }

    #[test]
    fn test_load_series_missing_columns() {
        let file = write_temp("T  (s),S1,S2\n0,1,2\n");

        match load_series(file.path(), &small_columns()) {
            Err(LoaderError::MissingColumns(names)) => {
                assert!(names.contains("Inj."));
                assert!(names.contains("Val."));
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_load_series_positional_range_too_wide() {
        let file = write_temp("T  (s),S1,Inj.,Val.\n0,1,1,1\n");

        let result = load_series(file.path(), &ColumnConfig::default());
        assert!(matches!(result, Err(LoaderError::MissingColumns(_))));

        let unbounded = ColumnConfig {
            sensor_column_start: 2,
            sensor_column_count: usize::MAX,
            ..ColumnConfig::default()
        };
        let result = load_series(file.path(), &unbounded);
        assert!(matches!(result, Err(LoaderError::MissingColumns(_))));
    }

    #[test]
    fn test_load_series_bad_number() {
        let file = write_temp("T  (s),S1,S2,Inj.,Val.\n0,1,2,1,1\n0.5,oops,2,1,1\n");

        match load_series(file.path(), &small_columns()) {
            Err(LoaderError::ParseError { row, column, value }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "S1");
                assert_eq!(value, "oops");
            }
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_series_empty_cells_are_nan() -> Result<()> {
        let file = write_temp("T  (s),S1,S2,Inj.,Val.\n0,,2,1,1\n");

        let series = load_series(file.path(), &small_columns())?;
        assert!(series.sensor("S1").unwrap().values[0].is_nan());

        Ok(())
    }

    #[test]
    fn test_load_series_header_only() {
        let file = write_temp("T  (s),S1,S2,Inj.,Val.\n");

        let result = load_series(file.path(), &small_columns());
        assert!(matches!(result, Err(LoaderError::EmptyFile(_))));
    }

    #[test]
    fn test_load_table_shape() -> Result<()> {
        let file = write_temp("a;b;c\n1;2;3\n4;5\n\n");

        let table = load_table(file.path(), None)?;
        assert_eq!(table.width(), 3);
        assert_eq!(table.height(), 2);
        assert_eq!(table.column_index(" b "), Some(1));
        assert_eq!(table.cell(1, 2), "");

        Ok(())
    }

    #[test]
    fn test_load_raw_rows() -> Result<()> {
        let file = write_temp("T  (s)\t  S1\n0\t 1.25\n");

        let rows = load_raw_rows(file.path(), Delimiter::Tab, 0)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["T  (s)", "S1"]);
        assert_eq!(rows[1], vec!["0", "1.25"]);

        Ok(())
    }

    #[test]
    fn test_load_raw_rows_empty() {
        let file = write_temp("");
        let result = load_raw_rows(file.path(), Delimiter::Tab, 0);
        assert!(matches!(result, Err(LoaderError::EmptyFile(_))));
    }

    #[test]
    fn test_load_raw_rows_skips_preamble() -> Result<()> {
        let file = write_temp("Device: X1, \"quoted\nnote\nSerial\t42\nT  (s)\tS1\n0\t1.5\n");

        let rows = load_raw_rows(file.path(), Delimiter::Tab, 3)?;
        assert_eq!(rows, vec![vec!["T  (s)", "S1"], vec!["0", "1.5"]]);

        let beyond = load_raw_rows(file.path(), Delimiter::Tab, 10);
        assert!(matches!(beyond, Err(LoaderError::EmptyFile(_))));

        Ok(())
    }
}

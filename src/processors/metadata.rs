//! JSON metadata sidecars for converted measurement files.
//!
//! A sidecar sits next to its CSV (`<stem>.json`) and records hand-entered
//! experiment details together with values derived from the file itself:
//! the acquisition date embedded in the file name and the table's shape.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ColumnConfig, MetadataConfig};
use crate::core::loaders::{load_table, LoaderError, Table};
use crate::core::series::IntervalId;
use crate::core::writers::{write_json, WriteError};

/// Format of the date token embedded in file names (`..._DDMMYYYY.csv`).
pub const FILE_DATE_FORMAT: &str = "%d%m%Y";

/// Format of manually entered dates and of the `date` field.
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur while producing a sidecar.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Could not find input directory: {0}")]
    InputDirectoryNotFound(PathBuf),

    #[error("Could not find input file: {0}")]
    InputFileNotFound(PathBuf),

    #[error("Could not find output directory: {0}")]
    OutputDirectoryNotFound(PathBuf),

    #[error("Could not create output directory '{path}': {source}")]
    CreateOutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Contents of a metadata sidecar file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// File stem of the measurement CSV.
    pub raw: String,
    pub origin_file_id: String,
    pub short_file_id: String,
    /// `YYYY-MM-DD`, or empty when unknown.
    pub date: String,
    /// Number of columns.
    pub width: usize,
    /// Number of data rows.
    pub height: usize,
    pub col_names: Vec<String>,
    pub injections: String,
    pub rounds: String,
}

/// Result of looking for a date token in a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateExtraction {
    /// Token found and valid, formatted as `YYYY-MM-DD`.
    Found(String),
    /// Eight digits found but they are not a valid day-month-year date.
    Invalid(String),
    /// No `_DDMMYYYY` token in the name.
    Missing,
}

fn date_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_(\d{8})").unwrap())
}

/// Extract the acquisition date from a file name such as `201253_25112022.csv`.
pub fn extract_date(file_name: &str) -> DateExtraction {
    let Some(captures) = date_token_pattern().captures(file_name) else {
        return DateExtraction::Missing;
    };
    let token = &captures[1];

    match NaiveDate::parse_from_str(token, FILE_DATE_FORMAT) {
        Ok(date) => DateExtraction::Found(date.format(OUTPUT_DATE_FORMAT).to_string()),
        Err(_) => DateExtraction::Invalid(token.to_string()),
    }
}

/// Parse a manually entered `YYYY-MM-DD` date.
pub fn parse_manual_date(text: &str) -> Option<String> {
    NaiveDate::parse_from_str(text.trim(), OUTPUT_DATE_FORMAT)
        .ok()
        .map(|date| date.format(OUTPUT_DATE_FORMAT).to_string())
}

/// Date written to the sidecar.
///
/// A manual date wins over the file name. Invalid input on either path is
/// logged and yields an empty date; it never fails the run.
pub fn resolve_date(file_name: &str, manual_date: Option<&str>) -> String {
    if let Some(manual) = manual_date.filter(|m| !m.trim().is_empty()) {
        return parse_manual_date(manual).unwrap_or_else(|| {
            warn!("Invalid date format: {}. Continuing without date.", manual);
            String::new()
        });
    }

    match extract_date(file_name) {
        DateExtraction::Found(date) => date,
        DateExtraction::Invalid(token) => {
            warn!(
                "Could not extract date from {} (token {}). Continuing without date.",
                file_name, token
            );
            String::new()
        }
        DateExtraction::Missing => String::new(),
    }
}

/// Check the input directory and file, and make sure the output directory exists.
///
/// A missing output directory is created when `create_output_dir` is set,
/// otherwise it is an error.
pub fn validate_directories(
    input_dir: &Path,
    output_dir: &Path,
    file_name: &str,
    create_output_dir: bool,
) -> Result<()> {
    if !input_dir.is_dir() {
        return Err(MetadataError::InputDirectoryNotFound(input_dir.to_path_buf()));
    }

    let input_file = input_dir.join(file_name);
    if !input_file.is_file() {
        return Err(MetadataError::InputFileNotFound(input_file));
    }

    if !output_dir.is_dir() {
        if !create_output_dir {
            return Err(MetadataError::OutputDirectoryNotFound(output_dir.to_path_buf()));
        }
        fs::create_dir_all(output_dir).map_err(|e| MetadataError::CreateOutputDirectory {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        info!("New directory for output created: {}", output_dir.display());
    }

    Ok(())
}

/// Largest numeric interval id in the table, if the interval column exists.
pub fn max_interval(table: &Table, columns: &ColumnConfig) -> Option<f64> {
    let idx = table.column_index(&columns.interval_column)?;
    (0..table.height())
        .filter_map(|row| IntervalId::parse(table.cell(row, idx)).as_number())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}

/// Compare the entered injection count with the file's largest interval id.
///
/// Returns `(entered, found)` when both are numeric and disagree.
pub fn injection_mismatch(
    table: &Table,
    columns: &ColumnConfig,
    injections: &str,
) -> Option<(i64, f64)> {
    let entered: i64 = injections.trim().parse().ok()?;
    let found = max_interval(table, columns)?;
    if (found - entered as f64).abs() > f64::EPSILON {
        Some((entered, found))
    } else {
        None
    }
}

/// Assemble the sidecar contents for a measurement CSV.
pub fn build_metadata(
    csv_path: &Path,
    config: &MetadataConfig,
    columns: &ColumnConfig,
) -> Result<Metadata> {
    let table = load_table(csv_path, columns.delimiter).map_err(|e| MetadataError::Load {
        path: csv_path.to_path_buf(),
        source: e,
    })?;

    let file_name = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let raw = csv_path
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let start = config.col_names_start.min(table.width());
    let end = config
        .col_names_start
        .saturating_add(config.col_names_count)
        .min(table.width());
    let col_names = table.headers[start..end].to_vec();

    if let Some((entered, found)) = injection_mismatch(&table, columns, &config.injections) {
        warn!(
            "The maximum injection value in the file ({}) does not match the entered injections ({}).",
            found, entered
        );
    }

    Ok(Metadata {
        raw,
        origin_file_id: config.origin_file_id.clone(),
        short_file_id: config.short_file_id.clone(),
        date: resolve_date(&file_name, config.manual_date.as_deref()),
        width: table.width(),
        height: table.height(),
        col_names,
        injections: config.injections.clone(),
        rounds: config.rounds.clone(),
    })
}

/// Path of the sidecar for `csv_path` inside `output_dir`.
pub fn sidecar_path(output_dir: &Path, csv_path: &Path) -> PathBuf {
    let stem = csv_path.file_stem().unwrap_or_default().to_string_lossy();
    output_dir.join(format!("{}.json", stem))
}

/// Validate paths, build the metadata and write `<stem>.json` to `output_dir`.
///
/// # Returns
///
/// The path of the written sidecar and its contents.
pub fn generate_metadata(
    input_dir: &Path,
    output_dir: &Path,
    file_name: &str,
    config: &MetadataConfig,
    columns: &ColumnConfig,
) -> Result<(PathBuf, Metadata)> {
    validate_directories(input_dir, output_dir, file_name, config.create_output_dir)?;

    let csv_path = input_dir.join(file_name);
    let metadata = build_metadata(&csv_path, config, columns)?;

    let json_path = sidecar_path(output_dir, &csv_path);
    write_json(&json_path, &metadata)?;

    info!("Successfully created metadata file: {}", json_path.display());
    Ok((json_path, metadata))
}

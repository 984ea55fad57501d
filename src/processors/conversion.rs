//! Raw instrument output to CSV conversion.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::ConversionConfig;
use crate::core::loaders::load_raw_rows;
use crate::core::writers::write_table_csv;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("No raw files with extensions {extensions:?} found in {folder}")]
    NoFilesFound {
        folder: PathBuf,
        extensions: Vec<String>,
    },
}

/// Outcome of a batch conversion.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// (source, destination, rows written) for every converted file.
    pub converted: Vec<(PathBuf, PathBuf, usize)>,
    /// (source, error message) for every failed file.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    /// Total rows written across all converted files.
    pub fn total_rows(&self) -> usize {
        self.converted.iter().map(|(_, _, rows)| rows).sum()
    }
}

/// Default output path: the input's stem with a `.csv` extension, next to it.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("csv")
}

/// Convert one raw instrument file into a comma-delimited CSV.
///
/// Every row (header included) is copied as is; leading whitespace of each
/// cell is dropped. The first `config.skip_rows` lines are left out.
///
/// # Returns
///
/// The number of rows written.
pub fn convert_raw_file(input: &Path, output: &Path, config: &ConversionConfig) -> Result<usize> {
    let rows = load_raw_rows(input, config.delimiter, config.skip_rows)
        .with_context(|| format!("Failed to read raw file: {}", input.display()))?;

    write_table_csv(output, &rows)
        .with_context(|| format!("Failed to write CSV file: {}", output.display()))?;

    info!(
        "Converted {} -> {} ({} rows)",
        input.display(),
        output.display(),
        rows.len()
    );

    Ok(rows.len())
}

/// Raw files in `input_dir` whose extension is one of the configured ones, sorted.
pub fn find_raw_files(input_dir: &Path, config: &ConversionConfig) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(ConversionError::DirectoryNotFound(input_dir.to_path_buf()).into());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(input_dir)
        .with_context(|| format!("Failed to list directory: {}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| {
                        config
                            .raw_extensions
                            .iter()
                            .any(|wanted| ext.eq_ignore_ascii_case(wanted.as_str()))
                    })
                    .unwrap_or(false)
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Convert every raw file of a directory in parallel.
///
/// Output files are named `<stem>.csv` inside `output_dir`. A failing file is
/// logged and recorded in the summary; it does not stop the batch.
pub fn convert_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<BatchSummary> {
    let files = find_raw_files(input_dir, config)?;

    if files.is_empty() {
        return Err(ConversionError::NoFilesFound {
            folder: input_dir.to_path_buf(),
            extensions: config.raw_extensions.clone(),
        }
        .into());
    }

    let results: Vec<(PathBuf, PathBuf, Result<usize>)> = files
        .par_iter()
        .map(|src| {
            let stem = src.file_stem().unwrap_or_default().to_string_lossy();
            let dest = output_dir.join(format!("{}.csv", stem));
            let result = convert_raw_file(src, &dest, config);
            (src.clone(), dest, result)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (src, dest, result) in results {
        match result {
            Ok(rows) => summary.converted.push((src, dest, rows)),
            Err(e) => {
                error!("Failed to convert {}: {:#}", src.display(), e);
                summary.failed.push((src, format!("{:#}", e)));
            }
        }
    }

    Ok(summary)
}

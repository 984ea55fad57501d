//! Processing pipeline for multi-sensor biosensor measurements.
//!
//! This crate provides tools for:
//! - Converting raw instrument output into CSV files (in parallel for batches)
//! - Loading measurement tables into a typed [`SensorSeries`]
//! - Baseline normalization, injection interval selection and sample-category regions
//! - JSON metadata sidecars with the acquisition date taken from the file name
//! - PNG line plots with shaded category bands and interval markers
//!
//! # Example
//!
//! ```no_run
//! use biosense_pipeline::{
//!     core::{load_series, transforms::{derive_regions, normalize}},
//!     Baseline, ColumnConfig,
//! };
//!
//! let series = load_series("201253_25112022.csv", &ColumnConfig::default()).unwrap();
//! let traces = normalize(&series, Baseline::Start);
//! let regions = derive_regions(&series);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{ColumnConfig, ConversionConfig, MetadataConfig, PipelineConfig, PlotConfig};
pub use core::series::{
    Baseline, IntervalId, NormalizedTrace, Region, SampleCategory, SensorColumn, SensorSeries,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

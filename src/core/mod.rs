//! Core data types, transforms and I/O operations.

pub mod loaders;
pub mod series;
pub mod transforms;
pub mod writers;

pub use loaders::{load_series, load_table, LoaderError, Table};
pub use series::{
    Baseline, IntervalId, NormalizedTrace, Region, SampleCategory, SensorColumn, SensorSeries,
    SeriesError,
};
pub use writers::{write_json, write_series_csv, write_table_csv, WriteError};

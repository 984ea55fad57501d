//! Configuration types for the biosensing pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::series::Baseline;

/// Field delimiter of a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Tab,
    Comma,
    Semicolon,
}

impl Delimiter {
    /// The byte handed to the csv reader/writer.
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
        }
    }

    /// Guess the delimiter from a header line.
    ///
    /// Tabs win over everything else since instrument output is tab-separated;
    /// a semicolon only counts when there is no comma on the line.
    pub fn sniff(header_line: &str) -> Self {
        if header_line.contains('\t') {
            Delimiter::Tab
        } else if header_line.contains(';') && !header_line.contains(',') {
            Delimiter::Semicolon
        } else {
            Delimiter::Comma
        }
    }
}

/// Column layout of a converted measurement CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Name of the timestamp column (seconds)
    #[serde(default = "default_time_column")]
    pub time_column: String,

    /// Name of the injection interval column
    #[serde(default = "default_interval_column")]
    pub interval_column: String,

    /// Name of the sample category column
    #[serde(default = "default_category_column")]
    pub category_column: String,

    /// Explicit sensor column names; when empty the positional range is used
    #[serde(default)]
    pub sensor_columns: Vec<String>,

    /// Index of the first sensor column
    #[serde(default = "default_sensor_column_start")]
    pub sensor_column_start: usize,

    /// Number of sensor columns
    #[serde(default = "default_sensor_column_count")]
    pub sensor_column_count: usize,

    /// Delimiter override; sniffed from the header line when unset
    #[serde(default)]
    pub delimiter: Option<Delimiter>,
}

fn default_time_column() -> String {
    "T  (s)".to_string()
}

fn default_interval_column() -> String {
    "Inj.".to_string()
}

fn default_category_column() -> String {
    "Val.".to_string()
}

fn default_sensor_column_start() -> usize {
    1
}

fn default_sensor_column_count() -> usize {
    8
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            time_column: default_time_column(),
            interval_column: default_interval_column(),
            category_column: default_category_column(),
            sensor_columns: Vec::new(),
            sensor_column_start: default_sensor_column_start(),
            sensor_column_count: default_sensor_column_count(),
            delimiter: None,
        }
    }
}

/// Configuration for raw instrument output conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Delimiter of the raw files
    #[serde(default = "default_raw_delimiter")]
    pub delimiter: Delimiter,

    /// File extensions picked up in batch mode
    #[serde(default = "default_raw_extensions")]
    pub raw_extensions: Vec<String>,

    /// Preamble lines dropped before the header row
    #[serde(default)]
    pub skip_rows: usize,
}

fn default_raw_delimiter() -> Delimiter {
    Delimiter::Tab
}

fn default_raw_extensions() -> Vec<String> {
    vec!["raw".to_string(), "txt".to_string()]
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            delimiter: default_raw_delimiter(),
            raw_extensions: default_raw_extensions(),
            skip_rows: 0,
        }
    }
}

/// Hand-entered experiment metadata and sidecar options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Name of the connected Origin project file
    #[serde(default)]
    pub origin_file_id: String,

    #[serde(default)]
    pub short_file_id: String,

    #[serde(default)]
    pub injections: String,

    #[serde(default)]
    pub rounds: String,

    /// Date override in `YYYY-MM-DD` form, used instead of the file-name date
    #[serde(default)]
    pub manual_date: Option<String>,

    /// Create the output directory when it does not exist
    #[serde(default)]
    pub create_output_dir: bool,

    /// First header column reported in `col_names`
    #[serde(default = "default_col_names_start")]
    pub col_names_start: usize,

    /// Number of header columns reported in `col_names`
    #[serde(default = "default_col_names_count")]
    pub col_names_count: usize,
}

fn default_col_names_start() -> usize {
    4
}

fn default_col_names_count() -> usize {
    8
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            origin_file_id: String::new(),
            short_file_id: String::new(),
            injections: String::new(),
            rounds: String::new(),
            manual_date: None,
            create_output_dir: false,
            col_names_start: default_col_names_start(),
            col_names_count: default_col_names_count(),
        }
    }
}

/// Configuration for rendered plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Opacity multiplier applied on top of each category's band colour
    #[serde(default = "default_band_opacity")]
    pub band_opacity: f64,

    /// Stroke width of sensor traces
    #[serde(default = "default_line_width")]
    pub line_width: u32,

    /// Stroke width of interval boundary markers
    #[serde(default = "default_line_width")]
    pub marker_width: u32,

    /// Baseline used by whole-series and single-interval plots
    #[serde(default = "default_baseline")]
    pub baseline: Baseline,

    /// Baseline used when overlaying one sensor across intervals
    #[serde(default = "default_sensor_baseline")]
    pub sensor_baseline: Baseline,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_band_opacity() -> f64 {
    0.5
}

fn default_line_width() -> u32 {
    2
}

fn default_baseline() -> Baseline {
    Baseline::None
}

fn default_sensor_baseline() -> Baseline {
    Baseline::Start
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            band_opacity: default_band_opacity(),
            line_width: default_line_width(),
            marker_width: default_line_width(),
            baseline: default_baseline(),
            sensor_baseline: default_sensor_baseline(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub columns: ColumnConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub plot: PlotConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

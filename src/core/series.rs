//! Data model for multi-sensor time series segmented by injection interval.
//!
//! A [`SensorSeries`] is a column-oriented table: one time column, any number
//! of named sensor columns, an injection interval column and a sample
//! category column, all of equal length. Derived values ([`Region`],
//! [`NormalizedTrace`]) are computed on demand by [`crate::core::transforms`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when assembling a series.
#[derive(Error, Debug, PartialEq)]
pub enum SeriesError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate sensor column: {0}")]
    DuplicateSensor(String),
}

/// Result type for series construction.
pub type Result<T> = std::result::Result<T, SeriesError>;

/// Identifier of an injection interval.
///
/// Numeric identifiers are canonicalised so `"3"`, `"3.0"` and `" 3 "` are the
/// same interval. Anything else is kept verbatim (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(String);

impl IntervalId {
    /// Parse a raw table cell.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                IntervalId(format!("{}", v as i64))
            }
            Ok(v) if v.is_finite() => IntervalId(v.to_string()),
            _ => IntervalId(trimmed.to_string()),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the identifier, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IntervalId {
    fn from(raw: &str) -> Self {
        IntervalId::parse(raw)
    }
}

impl From<i64> for IntervalId {
    fn from(value: i64) -> Self {
        IntervalId(value.to_string())
    }
}

/// Classification of the sample flowing over the sensors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SampleCategory {
    Negative,
    Positive,
    Urea,
    /// Any code outside the known set, kept as written in the file.
    Other(String),
}

/// RGBA fill used for regions of an unknown category.
pub const FALLBACK_CATEGORY_COLOR: (u8, u8, u8, f64) = (0, 0, 0, 0.1);

impl SampleCategory {
    /// All categories with a dedicated style, in legend order.
    pub const KNOWN: [SampleCategory; 3] = [
        SampleCategory::Negative,
        SampleCategory::Positive,
        SampleCategory::Urea,
    ];

    /// Parse a category code (`1`, `2`, `3`); numeric comparison, so `2.0` works.
    pub fn from_code(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v == 1.0 => SampleCategory::Negative,
            Ok(v) if v == 2.0 => SampleCategory::Positive,
            Ok(v) if v == 3.0 => SampleCategory::Urea,
            _ => SampleCategory::Other(trimmed.to_string()),
        }
    }

    /// Code written back to CSV files.
    pub fn code(&self) -> String {
        match self {
            SampleCategory::Negative => "1".to_string(),
            SampleCategory::Positive => "2".to_string(),
            SampleCategory::Urea => "3".to_string(),
            SampleCategory::Other(raw) => raw.clone(),
        }
    }

    /// Legend label.
    pub fn label(&self) -> String {
        match self {
            SampleCategory::Negative => "Negative Sample".to_string(),
            SampleCategory::Positive => "Positive Sample".to_string(),
            SampleCategory::Urea => "Urea".to_string(),
            SampleCategory::Other(raw) => format!("Unknown ({})", raw),
        }
    }

    /// Band fill colour as (r, g, b, alpha).
    pub fn color(&self) -> (u8, u8, u8, f64) {
        match self {
            SampleCategory::Negative => (255, 0, 0, 0.1),
            SampleCategory::Positive => (0, 255, 0, 0.1),
            SampleCategory::Urea => (0, 0, 255, 0.1),
            SampleCategory::Other(_) => FALLBACK_CATEGORY_COLOR,
        }
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, SampleCategory::Other(_))
    }
}

impl fmt::Display for SampleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Rule used to zero a sensor trace.
///
/// Parsing ignores case and accepts `raw` as an alias of `none`, both in
/// config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Baseline {
    /// Raw values on the raw time axis.
    #[value(alias = "raw")]
    None,
    /// First sample pinned to zero, time relative to the window start.
    Start,
    /// Last sample pinned to zero, time relative to the window start.
    End,
}

impl Baseline {
    /// Whether the time axis is shifted to start at zero.
    #[inline]
    pub fn shifts_time(self) -> bool {
        !matches!(self, Baseline::None)
    }
}

impl FromStr for Baseline {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "raw" => Ok(Baseline::None),
            "start" => Ok(Baseline::Start),
            "end" => Ok(Baseline::End),
            other => Err(format!("unknown baseline '{}', expected none|start|end", other)),
        }
    }
}

impl TryFrom<String> for Baseline {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Baseline::None => "none",
            Baseline::Start => "start",
            Baseline::End => "end",
        };
        f.write_str(name)
    }
}

/// A named column of sensor readings.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Multi-sensor time series with interval and category annotations.
///
/// All columns have the same length; this is checked once in
/// [`SensorSeries::new`] so the transforms can index freely.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSeries {
    time: Vec<f64>,
    sensors: Vec<SensorColumn>,
    interval: Vec<IntervalId>,
    category: Vec<SampleCategory>,
}

impl SensorSeries {
    /// Assemble a series, checking that every column has `time.len()` rows.
    pub fn new(
        time: Vec<f64>,
        sensors: Vec<SensorColumn>,
        interval: Vec<IntervalId>,
        category: Vec<SampleCategory>,
    ) -> Result<Self> {
        let expected = time.len();

        let check = |column: &str, actual: usize| -> Result<()> {
            if actual != expected {
                return Err(SeriesError::LengthMismatch {
                    column: column.to_string(),
                    expected,
                    actual,
                });
            }
            Ok(())
        };

        check("interval", interval.len())?;
        check("category", category.len())?;
        for (i, sensor) in sensors.iter().enumerate() {
            check(sensor.name.as_str(), sensor.values.len())?;
            if sensors[..i].iter().any(|s| s.name == sensor.name) {
                return Err(SeriesError::DuplicateSensor(sensor.name.clone()));
            }
        }

        Ok(Self {
            time,
            sensors,
            interval,
            category,
        })
    }

    /// A series with the given sensor names and no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            time: Vec::new(),
            sensors: self
                .sensors
                .iter()
                .map(|s| SensorColumn {
                    name: s.name.clone(),
                    values: Vec::new(),
                })
                .collect(),
            interval: Vec::new(),
            category: Vec::new(),
        }
    }

    /// Copy of the rows at `indices`, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is not below [`SensorSeries::len`].
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            time: indices.iter().map(|&i| self.time[i]).collect(),
            sensors: self
                .sensors
                .iter()
                .map(|s| SensorColumn {
                    name: s.name.clone(),
                    values: indices.iter().map(|&i| s.values[i]).collect(),
                })
                .collect(),
            interval: indices.iter().map(|&i| self.interval[i].clone()).collect(),
            category: indices.iter().map(|&i| self.category[i].clone()).collect(),
        }
    }

    /// Same rows with the time column replaced.
    pub(crate) fn with_time(&self, time: Vec<f64>) -> Self {
        debug_assert_eq!(time.len(), self.time.len());
        Self {
            time,
            ..self.clone()
        }
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    #[inline]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    #[inline]
    pub fn sensors(&self) -> &[SensorColumn] {
        &self.sensors
    }

    #[inline]
    pub fn interval(&self) -> &[IntervalId] {
        &self.interval
    }

    #[inline]
    pub fn category(&self) -> &[SampleCategory] {
        &self.category
    }

    /// Sensor column names in file order.
    pub fn sensor_names(&self) -> Vec<&str> {
        self.sensors.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up a sensor column by name.
    pub fn sensor(&self, name: &str) -> Option<&SensorColumn> {
        self.sensors.iter().find(|s| s.name == name)
    }
}

/// Contiguous stretch of one sample category.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub start_time: f64,
    pub end_time: f64,
    pub category: SampleCategory,
}

/// Sensor trace after a baseline policy has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTrace {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl NormalizedTrace {
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, values: Vec<f64>) -> SensorColumn {
        SensorColumn {
            name: name.to_string(),
            values,
        }
    }

    #[test]
    fn test_interval_id_canonicalisation() {
        assert_eq!(IntervalId::parse("3"), IntervalId::parse("3.0"));
        assert_eq!(IntervalId::parse(" 3 "), IntervalId::from(3));
        assert_eq!(IntervalId::parse("2.5").as_str(), "2.5");
        assert_eq!(IntervalId::parse("Inj_4").as_str(), "Inj_4");
        assert_eq!(IntervalId::parse("").as_str(), "");
        assert_eq!(IntervalId::parse("7").as_number(), Some(7.0));
        assert_eq!(IntervalId::parse("abc").as_number(), None);
    }

    #[test]
    fn test_sample_category_codes() {
        assert_eq!(SampleCategory::from_code("1"), SampleCategory::Negative);
        assert_eq!(SampleCategory::from_code("2.0"), SampleCategory::Positive);
        assert_eq!(SampleCategory::from_code(" 3"), SampleCategory::Urea);
        assert_eq!(
            SampleCategory::from_code("9"),
            SampleCategory::Other("9".to_string())
        );
        assert_eq!(SampleCategory::Urea.code(), "3");
    }

    #[test]
    fn test_unknown_category_falls_back() {
        let other = SampleCategory::from_code("buffer");
        assert!(!other.is_known());
        assert_eq!(other.color(), FALLBACK_CATEGORY_COLOR);
        assert_eq!(other.label(), "Unknown (buffer)");
        assert_eq!(SampleCategory::Negative.color(), (255, 0, 0, 0.1));
    }

    #[test]
    fn test_baseline_parsing() {
        assert_eq!("START".parse::<Baseline>(), Ok(Baseline::Start));
        assert_eq!("none".parse::<Baseline>(), Ok(Baseline::None));
        assert_eq!(" end ".parse::<Baseline>(), Ok(Baseline::End));
        assert_eq!("Raw".parse::<Baseline>(), Ok(Baseline::None));
        assert!("middle".parse::<Baseline>().is_err());
        assert!(!Baseline::None.shifts_time());
        assert!(Baseline::End.shifts_time());
    }

    #[test]
    #[should_panic]
    fn test_take_rows_out_of_range() {
        let series = SensorSeries::new(
            vec![0.0],
            vec![],
            vec![IntervalId::from(1)],
            vec![SampleCategory::Negative],
        )
        .unwrap();
        series.take_rows(&[1]);
    }

    #[test]
    fn test_series_length_mismatch() {
        let result = SensorSeries::new(
            vec![0.0, 1.0],
            vec![column("S1", vec![1.0])],
            vec![IntervalId::from(1); 2],
            vec![SampleCategory::Negative; 2],
        );

        assert_eq!(
            result.unwrap_err(),
            SeriesError::LengthMismatch {
                column: "S1".to_string(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_series_duplicate_sensor() {
        let result = SensorSeries::new(
            vec![0.0],
            vec![column("S1", vec![1.0]), column("S1", vec![2.0])],
            vec![IntervalId::from(1)],
            vec![SampleCategory::Negative],
        );

        assert_eq!(
            result.unwrap_err(),
            SeriesError::DuplicateSensor("S1".to_string())
        );
    }

    #[test]
    fn test_take_rows_and_lookup() {
        let series = SensorSeries::new(
            vec![0.0, 1.0, 2.0],
            vec![column("S1", vec![10.0, 11.0, 12.0])],
            vec![IntervalId::from(1), IntervalId::from(2), IntervalId::from(2)],
            vec![SampleCategory::Negative; 3],
        )
        .unwrap();

        let subset = series.take_rows(&[1, 2]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.time(), &[1.0, 2.0]);
        assert_eq!(subset.sensor("S1").unwrap().values, vec![11.0, 12.0]);
        assert!(subset.sensor("S2").is_none());

        let empty = series.empty_like();
        assert!(empty.is_empty());
        assert_eq!(empty.sensor_names(), vec!["S1"]);
    }
}

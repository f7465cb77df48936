//! Daily OHLCV series handling

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// One daily bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Trading date
    pub date: NaiveDate,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume (never negative)
    pub volume: f64,
}

impl Bar {
    /// Create a new bar
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Whether all price and volume fields are finite numbers
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Time-ordered daily OHLCV series.
///
/// Dates are strictly increasing (sorted, no duplicates) and volumes are
/// non-negative. Both invariants are checked on construction and on `push`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OhlcvSeries {
    bars: Vec<Bar>,
}

impl OhlcvSeries {
    /// Create a series from bars that are already in date order
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        let mut series = Self {
            bars: Vec::with_capacity(bars.len()),
        };
        for bar in bars {
            series.push(bar)?;
        }
        Ok(series)
    }

    /// Sort bars by date, then validate them
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Result<Self> {
        bars.sort_by_key(|b| b.date);
        Self::new(bars)
    }

    /// Append a bar dated after the current last bar
    pub fn push(&mut self, bar: Bar) -> Result<()> {
        if !(bar.volume >= 0.0) {
            return Err(ForecastError::DataError(format!(
                "Volume must be non-negative, got {} on {}",
                bar.volume, bar.date
            )));
        }

        if let Some(last) = self.bars.last() {
            if bar.date <= last.date {
                return Err(ForecastError::DataError(format!(
                    "Bar dated {} does not follow last bar dated {}",
                    bar.date, last.date
                )));
            }
        }

        self.bars.push(bar);
        Ok(())
    }

    /// All bars, oldest first
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// The most recent bar
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Bars whose date lies in `start..=end`
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .copied()
                .collect(),
        }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// Data loader for daily OHLCV files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a daily OHLCV series from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<OhlcvSeries> {
        let file = File::open(path.as_ref())?;
        let df = CsvReader::new(file)
            .infer_schema(Some(100))
            .has_header(true)
            .finish()?;

        debug!(path = %path.as_ref().display(), rows = df.height(), "loaded OHLCV csv");
        Self::from_dataframe(&df)
    }

    /// Build a daily OHLCV series from an existing DataFrame.
    ///
    /// Rows with a missing or non-finite price field are skipped. Rows are
    /// sorted by date; duplicate dates are an error.
    pub fn from_dataframe(df: &DataFrame) -> Result<OhlcvSeries> {
        let date_column = Self::detect_time_column(df)?;
        let dates = Self::column_as_dates(df, &date_column)?;

        let opens = Self::column_as_f64(df, &Self::detect_column(df, "open")?)?;
        let highs = Self::column_as_f64(df, &Self::detect_column(df, "high")?)?;
        let lows = Self::column_as_f64(df, &Self::detect_column(df, "low")?)?;
        let closes = Self::column_as_f64(df, &Self::detect_column(df, "close")?)?;
        let volumes = Self::column_as_f64(df, &Self::detect_column(df, "volume")?)?;

        let mut bars = Vec::with_capacity(dates.len());
        let mut skipped = 0usize;
        for i in 0..dates.len() {
            let bar = Bar::new(dates[i], opens[i], highs[i], lows[i], closes[i], volumes[i]);
            if bar.is_finite() {
                bars.push(bar);
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            warn!(skipped, "skipped OHLCV rows with missing values");
        }

        OhlcvSeries::from_unsorted(bars)
    }

    /// Detect the date column in a DataFrame
    fn detect_time_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        for name in &column_names {
            let lower_name = name.to_lowercase();
            if lower_name.contains("date") || lower_name.contains("time") || lower_name == "ds" {
                return Ok(name.to_string());
            }
        }

        Err(ForecastError::DataError(
            "No date column found in data".to_string(),
        ))
    }

    /// Detect a price/volume column, preferring an exact name match
    fn detect_column(df: &DataFrame, wanted: &str) -> Result<String> {
        let column_names = df.get_column_names();

        column_names
            .iter()
            .find(|name| name.to_lowercase() == wanted)
            .or_else(|| {
                column_names.iter().find(|name| {
                    let lower_name = name.to_lowercase();
                    lower_name.contains(wanted) && !lower_name.contains("adj")
                })
            })
            .map(|name| name.to_string())
            .ok_or_else(|| ForecastError::DataError(format!("No {} column found in data", wanted)))
    }

    fn column_as_dates(df: &DataFrame, column_name: &str) -> Result<Vec<NaiveDate>> {
        let col = df.column(column_name)?.cast(&DataType::Utf8)?;

        col.utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let raw = value.ok_or_else(|| {
                    ForecastError::DataError(format!("Missing date in row {}", row))
                })?;
                let day = raw.get(..10).unwrap_or(raw);
                NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
                    ForecastError::DataError(format!("Invalid date '{}' in row {}: {}", raw, row, e))
                })
            })
            .collect()
    }

    fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
        let col = df.column(column_name)?.cast(&DataType::Float64).map_err(|e| {
            ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64: {}",
                column_name, e
            ))
        })?;

        Ok(col
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }
}

//! Feature frames and the technical-feature builder.
//!
//! A [`FeatureFrame`] is a column-oriented table indexed by trading date.
//! Every column has one cell per date; a cell is `None` when the value is
//! undefined (warm-up window, zero denominator, non-finite result).

use crate::data::OhlcvSeries;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use trade_math::moving_averages::{ema, sma};
use trade_math::oscillators::{log_returns, macd, momentum, rsi};
use trade_math::volatility::{average_true_range, bollinger_bands, rolling_std};

/// Raw price columns carried into the feature frame
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";

pub const SMA_WINDOWS: [usize; 6] = [5, 10, 20, 50, 100, 200];
pub const EMA_SPANS: [usize; 2] = [10, 20];

pub const VOLATILITY_10: &str = "Volatility_10";
pub const MOMENTUM_4: &str = "Momentum_4";
pub const LOG_RETURN: &str = "Log_Return";
pub const RSI_14: &str = "RSI_14";
pub const MACD: &str = "MACD";
pub const MACD_SIGNAL: &str = "MACD_Signal";
pub const MACD_HIST: &str = "MACD_Hist";
pub const BB_UPPER: &str = "BB_Upper";
pub const BB_MIDDLE: &str = "BB_Middle";
pub const BB_LOWER: &str = "BB_Lower";
pub const ATR_14: &str = "ATR_14";
pub const DAY_OF_WEEK: &str = "DayOfWeek";
pub const MONTH: &str = "Month";
pub const QUARTER: &str = "Quarter";

/// Name of the simple moving average column for a window
pub fn sma_column(window: usize) -> String {
    format!("MA_{}", window)
}

/// Name of the exponential moving average column for a span
pub fn ema_column(span: usize) -> String {
    format!("EMA_{}", span)
}

/// One named column of a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Column-oriented feature table aligned with a date index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

/// A single row of a frame, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub names: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl FeatureRow {
    /// Value of a named column, `None` if absent or undefined
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values[i])
    }

    /// `(name, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FeatureFrame {
    /// Create a frame with an index and no columns
    pub fn new(index: Vec<NaiveDate>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Insert a column, replacing any existing column with the same name.
    ///
    /// A replaced column keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' has {} values but the frame has {} rows",
                name,
                values.len(),
                self.index.len()
            )));
        }

        self.set_column(name, values);
        Ok(())
    }

    /// Insert a column holding the same value in every row
    pub fn insert_constant(&mut self, name: impl Into<String>, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        let values = vec![value; self.index.len()];
        self.set_column(name.into(), values);
    }

    /// Insert or replace a column whose length is already known to match the index
    pub(crate) fn set_column(&mut self, name: String, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.index.len(), "column '{}' length", name);
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column { name, values }),
        }
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Copy out the row at position `i`
    pub fn row(&self, i: usize) -> Option<FeatureRow> {
        let date = *self.index.get(i)?;
        Some(FeatureRow {
            date,
            names: self.columns.iter().map(|c| c.name.clone()).collect(),
            values: self.columns.iter().map(|c| c.values[i]).collect(),
        })
    }

    /// Copy out the last row
    pub fn last_row(&self) -> Option<FeatureRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// Replace non-finite cells with `None`, then forward-fill and back-fill
    /// every column. Columns with no defined value stay undefined.
    pub fn fill_gaps(&mut self) {
        for column in &mut self.columns {
            let mut last = None;
            for cell in column.values.iter_mut() {
                if cell.map_or(false, |v| !v.is_finite()) {
                    *cell = None;
                }
                if cell.is_some() {
                    last = *cell;
                } else {
                    *cell = last;
                }
            }

            let mut next = None;
            for cell in column.values.iter_mut().rev() {
                if cell.is_some() {
                    next = *cell;
                } else {
                    *cell = next;
                }
            }
        }
    }
}

/// Builds the engineered technical and calendar features of a series.
///
/// The transform is pure and trailing-only: the features of row `i` depend
/// solely on bars `0..=i`.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the feature frame for an OHLCV series
    pub fn build(&self, series: &OhlcvSeries) -> Result<FeatureFrame> {
        let mut frame = FeatureFrame::new(series.dates());
        let open = series.opens();
        let high = series.highs();
        let low = series.lows();
        let close = series.closes();

        frame.insert(OPEN, defined(&open))?;
        frame.insert(HIGH, defined(&high))?;
        frame.insert(LOW, defined(&low))?;

        for window in SMA_WINDOWS {
            frame.insert(sma_column(window), sma(&close, window)?)?;
        }
        for span in EMA_SPANS {
            frame.insert(ema_column(span), ema(&close, span)?)?;
        }

        frame.insert(VOLATILITY_10, rolling_std(&close, 10)?)?;
        frame.insert(MOMENTUM_4, momentum(&close, 4)?)?;
        frame.insert(LOG_RETURN, log_returns(&close))?;
        frame.insert(RSI_14, rsi(&close, 14)?)?;

        let macd = macd(&close, 12, 26, 9)?;
        frame.insert(MACD, macd.line)?;
        frame.insert(MACD_SIGNAL, macd.signal)?;
        frame.insert(MACD_HIST, macd.histogram)?;

        let bands = bollinger_bands(&close, 20, 2.0)?;
        frame.insert(BB_UPPER, bands.upper)?;
        frame.insert(BB_MIDDLE, bands.middle)?;
        frame.insert(BB_LOWER, bands.lower)?;

        frame.insert(ATR_14, average_true_range(&high, &low, &close, 14)?)?;

        self.add_calendar_features(&mut frame)?;
        Ok(frame)
    }

    /// Day of week (Monday = 0), month (1-12) and quarter (1-4) of each row
    fn add_calendar_features(&self, frame: &mut FeatureFrame) -> Result<()> {
        let dates = frame.index().to_vec();
        let day_of_week = dates
            .iter()
            .map(|d| Some(d.weekday().num_days_from_monday() as f64))
            .collect();
        let month = dates.iter().map(|d| Some(d.month() as f64)).collect();
        let quarter = dates
            .iter()
            .map(|d| Some(((d.month() - 1) / 3 + 1) as f64))
            .collect();

        frame.insert(DAY_OF_WEEK, day_of_week)?;
        frame.insert(MONTH, month)?;
        frame.insert(QUARTER, quarter)?;
        Ok(())
    }
}

fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| v.is_finite().then_some(*v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_insert_checks_length() {
        let mut frame = FeatureFrame::new(vec![date(1), date(2)]);
        assert!(frame.insert("a", vec![Some(1.0)]).is_err());
        assert!(frame.insert("a", vec![Some(1.0), None]).is_ok());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut frame = FeatureFrame::new(vec![date(1)]);
        frame.insert("a", vec![Some(1.0)]).unwrap();
        frame.insert("b", vec![Some(2.0)]).unwrap();
        frame.insert("a", vec![Some(3.0)]).unwrap();
        assert_eq!(frame.column_names(), vec!["a", "b"]);
        assert_eq!(frame.column("a"), Some(&[Some(3.0)][..]));
    }

    #[test]
    fn test_insert_constant_spans_index() {
        let mut frame = FeatureFrame::new(vec![date(1), date(2), date(3)]);
        frame.insert("a", vec![Some(1.0); 3]).unwrap();
        frame.insert_constant("Ticker", Some(4.0));
        frame.insert_constant("a", Some(f64::NAN));

        assert_eq!(frame.column_names(), vec!["a", "Ticker"]);
        assert_eq!(frame.column("Ticker").unwrap(), &[Some(4.0); 3]);
        assert_eq!(frame.column("a").unwrap(), &[None; 3]);
    }

    #[test]
    fn test_fill_gaps_forward_then_backward() {
        let mut frame = FeatureFrame::new(vec![date(1), date(2), date(3), date(4)]);
        frame
            .insert("x", vec![None, Some(2.0), Some(f64::INFINITY), None])
            .unwrap();
        frame.insert("empty", vec![None; 4]).unwrap();
        frame.fill_gaps();

        assert_eq!(
            frame.column("x").unwrap(),
            &[Some(2.0), Some(2.0), Some(2.0), Some(2.0)]
        );
        assert!(frame.column("empty").unwrap().iter().all(Option::is_none));
    }

    #[test]
    fn test_row_access() {
        let mut frame = FeatureFrame::new(vec![date(1), date(2)]);
        frame.insert("a", vec![Some(1.0), Some(2.0)]).unwrap();
        frame.insert("b", vec![None, Some(4.0)]).unwrap();

        let row = frame.last_row().unwrap();
        assert_eq!(row.date, date(2));
        assert_eq!(row.get("b"), Some(4.0));
        assert_eq!(frame.row(0).unwrap().get("b"), None);
        assert!(frame.row(2).is_none());
    }
}

//! Market-data sources for historical bars and fundamentals

use crate::data::{DataLoader, OhlcvSeries};
use crate::error::{ForecastError, Result};
use crate::fundamentals::{FundamentalsSnapshot, FundamentalsSource};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File inside a [`CsvMarketData`] directory holding fundamentals per symbol
pub const FUNDAMENTALS_FILE: &str = "fundamentals.json";

/// Capability that returns historical daily bars for a symbol
pub trait MarketData: FundamentalsSource {
    /// Bars dated within `start..=end`; [`ForecastError::NoData`] when there are none
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<OhlcvSeries>;
}

/// Market data held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    history: HashMap<String, OhlcvSeries>,
    fundamentals: HashMap<String, FundamentalsSnapshot>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, symbol: impl Into<String>, series: OhlcvSeries) -> Self {
        self.history.insert(symbol.into(), series);
        self
    }

    pub fn with_fundamentals(mut self, symbol: impl Into<String>, snapshot: FundamentalsSnapshot) -> Self {
        self.fundamentals.insert(symbol.into(), snapshot);
        self
    }
}

impl FundamentalsSource for InMemoryMarketData {
    fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot> {
        self.fundamentals
            .get(symbol)
            .cloned()
            .ok_or_else(|| ForecastError::FundamentalsUnavailable(symbol.to_string()))
    }
}

impl MarketData for InMemoryMarketData {
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<OhlcvSeries> {
        let series = self
            .history
            .get(symbol)
            .map(|s| s.between(start, end))
            .unwrap_or_default();

        if series.is_empty() {
            return Err(ForecastError::NoData(symbol.to_string()));
        }
        Ok(series)
    }
}

/// Market data read from a directory with one `<SYMBOL>.csv` per ticker and
/// an optional `fundamentals.json` object keyed by symbol.
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    dir: PathBuf,
    fundamentals: HashMap<String, FundamentalsSnapshot>,
}

impl CsvMarketData {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(ForecastError::DataError(format!(
                "Market data directory {} does not exist",
                dir.display()
            )));
        }

        let fundamentals_path = dir.join(FUNDAMENTALS_FILE);
        let fundamentals = if fundamentals_path.is_file() {
            let json = std::fs::read_to_string(&fundamentals_path)?;
            serde_json::from_str(&json)?
        } else {
            HashMap::new()
        };

        Ok(Self { dir, fundamentals })
    }

    fn history_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }
}

impl FundamentalsSource for CsvMarketData {
    fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot> {
        self.fundamentals
            .get(symbol)
            .cloned()
            .ok_or_else(|| ForecastError::FundamentalsUnavailable(symbol.to_string()))
    }
}

impl MarketData for CsvMarketData {
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<OhlcvSeries> {
        let path = self.history_path(symbol);
        if !path.is_file() {
            debug!(path = %path.display(), "no history file");
            return Err(ForecastError::NoData(symbol.to_string()));
        }

        let series = DataLoader::from_csv(&path)?.between(start, end);
        if series.is_empty() {
            return Err(ForecastError::NoData(symbol.to_string()));
        }
        Ok(series)
    }
}

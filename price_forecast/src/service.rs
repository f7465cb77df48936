//! Request validation and orchestration around the recursive forecaster

use crate::config::ForecastSettings;
use crate::error::{ForecastError, Result};
use crate::forecaster::{ForecastJob, ForecastRecord, RecursiveForecaster};
use crate::market::MarketData;
use crate::models::LoadedModel;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Name of the constant column carrying the ticker id
pub const TICKER_COLUMN: &str = "Ticker";

/// The tickers the models were trained on, with their integer ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerUniverse {
    /// Exchange suffix appended to bare symbols, e.g. `.NS`
    #[serde(default)]
    pub suffix: String,
    pub tickers: BTreeMap<String, u32>,
}

impl TickerUniverse {
    pub fn new(suffix: impl Into<String>, tickers: BTreeMap<String, u32>) -> Self {
        Self {
            suffix: suffix.into(),
            tickers,
        }
    }

    /// Load from JSON: `{"suffix": ".NS", "tickers": {"TCS.NS": 1}}`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Trim, upper-case and append the exchange suffix when missing
    pub fn normalize(&self, symbol: &str) -> String {
        let symbol = symbol.trim().to_uppercase();
        let suffix = self.suffix.to_uppercase();
        if suffix.is_empty() || symbol.ends_with(&suffix) {
            symbol
        } else {
            format!("{}{}", symbol, suffix)
        }
    }

    /// Normalized symbol and its id, or [`ForecastError::UnknownSymbol`]
    pub fn resolve(&self, symbol: &str) -> Result<(String, u32)> {
        let normalized = self.normalize(symbol);
        match self.tickers.get(&normalized) {
            Some(id) => Ok((normalized, *id)),
            None => Err(ForecastError::UnknownSymbol(normalized)),
        }
    }
}

/// Forecast for one symbol
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    /// Normalized symbol
    pub symbol: String,
    pub predictions: Vec<ForecastRecord>,
}

/// Validates requests, fetches history and runs the recursive forecaster.
///
/// Holds no mutable state; one instance can serve concurrent callers.
pub struct ForecastService {
    market: Arc<dyn MarketData>,
    forecaster: RecursiveForecaster,
    universe: TickerUniverse,
    settings: ForecastSettings,
}

impl ForecastService {
    pub fn new(
        market: Arc<dyn MarketData>,
        price_model: LoadedModel,
        volume_model: LoadedModel,
        universe: TickerUniverse,
        settings: ForecastSettings,
    ) -> Self {
        let forecaster = RecursiveForecaster::new(price_model, volume_model, settings.options());
        Self {
            market,
            forecaster,
            universe,
            settings,
        }
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn universe(&self) -> &TickerUniverse {
        &self.universe
    }

    /// Check symbol and horizon; returns the normalized symbol and its id
    pub fn validate(&self, symbol: &str, days: usize) -> Result<(String, u32)> {
        let resolved = self.universe.resolve(symbol)?;
        if days < self.settings.min_horizon || days > self.settings.max_horizon {
            return Err(ForecastError::InvalidHorizon {
                requested: days,
                min: self.settings.min_horizon,
                max: self.settings.max_horizon,
            });
        }
        Ok(resolved)
    }

    /// Forecast `days` trading days for `symbol` from history up to `as_of`
    pub fn predict(&self, symbol: &str, days: usize, as_of: NaiveDate) -> Result<ForecastResponse> {
        let (symbol, ticker_id) = self.validate(symbol, days)?;

        let start = as_of
            .checked_sub_days(Days::new(u64::from(self.settings.lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        let history = self.market.fetch_history(&symbol, start, as_of)?;
        if history.is_empty() {
            return Err(ForecastError::NoData(symbol));
        }
        info!(symbol = %symbol, days, bars = history.len(), %start, end = %as_of, "fetched history");

        let job = ForecastJob::new(&symbol, &history, days).with_constant(TICKER_COLUMN, f64::from(ticker_id));
        let predictions = self.forecaster.forecast(&job, self.market.as_ref())?;

        Ok(ForecastResponse {
            symbol,
            predictions,
        })
    }
}

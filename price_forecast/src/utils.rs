//! Utility functions for the price_forecast crate

use crate::calendar::{is_weekend, next_trading_day};
use crate::data::{Bar, OhlcvSeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Date parsing helpers
pub mod date_parser {
    use super::*;

    /// Parse a `YYYY-MM-DD` date
    pub fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| ForecastError::DataError(format!("Invalid date '{}': {}", s, e)))
    }
}

/// `days` consecutive trading days starting at `start` (or the first trading
/// day after it when `start` is a weekend)
fn trading_days_from(start: NaiveDate, days: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(days);
    let mut current = if is_weekend(start) {
        next_trading_day(start)
    } else {
        start
    };
    for _ in 0..days {
        dates.push(current);
        current = next_trading_day(current);
    }
    dates
}

/// Flat series: every bar has `open = high = low = close` and the same volume
pub fn constant_series(start: NaiveDate, days: usize, close: f64, volume: f64) -> Result<OhlcvSeries> {
    let bars = trading_days_from(start, days)
        .into_iter()
        .map(|date| Bar::new(date, close, close, close, close, volume))
        .collect();
    OhlcvSeries::new(bars)
}

/// Seeded geometric random walk with plausible OHLC ranges
pub fn random_walk_series(
    start: NaiveDate,
    days: usize,
    start_price: f64,
    volatility: f64,
    seed: u64,
) -> Result<OhlcvSeries> {
    if start_price <= 0.0 || volatility < 0.0 {
        return Err(ForecastError::InvalidParameter(
            "Start price must be positive and volatility non-negative".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let returns = Normal::new(0.0, volatility)
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
    let noise = Normal::new(0.0, volatility / 2.0)
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;

    let mut previous_close = start_price;
    let bars = trading_days_from(start, days)
        .into_iter()
        .map(|date| {
            let open = previous_close;
            let close = (open * (1.0 + returns.sample(&mut rng))).max(0.01);
            let high = open.max(close) * (1.0 + noise.sample(&mut rng).abs());
            let low = open.min(close) * (1.0 - noise.sample(&mut rng).abs()).max(0.0);
            let volume = (1_000_000.0 * (1.0 + noise.sample(&mut rng))).max(0.0);
            previous_close = close;
            Bar::new(date, open, high, low, close, volume)
        })
        .collect();

    OhlcvSeries::new(bars)
}

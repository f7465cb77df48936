//! Volatility indicator implementations
//!
//! Contains implementations of volatility-based indicators:
//! - Rolling (sample) standard deviation
//! - Bollinger Bands
//! - True Range and Average True Range (ATR)

use crate::moving_averages::sma;
use crate::{check_lengths, check_period, finite, Result, Series};
use statrs::statistics::Statistics;

/// Trailing sample standard deviation (n - 1 denominator).
///
/// Undefined until `period` values are available, and for any window that
/// contains a non-finite value.
pub fn rolling_std(values: &[f64], period: usize) -> Result<Series> {
    check_period(period, "Standard deviation")?;

    Ok((0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            if window.iter().any(|v| !v.is_finite()) {
                return None;
            }
            finite(window.iter().std_dev())
        })
        .collect())
}

/// Bollinger Bands columns
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    /// Middle band + multiplier * std_dev
    pub upper: Series,
    /// Trailing mean
    pub middle: Series,
    /// Middle band - multiplier * std_dev
    pub lower: Series,
}

/// Calculate Bollinger Bands over a trailing window.
pub fn bollinger_bands(values: &[f64], period: usize, std_dev_multiplier: f64) -> Result<BollingerBands> {
    if std_dev_multiplier <= 0.0 || !std_dev_multiplier.is_finite() {
        return Err(crate::MathError::InvalidInput(
            "Standard deviation multiplier must be greater than zero".to_string(),
        ));
    }

    let middle = sma(values, period)?;
    let std_dev = rolling_std(values, period)?;

    let band = |sign: f64| -> Series {
        middle
            .iter()
            .zip(std_dev.iter())
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => finite(m + sign * std_dev_multiplier * s),
                _ => None,
            })
            .collect()
    };

    Ok(BollingerBands {
        upper: band(1.0),
        lower: band(-1.0),
        middle,
    })
}

/// True range per bar: `max(high - low, |high - prev_close|, |low - prev_close|)`.
///
/// The first bar has no previous close, so its true range is `high - low`.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>> {
    check_lengths(close.len(), high.len(), "High")?;
    check_lengths(close.len(), low.len(), "Low")?;

    Ok((0..close.len())
        .map(|i| {
            let range = high[i] - low[i];
            if i == 0 {
                return range;
            }
            let prev_close = close[i - 1];
            range
                .max((high[i] - prev_close).abs())
                .max((low[i] - prev_close).abs())
        })
        .collect())
}

/// Average True Range: trailing simple mean of the true range.
pub fn average_true_range(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Series> {
    check_period(period, "ATR")?;
    let tr = true_range(high, low, close)?;
    sma(&tr, period)
}

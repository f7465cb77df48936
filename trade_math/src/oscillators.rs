//! Oscillator and momentum indicator implementations
//!
//! Contains implementations of:
//! - Relative Strength Index (RSI) with simple-mean smoothing
//! - Moving Average Convergence Divergence (MACD)
//! - N-period momentum (price difference)
//! - Logarithmic returns

use crate::moving_averages::{ema, ema_series, sma};
use crate::{check_period, finite, MathError, Result, Series};

/// Relative Strength Index over `period` bars.
///
/// Gains and losses are the positive and negative parts of the bar-to-bar
/// close delta; the first bar (which has no delta) counts as neither. Both are
/// averaged with a trailing simple mean, and the index is
/// `100 - 100 / (1 + avg_gain / avg_loss)`. Undefined while the window is
/// incomplete and wherever the average loss is zero.
pub fn rsi(close: &[f64], period: usize) -> Result<Series> {
    check_period(period, "RSI")?;

    let deltas: Vec<f64> = (0..close.len())
        .map(|i| if i == 0 { f64::NAN } else { close[i] - close[i - 1] })
        .collect();
    // NaN deltas fall through both comparisons and count as zero
    let gains: Vec<f64> = deltas.iter().map(|&d| if d > 0.0 { d } else { 0.0 }).collect();
    let losses: Vec<f64> = deltas.iter().map(|&d| if d < 0.0 { -d } else { 0.0 }).collect();

    let avg_gain = sma(&gains, period)?;
    let avg_loss = sma(&losses, period)?;

    Ok(avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(loss)) if *loss == 0.0 => None,
            (Some(gain), Some(loss)) => {
                let rs = gain / loss;
                finite(100.0 - (100.0 / (1.0 + rs)))
            }
            _ => None,
        })
        .collect())
}

/// MACD columns
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    /// Fast EMA - slow EMA
    pub line: Series,
    /// EMA of the MACD line
    pub signal: Series,
    /// MACD line - signal line
    pub histogram: Series,
}

/// Moving Average Convergence Divergence.
pub fn macd(close: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> Result<Macd> {
    if fast_period >= slow_period {
        return Err(MathError::InvalidInput(
            "Fast period must be smaller than slow period".to_string(),
        ));
    }
    check_period(signal_period, "Signal")?;

    let fast = ema(close, fast_period)?;
    let slow = ema(close, slow_period)?;

    let line: Series = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => finite(f - s),
            _ => None,
        })
        .collect();
    let signal = ema_series(&line, signal_period)?;
    let histogram = line
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => finite(m - s),
            _ => None,
        })
        .collect();

    Ok(Macd {
        line,
        signal,
        histogram,
    })
}

/// Difference between each value and the value `lag` positions earlier.
pub fn momentum(values: &[f64], lag: usize) -> Result<Series> {
    check_period(lag, "Momentum")?;

    Ok((0..values.len())
        .map(|i| {
            if i < lag {
                None
            } else {
                finite(values[i] - values[i - lag])
            }
        })
        .collect())
}

/// Natural-log return of each value against the previous one.
pub fn log_returns(values: &[f64]) -> Series {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                None
            } else {
                finite((values[i] / values[i - 1]).ln())
            }
        })
        .collect()
}

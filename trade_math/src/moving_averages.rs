//! Moving average calculation implementations
//!
//! Contains implementations of the moving average types used for feature
//! engineering:
//! - Simple Moving Average (SMA) over a trailing window
//! - Exponential Moving Average (EMA), recursive and seeded by the first value
//!
//! Each type exists as a streaming accumulator (`update`/`value`) and as a
//! whole-series function (`sma`, `ema`) that drives the accumulator.

use crate::{check_period, finite, MathError, Result, Series};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
    /// Number of non-finite values currently inside the window
    invalid: usize,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        check_period(period, "SMA")?;

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
            invalid: 0,
        })
    }

    /// Update the SMA with a new value
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        if value.is_finite() {
            self.sum += value;
        } else {
            self.invalid += 1;
        }

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                if old_value.is_finite() {
                    self.sum -= old_value;
                } else {
                    self.invalid -= 1;
                }
            }
        }
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.period {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        if self.invalid > 0 {
            return Err(MathError::CalculationError(
                "Window contains non-finite values".to_string(),
            ));
        }

        Ok(self.sum / self.period as f64)
    }
}

/// Exponential Moving Average (EMA) implementation
///
/// Uses the recursive definition `ema = alpha * x + (1 - alpha) * ema_prev`
/// with `alpha = 2 / (span + 1)`, seeded by the first finite observation.
/// Non-finite observations leave the average unchanged.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    alpha: f64,
    current_ema: Option<f64>,
}

impl ExponentialMovingAverage {
    /// Create a new Exponential Moving Average with the specified span
    pub fn new(span: usize) -> Result<Self> {
        check_period(span, "EMA")?;

        Ok(Self {
            alpha: 2.0 / (span as f64 + 1.0),
            current_ema: None,
        })
    }

    /// Update the EMA with a new value
    pub fn update(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }

        self.current_ema = Some(match self.current_ema {
            None => value,
            Some(current) => self.alpha * value + (1.0 - self.alpha) * current,
        });
    }

    /// Get the current EMA value
    pub fn value(&self) -> Result<f64> {
        self.current_ema.ok_or_else(|| {
            MathError::InsufficientData("EMA has not seen a finite value yet".to_string())
        })
    }
}

/// Trailing simple moving average, undefined until `period` values are seen.
pub fn sma(values: &[f64], period: usize) -> Result<Series> {
    let mut acc = SimpleMovingAverage::new(period)?;

    Ok(values
        .iter()
        .map(|&value| {
            acc.update(value);
            acc.value().ok().and_then(finite)
        })
        .collect())
}

/// Exponential moving average, defined from the first finite value onwards.
pub fn ema(values: &[f64], span: usize) -> Result<Series> {
    let mut acc = ExponentialMovingAverage::new(span)?;

    Ok(values
        .iter()
        .map(|&value| {
            acc.update(value);
            acc.value().ok().and_then(finite)
        })
        .collect())
}

/// Exponential moving average over a column that may contain gaps.
pub fn ema_series(values: &[Option<f64>], span: usize) -> Result<Series> {
    let mut acc = ExponentialMovingAverage::new(span)?;

    Ok(values
        .iter()
        .map(|value| {
            if let Some(v) = value {
                acc.update(*v);
            }
            acc.value().ok().and_then(finite)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma_calculation() {
        let mut sma = SimpleMovingAverage::new(3).unwrap();

        // Not enough data yet
        assert!(sma.value().is_err());

        sma.update(2.0);
        sma.update(4.0);
        assert!(sma.value().is_err());

        sma.update(6.0);
        assert_eq!(sma.value().unwrap(), 4.0); // (2 + 4 + 6) / 3

        // The window slides, dropping the oldest value
        sma.update(8.0);
        assert_eq!(sma.value().unwrap(), 6.0); // (4 + 6 + 8) / 3
    }

    #[test]
    fn test_sma_series_warm_up() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_sma_window_with_nan_is_undefined() {
        let out = sma(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2).unwrap();
        assert_eq!(out, vec![None, None, None, Some(3.5), Some(4.5)]);
    }

    #[test]
    fn test_ema_is_seeded_by_first_value() {
        let out = ema(&[10.0, 20.0, 30.0], 3).unwrap();
        // alpha = 0.5
        assert_eq!(out[0], Some(10.0));
        assert_relative_eq!(out[1].unwrap(), 15.0);
        assert_relative_eq!(out[2].unwrap(), 22.5);
    }

    #[test]
    fn test_ema_of_constant_is_constant() {
        let out = ema(&[100.0; 30], 20).unwrap();
        assert!(out.iter().all(|v| v.map_or(false, |x| (x - 100.0).abs() < 1e-12)));
    }

    #[test]
    fn test_ema_series_skips_gaps() {
        let out = ema_series(&[None, Some(4.0), None, Some(8.0)], 3).unwrap();
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(4.0));
        assert_eq!(out[2], Some(4.0));
        assert_relative_eq!(out[3].unwrap(), 6.0);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(sma(&[1.0], 0).is_err());
        assert!(ema(&[1.0], 0).is_err());
    }
}

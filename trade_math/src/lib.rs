//! # Trade Math
//!
//! Mathematical calculations for technical indicators over whole price series.
//!
//! Every indicator takes a time-ordered slice and returns one value per input
//! position. Positions whose trailing window is not yet full (or whose value
//! is not a finite number) are `None`. Windows are always trailing: the value
//! at position `i` only depends on inputs `0..=i`.

use thiserror::Error;

// Indicator modules
pub mod moving_averages;
pub mod oscillators;
pub mod volatility;

/// Errors that can occur in indicator calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// A computed indicator column, aligned 1:1 with its input.
pub type Series = Vec<Option<f64>>;

/// Keep finite values, drop everything else to `None`.
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub(crate) fn check_period(period: usize, what: &str) -> Result<()> {
    if period == 0 {
        return Err(MathError::InvalidInput(format!(
            "{} period must be greater than zero",
            what
        )));
    }
    Ok(())
}

pub(crate) fn check_lengths(expected: usize, actual: usize, what: &str) -> Result<()> {
    if expected != actual {
        return Err(MathError::InvalidInput(format!(
            "{} length ({}) doesn't match price length ({})",
            what, actual, expected
        )));
    }
    Ok(())
}

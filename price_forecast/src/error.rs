//! Error types for the price_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The symbol is not part of the trained ticker universe
    #[error("Symbol not recognized: {0} is not in the trained ticker list")]
    UnknownSymbol(String),

    /// The requested horizon is outside the allowed bounds
    #[error("Invalid horizon: {requested} trading days (allowed {min}..={max})")]
    InvalidHorizon {
        requested: usize,
        min: usize,
        max: usize,
    },

    /// The market-data source returned no bars for the symbol
    #[error("No data found for {0}")]
    NoData(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A predictor failed to produce a value
    #[error("Prediction error: {0}")]
    PredictionError(String),

    /// Fundamentals could not be fetched for the symbol
    #[error("Fundamentals unavailable: {0}")]
    FundamentalsUnavailable(String),

    /// Error from indicator calculations
    #[error("Math error: {0}")]
    Math(#[from] trade_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV export
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Error loading configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ForecastError {
    /// Whether the error rejects the request before any computation runs.
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            ForecastError::UnknownSymbol(_) | ForecastError::InvalidHorizon { .. }
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<config::ConfigError> for ForecastError {
    fn from(err: config::ConfigError) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

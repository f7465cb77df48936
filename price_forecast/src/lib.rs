//! # Price Forecast
//!
//! Recursive multi-step forecasting of daily close prices and volumes from
//! pre-trained regression models.
//!
//! ## Pipeline
//!
//! - **Technical features** ([`features::FeatureBuilder`]): moving averages,
//!   oscillators, volatility bands and calendar features over a daily OHLCV
//!   series, all with trailing windows
//! - **Fundamentals** ([`fundamentals`]): point-in-time company metrics attached
//!   as constant columns; fetch failures degrade to undefined values
//! - **Schema alignment** ([`schema::align`]): reshape a frame to the exact
//!   column order a trained model expects
//! - **Recursive forecasting** ([`forecaster::RecursiveForecaster`]): predict,
//!   synthesize the next bar, append, rebuild all features, repeat
//! - **Trading calendar** ([`calendar`]): weekend-skipping date stepping
//!
//! Models and market data are injected capabilities ([`models::Predictor`],
//! [`market::MarketData`]), so any regression backend or data vendor fits.
//!
//! ## Quick Start
//!
//! ```rust
//! use price_forecast::forecaster::{ForecastJob, ForecastOptions, RecursiveForecaster};
//! use price_forecast::market::InMemoryMarketData;
//! use price_forecast::models::{ConstantPredictor, LoadedModel};
//! use price_forecast::utils::{constant_series, date_parser};
//! use std::sync::Arc;
//!
//! let start = date_parser::parse_date("2024-01-01")?;
//! let history = constant_series(start, 60, 100.0, 1_000_000.0)?;
//!
//! let forecaster = RecursiveForecaster::new(
//!     LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(100.0))),
//!     LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(1_000_000.0))),
//!     ForecastOptions::default(),
//! );
//!
//! let job = ForecastJob::new("RELIANCE.NS", &history, 5);
//! let records = forecaster.forecast(&job, &InMemoryMarketData::new())?;
//! assert_eq!(records.len(), 5);
//! # Ok::<(), price_forecast::ForecastError>(())
//! ```

pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod features;
pub mod forecaster;
pub mod fundamentals;
pub mod market;
pub mod models;
pub mod schema;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use crate::data::{Bar, DataLoader, OhlcvSeries};
pub use crate::error::ForecastError;
pub use crate::features::{FeatureBuilder, FeatureFrame, FeatureRow};
pub use crate::forecaster::{ForecastJob, ForecastOptions, ForecastRecord, RecursiveForecaster};
pub use crate::models::{LoadedModel, Predictor};
pub use crate::schema::FeatureSchema;
pub use crate::service::{ForecastResponse, ForecastService, TickerUniverse};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Configuration for the forecast service and CLI

use crate::error::Result;
use crate::forecaster::ForecastOptions;
use crate::fundamentals::FundamentalsPolicy;
use crate::models::BaselineModel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment variables overriding file settings,
/// e.g. `STOCK_FORECAST__FORECAST__MAX_HORIZON=60`
pub const ENV_PREFIX: &str = "STOCK_FORECAST";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub forecast: ForecastSettings,
    pub data: DataConfig,
    pub models: ModelsConfig,
}

/// Forecast request bounds and pipeline switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Calendar days of history fetched before the forecast date
    pub lookback_days: u32,
    pub min_horizon: usize,
    pub max_horizon: usize,
    /// Horizon used when a request does not name one
    pub default_horizon: usize,
    pub fundamentals_policy: FundamentalsPolicy,
    pub fill_gaps: bool,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            lookback_days: 365,
            min_horizon: 1,
            max_horizon: 120,
            default_horizon: 30,
            fundamentals_policy: FundamentalsPolicy::FetchOnce,
            fill_gaps: true,
        }
    }
}

impl ForecastSettings {
    pub fn options(&self) -> ForecastOptions {
        ForecastOptions {
            fundamentals_policy: self.fundamentals_policy,
            fill_gaps: self.fill_gaps,
        }
    }
}

/// Where market data, the ticker universe and model schemas live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub universe_path: Option<PathBuf>,
    pub price_schema_path: Option<PathBuf>,
    pub volume_schema_path: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            universe_path: None,
            price_schema_path: None,
            volume_schema_path: None,
        }
    }
}

/// Baseline predictors wired in by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub price: BaselineModel,
    pub volume: BaselineModel,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            price: BaselineModel::Feature {
                column: "EMA_10".to_string(),
            },
            volume: BaselineModel::Constant { value: 0.0 },
        }
    }
}

impl ForecastConfig {
    /// Load defaults, then the optional file, then `STOCK_FORECAST__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

//! Stock forecast CLI
//!
//! Forecasts daily closes and volumes for one ticker from CSV market data.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use price_forecast::config::ForecastConfig;
use price_forecast::export;
use price_forecast::market::CsvMarketData;
use price_forecast::models::LoadedModel;
use price_forecast::schema::FeatureSchema;
use price_forecast::service::{ForecastService, TickerUniverse};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "stock-forecast")]
#[command(about = "Recursive multi-day price and volume forecast for one ticker")]
struct Cli {
    /// Ticker symbol, with or without the exchange suffix
    symbol: String,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Forecast horizon in trading days
    #[arg(short, long)]
    days: Option<usize>,

    /// Last date of history to use (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = ForecastConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    let market = CsvMarketData::new(&config.data.data_dir)
        .with_context(|| format!("failed to open market data in {}", config.data.data_dir.display()))?;
    let universe = match &config.data.universe_path {
        Some(path) => TickerUniverse::from_json_file(path)
            .with_context(|| format!("failed to load ticker universe {}", path.display()))?,
        None => {
            // Without a universe file only the requested symbol is accepted
            let mut tickers = BTreeMap::new();
            tickers.insert(cli.symbol.trim().to_uppercase(), 0);
            TickerUniverse::new("", tickers)
        }
    };

    let price_model = LoadedModel::new(
        config.models.price.clone().into_predictor(),
        load_schema(config.data.price_schema_path.as_deref())?,
    );
    let volume_model = LoadedModel::new(
        config.models.volume.clone().into_predictor(),
        load_schema(config.data.volume_schema_path.as_deref())?,
    );

    let days = cli.days.unwrap_or(config.forecast.default_horizon);
    let as_of = cli
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let service = ForecastService::new(
        Arc::new(market),
        price_model,
        volume_model,
        universe,
        config.forecast.clone(),
    );
    let response = service
        .predict(&cli.symbol, days, as_of)
        .with_context(|| format!("forecast for {} failed", cli.symbol))?;
    tracing::info!(symbol = %response.symbol, steps = response.predictions.len(), "forecast ready");

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    match cli.format {
        OutputFormat::Json => writeln!(out, "{}", export::to_json(&response)?)?,
        OutputFormat::Csv => export::write_csv(&mut out, &response.predictions)?,
    }
    out.flush()?;

    Ok(())
}

fn load_schema(path: Option<&Path>) -> Result<Option<FeatureSchema>> {
    path.map(|p| {
        FeatureSchema::from_json_file(p)
            .with_context(|| format!("failed to load feature schema {}", p.display()))
    })
    .transpose()
}

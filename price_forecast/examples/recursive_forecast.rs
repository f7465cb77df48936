use price_forecast::features::ema_column;
use price_forecast::forecaster::{ForecastJob, ForecastOptions, RecursiveForecaster};
use price_forecast::fundamentals::FundamentalsSnapshot;
use price_forecast::market::InMemoryMarketData;
use price_forecast::models::{FeatureEchoPredictor, FnPredictor, LoadedModel};
use price_forecast::schema::FeatureSchema;
use price_forecast::utils::{date_parser, random_walk_series};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A year of synthetic daily bars
    let start = date_parser::parse_date("2024-01-01")?;
    let history = random_walk_series(start, 250, 2_500.0, 0.015, 7)?;

    let market = InMemoryMarketData::new().with_fundamentals(
        "INFY.NS",
        FundamentalsSnapshot {
            market_cap: Some(6.3e12),
            trailing_pe: Some(24.5),
            beta: Some(0.7),
            ..Default::default()
        },
    );

    // Price: persistence of the 10-day EMA. Volume: fixed turnover scaled by RSI.
    let price_model = LoadedModel::new(
        Arc::new(FeatureEchoPredictor::new(ema_column(10))),
        Some(FeatureSchema::new(["EMA_10", "MA_20", "RSI_14", "marketCap"])?),
    );
    let volume_model = LoadedModel::new(
        Arc::new(FnPredictor::new("rsi-scaled volume", |row| {
            1_000_000.0 * row.get("RSI_14").unwrap_or(50.0) / 50.0
        })),
        Some(FeatureSchema::new(["RSI_14"])?),
    );

    let forecaster = RecursiveForecaster::new(price_model, volume_model, ForecastOptions::default());
    let job = ForecastJob::new("INFY.NS", &history, 10);
    let records = forecaster.forecast(&job, &market)?;

    println!("Last close: {:.2}", history.last().map(|b| b.close).unwrap_or_default());
    for record in &records {
        println!(
            "{}  close {:>10.2}  volume {:>12.0}  RSI {:>6.2}",
            record.date,
            record.predicted_close.unwrap_or(f64::NAN),
            record.predicted_volume.unwrap_or(f64::NAN),
            record.feature("RSI_14").unwrap_or(f64::NAN),
        );
    }

    Ok(())
}

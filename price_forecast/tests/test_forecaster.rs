use price_forecast::calendar::{is_weekend, next_trading_day};
use price_forecast::data::OhlcvSeries;
use price_forecast::error::{ForecastError, Result};
use price_forecast::forecaster::{ForecastJob, ForecastOptions, RecursiveForecaster};
use price_forecast::fundamentals::{FundamentalsPolicy, FundamentalsSnapshot, FundamentalsSource};
use price_forecast::market::InMemoryMarketData;
use price_forecast::models::{ConstantPredictor, FeatureEchoPredictor, FnPredictor, LoadedModel};
use price_forecast::schema::FeatureSchema;
use price_forecast::utils::{constant_series, date_parser, random_walk_series};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn constant_history() -> OhlcvSeries {
    let start = date_parser::parse_date("2024-01-01").unwrap();
    constant_series(start, 60, 100.0, 1_000_000.0).unwrap()
}

fn constant_forecaster(options: ForecastOptions) -> RecursiveForecaster {
    RecursiveForecaster::new(
        LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(100.0))),
        LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(1_000_000.0))),
        options,
    )
}

/// Fundamentals source that counts lookups
#[derive(Default)]
struct CountingSource {
    calls: AtomicUsize,
}

impl FundamentalsSource for CountingSource {
    fn fetch_fundamentals(&self, _symbol: &str) -> Result<FundamentalsSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FundamentalsSnapshot {
            beta: Some(1.1),
            ..Default::default()
        })
    }
}

#[test]
fn test_zero_horizon_returns_nothing() {
    let history = constant_history();
    let before = history.clone();
    let forecaster = constant_forecaster(ForecastOptions::default());

    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 0), &InMemoryMarketData::new())
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(history, before);
}

#[test]
fn test_constant_models_reproduce_constant_series() {
    let history = constant_history();
    let forecaster = constant_forecaster(ForecastOptions::default());

    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 5), &InMemoryMarketData::new())
        .unwrap();

    assert_eq!(records.len(), 5);
    for record in &records {
        assert_eq!(record.predicted_close, Some(100.0));
        assert_eq!(record.predicted_volume, Some(1_000_000.0));
        assert_eq!(record.bar.close, 100.0);
        assert_eq!(record.bar.volume, 1_000_000.0);
        assert_eq!(record.feature("MA_5"), Some(100.0));
    }
}

#[test]
fn test_dates_are_consecutive_trading_days() {
    let history = constant_history();
    let last_date = history.last().unwrap().date;
    let forecaster = constant_forecaster(ForecastOptions::default());

    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 12), &InMemoryMarketData::new())
        .unwrap();

    assert_eq!(records.len(), 12);
    assert_eq!(records[0].date, next_trading_day(last_date));
    for pair in records.windows(2) {
        assert_eq!(pair[1].date, next_trading_day(pair[0].date));
    }
    assert!(records.iter().all(|r| !is_weekend(r.date)));
}

#[test]
fn test_empty_history_is_no_data() {
    let forecaster = constant_forecaster(ForecastOptions::default());
    let empty = OhlcvSeries::default();

    let result = forecaster.forecast(&ForecastJob::new("TCS.NS", &empty, 3), &InMemoryMarketData::new());
    assert!(matches!(result, Err(ForecastError::NoData(_))));
}

#[test]
fn test_non_finite_prediction_falls_back_to_last_values() {
    let history = constant_history();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let flaky = FnPredictor::new("flaky", move |_row| {
        if counter.fetch_add(1, Ordering::SeqCst) == 1 {
            f64::NAN
        } else {
            101.0
        }
    });

    let forecaster = RecursiveForecaster::new(
        LoadedModel::unconstrained(Arc::new(flaky)),
        LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(f64::INFINITY))),
        ForecastOptions::default(),
    );
    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 4), &InMemoryMarketData::new())
        .unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[0].predicted_close, Some(101.0));
    assert_eq!(records[1].predicted_close, None);
    assert_eq!(records[1].bar.close, 101.0);
    assert!(records.iter().all(|r| r.bar.is_finite()));
    assert!(records.iter().all(|r| r.predicted_volume.is_none()));
    assert!(records.iter().all(|r| r.bar.volume == 1_000_000.0));
}

#[test]
fn test_fundamentals_fetched_once_by_default() {
    let history = constant_history();
    let source = CountingSource::default();
    let forecaster = constant_forecaster(ForecastOptions::default());

    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 3), &source)
        .unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(records.iter().all(|r| r.feature("beta") == Some(1.1)));
}

#[test]
fn test_fundamentals_fetched_per_step() {
    let history = constant_history();
    let source = CountingSource::default();
    let forecaster = constant_forecaster(ForecastOptions {
        fundamentals_policy: FundamentalsPolicy::FetchPerStep,
        ..Default::default()
    });

    forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 3), &source)
        .unwrap();

    // Initial frame plus one rebuild per step
    assert_eq!(source.calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_missing_fundamentals_degrade_to_null() {
    let history = constant_history();
    let forecaster = constant_forecaster(ForecastOptions::default());

    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 2), &InMemoryMarketData::new())
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].feature("marketCap"), None);
    assert!(records[0].features.iter().any(|(name, _)| name == "marketCap"));
}

#[test]
fn test_constants_reach_every_record() {
    let history = constant_history();
    let forecaster = constant_forecaster(ForecastOptions::default());
    let job = ForecastJob::new("TCS.NS", &history, 3).with_constant("Ticker", 7.0);

    let records = forecaster.forecast(&job, &InMemoryMarketData::new()).unwrap();
    assert!(records.iter().all(|r| r.feature("Ticker") == Some(7.0)));
}

#[test]
fn test_schema_drives_predictor_input() {
    let history = constant_history();
    let seen = Arc::new(AtomicUsize::new(0));
    let width = Arc::clone(&seen);
    let recorder = FnPredictor::new("row width", move |row| {
        width.store(row.len(), Ordering::SeqCst);
        row.get("MA_5").unwrap_or(f64::NAN)
    });

    let forecaster = RecursiveForecaster::new(
        LoadedModel::new(
            Arc::new(recorder),
            Some(FeatureSchema::new(["MA_5", "NotEngineered"]).unwrap()),
        ),
        LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(1_000_000.0))),
        ForecastOptions::default(),
    );
    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 2), &InMemoryMarketData::new())
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(records[0].predicted_close, Some(100.0));
    // Records carry the full engineered row, not the aligned one
    assert!(records[0].feature("NotEngineered").is_none());
    assert!(records[0].features.len() > 2);
}

#[test]
fn test_empty_schema_feeds_full_row() {
    let history = constant_history();
    let seen = Arc::new(AtomicUsize::new(0));
    let width = Arc::clone(&seen);
    let recorder = FnPredictor::new("width", move |row| {
        width.store(row.len(), Ordering::SeqCst);
        100.0
    });

    let forecaster = RecursiveForecaster::new(
        LoadedModel::new(Arc::new(recorder), Some(FeatureSchema::from_json_str("[]").unwrap())),
        LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(1_000_000.0))),
        ForecastOptions::default(),
    );
    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 1), &InMemoryMarketData::new())
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), records[0].features.len());
    assert!(seen.load(Ordering::SeqCst) > 0);
}

#[test]
fn test_json_uses_null_for_undefined_values() {
    let history = constant_history();
    let forecaster = RecursiveForecaster::new(
        LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(100.0))),
        LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(f64::NAN))),
        ForecastOptions::default(),
    );
    let records = forecaster
        .forecast(&ForecastJob::new("TCS.NS", &history, 1), &InMemoryMarketData::new())
        .unwrap();

    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(json["date"], "2024-03-25");
    assert_eq!(json["predicted_close"], 100.0);
    assert!(json["predicted_volume"].is_null());
    // A flat series never loses, so RSI is undefined
    assert!(json["RSI_14"].is_null());
    assert!(json["trailingPE"].is_null());
}

#[test]
fn test_concurrent_forecasts_match_sequential() {
    let start = date_parser::parse_date("2023-06-01").unwrap();
    let a = random_walk_series(start, 200, 120.0, 0.01, 1).unwrap();
    let b = random_walk_series(start, 200, 900.0, 0.03, 2).unwrap();
    let forecaster = RecursiveForecaster::new(
        LoadedModel::unconstrained(Arc::new(FeatureEchoPredictor::new("EMA_10"))),
        LoadedModel::unconstrained(Arc::new(ConstantPredictor::new(5_000.0))),
        ForecastOptions::default(),
    );
    let market = InMemoryMarketData::new();

    let sequential_a = forecaster.forecast(&ForecastJob::new("A", &a, 10), &market).unwrap();
    let sequential_b = forecaster.forecast(&ForecastJob::new("B", &b, 10), &market).unwrap();

    let (parallel_a, parallel_b) = std::thread::scope(|s| {
        let ha = s.spawn(|| forecaster.forecast(&ForecastJob::new("A", &a, 10), &market).unwrap());
        let hb = s.spawn(|| forecaster.forecast(&ForecastJob::new("B", &b, 10), &market).unwrap());
        (ha.join().unwrap(), hb.join().unwrap())
    });

    assert_eq!(parallel_a, sequential_a);
    assert_eq!(parallel_b, sequential_b);
}

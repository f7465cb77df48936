//! Recursive multi-step forecasting.
//!
//! Each step predicts the next close and volume from the last engineered
//! row, synthesizes a bar from the prediction, appends it to a private
//! working copy of the history and rebuilds every feature over the whole
//! extended series before the next step. Steps are strictly sequential.

use crate::calendar::next_trading_day;
use crate::data::{Bar, OhlcvSeries};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureBuilder, FeatureFrame, FeatureRow};
use crate::fundamentals::{FundamentalsAttacher, FundamentalsPolicy, FundamentalsSource};
use crate::models::LoadedModel;
use crate::schema::align;
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, info, warn};

/// Behaviour switches of the forecaster
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOptions {
    /// Whether fundamentals are fetched once per call or on every step
    pub fundamentals_policy: FundamentalsPolicy,
    /// Forward/back-fill undefined cells before alignment and emission
    pub fill_gaps: bool,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            fundamentals_policy: FundamentalsPolicy::FetchOnce,
            fill_gaps: true,
        }
    }
}

/// One forecast call: the symbol, its history and the horizon, plus any
/// constant columns (such as the ticker id) to attach to every frame.
#[derive(Debug, Clone)]
pub struct ForecastJob<'a> {
    pub symbol: &'a str,
    pub history: &'a OhlcvSeries,
    pub horizon: usize,
    pub constants: Vec<(String, f64)>,
}

impl<'a> ForecastJob<'a> {
    pub fn new(symbol: &'a str, history: &'a OhlcvSeries, horizon: usize) -> Self {
        Self {
            symbol,
            history,
            horizon,
            constants: Vec::new(),
        }
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: f64) -> Self {
        self.constants.push((name.into(), value));
        self
    }
}

/// One forecast step. Non-finite numbers are already replaced by `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    /// Trading date of the synthesized bar
    pub date: NaiveDate,
    /// Raw price prediction
    pub predicted_close: Option<f64>,
    /// Raw volume prediction
    pub predicted_volume: Option<f64>,
    /// The bar appended to the working series for this step
    pub bar: Bar,
    /// Engineered features of the appended row, in frame order
    pub features: Vec<(String, Option<f64>)>,
}

impl ForecastRecord {
    fn new(bar: Bar, predicted_close: f64, predicted_volume: f64, row: &FeatureRow) -> Self {
        Self {
            date: bar.date,
            predicted_close: sanitize(predicted_close),
            predicted_volume: sanitize(predicted_volume),
            bar,
            features: row
                .iter()
                .map(|(name, value)| (name.to_string(), value.and_then(sanitize)))
                .collect(),
        }
    }

    /// Value of a named feature
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }
}

/// Flat object: date, predictions, then every feature; absent values are `null`
impl Serialize for ForecastRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.features.len()))?;
        map.serialize_entry("date", &self.date.format("%Y-%m-%d").to_string())?;
        map.serialize_entry("predicted_close", &self.predicted_close)?;
        map.serialize_entry("predicted_volume", &self.predicted_volume)?;
        for (name, value) in &self.features {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Keep finite numbers, turn NaN and infinities into `None`
pub fn sanitize(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Build the next bar from a predicted close and volume.
///
/// Open and close both take the predicted close (or the last known close when
/// the prediction is not finite); high and low are their max and min. Volume
/// is the prediction floored at zero, or the last known volume when the
/// prediction is not finite.
pub fn synthesize_bar(
    date: NaiveDate,
    predicted_close: f64,
    predicted_volume: f64,
    last_close: f64,
    last_volume: f64,
) -> Bar {
    let close = if predicted_close.is_finite() {
        predicted_close
    } else {
        last_close
    };
    let open = close;
    let volume = if predicted_volume.is_finite() {
        predicted_volume.max(0.0)
    } else {
        last_volume
    };

    Bar::new(date, open, open.max(close), open.min(close), close, volume)
}

/// The recursive forecaster with its two injected models
#[derive(Debug, Clone)]
pub struct RecursiveForecaster {
    price_model: LoadedModel,
    volume_model: LoadedModel,
    builder: FeatureBuilder,
    options: ForecastOptions,
}

impl RecursiveForecaster {
    pub fn new(price_model: LoadedModel, volume_model: LoadedModel, options: ForecastOptions) -> Self {
        Self {
            price_model,
            volume_model,
            builder: FeatureBuilder::new(),
            options,
        }
    }

    pub fn options(&self) -> &ForecastOptions {
        &self.options
    }

    /// Run `job.horizon` recursive steps and return one record per step.
    ///
    /// Fails with [`ForecastError::NoData`] on an empty history. Predictor
    /// and fundamentals failures degrade to fallback values instead.
    pub fn forecast<S>(&self, job: &ForecastJob<'_>, fundamentals: &S) -> Result<Vec<ForecastRecord>>
    where
        S: FundamentalsSource + ?Sized,
    {
        let Some(last) = job.history.last().copied() else {
            return Err(ForecastError::NoData(job.symbol.to_string()));
        };

        info!(
            symbol = job.symbol,
            horizon = job.horizon,
            history = job.history.len(),
            price_model = self.price_model.name(),
            volume_model = self.volume_model.name(),
            "starting recursive forecast"
        );

        let mut attacher = FundamentalsAttacher::new(fundamentals, job.symbol, self.options.fundamentals_policy);
        let mut working = job.history.clone();
        let mut engineered = self.engineer(&working, job, &mut attacher)?;
        let mut price_x = align(&engineered, self.price_model.schema());
        let mut volume_x = align(&engineered, self.volume_model.schema());

        let mut last_date = last.date;
        let mut last_close = last.close;
        let mut last_volume = last.volume;
        let mut records = Vec::with_capacity(job.horizon);

        for step in 0..job.horizon {
            let predicted_close = self.predict(&self.price_model, &price_x, job.symbol, step)?;
            let predicted_volume = self.predict(&self.volume_model, &volume_x, job.symbol, step)?;

            let bar = synthesize_bar(
                next_trading_day(last_date),
                predicted_close,
                predicted_volume,
                last_close,
                last_volume,
            );
            if !predicted_close.is_finite() || !predicted_volume.is_finite() {
                warn!(
                    symbol = job.symbol,
                    step,
                    date = %bar.date,
                    "non-finite prediction, synthesized bar uses last known values"
                );
            }
            working.push(bar)?;

            engineered = self.engineer(&working, job, &mut attacher)?;
            price_x = align(&engineered, self.price_model.schema());
            volume_x = align(&engineered, self.volume_model.schema());

            let row = engineered.last_row().ok_or_else(|| {
                ForecastError::DataError("Engineered frame is empty after append".to_string())
            })?;
            debug!(
                symbol = job.symbol,
                step,
                date = %bar.date,
                predicted_close,
                predicted_volume,
                "forecast step"
            );
            records.push(ForecastRecord::new(bar, predicted_close, predicted_volume, &row));

            last_date = bar.date;
            last_close = bar.close;
            last_volume = bar.volume;
        }

        info!(
            symbol = job.symbol,
            steps = records.len(),
            fundamentals_fetches = attacher.fetches(),
            "forecast complete"
        );
        Ok(records)
    }

    /// Features, fundamentals and constants over the whole series
    fn engineer<S>(
        &self,
        series: &OhlcvSeries,
        job: &ForecastJob<'_>,
        attacher: &mut FundamentalsAttacher<'_, S>,
    ) -> Result<FeatureFrame>
    where
        S: FundamentalsSource + ?Sized,
    {
        let mut frame = self.builder.build(series)?;
        attacher.attach(&mut frame);
        for (name, value) in &job.constants {
            frame.insert_constant(name.as_str(), Some(*value));
        }
        if self.options.fill_gaps {
            frame.fill_gaps();
        }
        Ok(frame)
    }

    /// Predict from the last aligned row; failures become NaN
    fn predict(&self, model: &LoadedModel, aligned: &FeatureFrame, symbol: &str, step: usize) -> Result<f64> {
        let row = aligned
            .last_row()
            .ok_or_else(|| ForecastError::DataError("Aligned feature matrix is empty".to_string()))?;

        Ok(match model.predictor().predict(&row) {
            Ok(value) => value,
            Err(e) => {
                warn!(symbol, step, model = model.name(), error = %e, "prediction failed");
                f64::NAN
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    #[test]
    fn test_synthesize_bar_from_finite_prediction() {
        let bar = synthesize_bar(day(), 101.5, 2_000.0, 100.0, 1_000.0);
        assert_eq!(bar.open, 101.5);
        assert_eq!(bar.close, 101.5);
        assert_eq!(bar.high, 101.5);
        assert_eq!(bar.low, 101.5);
        assert_eq!(bar.volume, 2_000.0);
    }

    #[test]
    fn test_synthesize_bar_falls_back() {
        let bar = synthesize_bar(day(), f64::NAN, f64::INFINITY, 100.0, 1_000.0);
        assert_eq!(bar.close, 100.0);
        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.volume, 1_000.0);
        assert!(bar.is_finite());
    }

    #[test]
    fn test_negative_volume_is_floored() {
        let bar = synthesize_bar(day(), 100.0, -50.0, 100.0, 1_000.0);
        assert_eq!(bar.volume, 0.0);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(1.0), Some(1.0));
        assert_eq!(sanitize(f64::NAN), None);
        assert_eq!(sanitize(f64::NEG_INFINITY), None);
    }
}

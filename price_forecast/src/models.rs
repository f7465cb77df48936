//! Opaque predictors and the models that bind them to a feature schema

use crate::error::Result;
use crate::features::FeatureRow;
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// A trained regressor: one aligned feature row in, one scalar out.
///
/// Implementations must be safe to share between concurrent forecasts.
pub trait Predictor: Debug + Send + Sync {
    /// Predict the target for a single row
    fn predict(&self, row: &FeatureRow) -> Result<f64>;

    /// Name of the predictor
    fn name(&self) -> &str;
}

/// A predictor together with the schema it was trained on.
///
/// Loaded once and never mutated; clones share the predictor.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    predictor: Arc<dyn Predictor>,
    schema: Option<FeatureSchema>,
}

impl LoadedModel {
    pub fn new(predictor: Arc<dyn Predictor>, schema: Option<FeatureSchema>) -> Self {
        Self { predictor, schema }
    }

    /// A model that accepts the engineered frame as-is
    pub fn unconstrained(predictor: Arc<dyn Predictor>) -> Self {
        Self::new(predictor, None)
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.schema.as_ref()
    }

    pub fn name(&self) -> &str {
        self.predictor.name()
    }
}

/// Predictor that always returns the same value
#[derive(Debug, Clone)]
pub struct ConstantPredictor {
    name: String,
    value: f64,
}

impl ConstantPredictor {
    pub fn new(value: f64) -> Self {
        Self {
            name: format!("Constant ({})", value),
            value,
        }
    }
}

impl Predictor for ConstantPredictor {
    fn predict(&self, _row: &FeatureRow) -> Result<f64> {
        Ok(self.value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Baseline that echoes one feature of the row, e.g. a moving average as a
/// persistence forecast of the close. Undefined or absent features give NaN.
#[derive(Debug, Clone)]
pub struct FeatureEchoPredictor {
    name: String,
    column: String,
}

impl FeatureEchoPredictor {
    pub fn new(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            name: format!("Feature echo ({})", column),
            column,
        }
    }
}

impl Predictor for FeatureEchoPredictor {
    fn predict(&self, row: &FeatureRow) -> Result<f64> {
        Ok(row.get(&self.column).unwrap_or(f64::NAN))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Predictor backed by a closure
pub struct FnPredictor<F> {
    name: String,
    f: F,
}

impl<F> FnPredictor<F>
where
    F: Fn(&FeatureRow) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Debug for FnPredictor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredictor").field("name", &self.name).finish()
    }
}

impl<F> Predictor for FnPredictor<F>
where
    F: Fn(&FeatureRow) -> f64 + Send + Sync,
{
    fn predict(&self, row: &FeatureRow) -> Result<f64> {
        Ok((self.f)(row))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Baseline predictor selection, as written in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaselineModel {
    /// Always predict `value`
    Constant { value: f64 },
    /// Echo the named feature
    Feature { column: String },
}

impl BaselineModel {
    pub fn into_predictor(self) -> Arc<dyn Predictor> {
        match self {
            BaselineModel::Constant { value } => Arc::new(ConstantPredictor::new(value)),
            BaselineModel::Feature { column } => Arc::new(FeatureEchoPredictor::new(column)),
        }
    }
}

//! Feature schemas and alignment of frames to them.

use crate::error::{ForecastError, Result};
use crate::features::FeatureFrame;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Value used for schema columns the frame does not have
pub const MISSING_COLUMN_FILL: f64 = 0.0;

/// Ordered column names a trained model was fit on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema; column names must be unique
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Duplicate column '{}' in feature schema",
                    name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Parse a schema from a JSON array of column names
    pub fn from_json_str(json: &str) -> Result<Self> {
        let columns: Vec<String> = serde_json::from_str(json)?;
        Self::new(columns)
    }

    /// Load a schema from a JSON file holding an array of column names
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Reshape a frame to exactly the schema's columns, in the schema's order.
///
/// Present columns are copied verbatim, missing ones are filled with
/// [`MISSING_COLUMN_FILL`], and columns outside the schema are dropped.
/// Without a schema, or with an empty one, the frame passes through unchanged.
pub fn align(frame: &FeatureFrame, schema: Option<&FeatureSchema>) -> FeatureFrame {
    let Some(schema) = schema.filter(|s| !s.is_empty()) else {
        return frame.clone();
    };

    let mut aligned = FeatureFrame::new(frame.index().to_vec());
    for name in schema.columns() {
        let values = match frame.column(name) {
            Some(values) => values.to_vec(),
            None => vec![Some(MISSING_COLUMN_FILL); frame.len()],
        };
        aligned.set_column(name.clone(), values);
    }
    aligned
}

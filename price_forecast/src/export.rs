//! Writing forecasts as CSV or JSON

use crate::error::Result;
use crate::forecaster::ForecastRecord;
use crate::service::ForecastResponse;
use std::io::Write;

/// Write records as CSV: `date,predicted_close,predicted_volume,<features...>`.
///
/// Absent values are written as empty cells. The feature header is taken
/// from the first record.
pub fn write_csv<W: Write>(writer: W, records: &[ForecastRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let feature_names: Vec<&str> = records
        .first()
        .map(|r| r.features.iter().map(|(name, _)| name.as_str()).collect())
        .unwrap_or_default();

    let mut header = vec!["date", "predicted_close", "predicted_volume"];
    header.extend(feature_names.iter().copied());
    csv.write_record(&header)?;

    for record in records {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.date.format("%Y-%m-%d").to_string());
        row.push(cell(record.predicted_close));
        row.push(cell(record.predicted_volume));
        for name in &feature_names {
            row.push(cell(record.feature(name)));
        }
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Pretty JSON of a whole response
pub fn to_json(response: &ForecastResponse) -> Result<String> {
    Ok(serde_json::to_string_pretty(response)?)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

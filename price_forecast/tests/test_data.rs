use chrono::NaiveDate;
use price_forecast::data::{Bar, DataLoader, OhlcvSeries};
use price_forecast::error::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    writeln!(file, "2023-01-04,106.0,110.0,104.0,108.0,107.0,1500").unwrap();
    writeln!(file, "2023-01-02,100.0,105.0,98.0,103.0,102.0,1000").unwrap();
    writeln!(file, "2023-01-03,103.0,107.0,101.0,106.0,105.0,1200").unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.len(), 3);
    assert_eq!(series.dates(), vec![date(2), date(3), date(4)]);
    // The adjusted close column is not mistaken for the close
    assert_eq!(series.closes(), vec![103.0, 106.0, 108.0]);
    assert_eq!(series.last().unwrap().volume, 1500.0);
}

#[test]
fn test_data_loader_skips_incomplete_rows() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    writeln!(file, "2023-01-02,100.0,105.0,98.0,103.0,1000").unwrap();
    writeln!(file, "2023-01-03,103.0,107.0,101.0,,1200").unwrap();
    writeln!(file, "2023-01-04,106.0,110.0,104.0,108.0,1500").unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(series.dates(), vec![date(2), date(4)]);
}

#[test]
fn test_data_loader_error_handling() {
    assert!(DataLoader::from_csv("nonexistent_file.csv").is_err());

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "when,price").unwrap();
    writeln!(file, "2023-01-02,100.0").unwrap();
    assert!(matches!(
        DataLoader::from_csv(file.path()),
        Err(ForecastError::DataError(_))
    ));
}

#[test]
fn test_series_rejects_duplicate_dates() {
    let bars = vec![
        Bar::new(date(2), 1.0, 1.0, 1.0, 1.0, 10.0),
        Bar::new(date(2), 1.0, 1.0, 1.0, 1.0, 10.0),
    ];
    assert!(OhlcvSeries::new(bars.clone()).is_err());
    assert!(OhlcvSeries::from_unsorted(bars).is_err());
}

#[test]
fn test_series_rejects_negative_volume() {
    let mut series = OhlcvSeries::default();
    series.push(Bar::new(date(2), 1.0, 1.0, 1.0, 1.0, 10.0)).unwrap();
    let result = series.push(Bar::new(date(3), 1.0, 1.0, 1.0, 1.0, -1.0));
    assert!(matches!(result, Err(ForecastError::DataError(_))));
    assert_eq!(series.len(), 1);
}

#[test]
fn test_series_rejects_out_of_order_push() {
    let mut series = OhlcvSeries::default();
    series.push(Bar::new(date(5), 1.0, 1.0, 1.0, 1.0, 10.0)).unwrap();
    assert!(series.push(Bar::new(date(4), 1.0, 1.0, 1.0, 1.0, 10.0)).is_err());
}

#[test]
fn test_between_is_inclusive() {
    let series = OhlcvSeries::new(
        (2..=6)
            .map(|d| Bar::new(date(d), 1.0, 1.0, 1.0, d as f64, 10.0))
            .collect(),
    )
    .unwrap();

    let window = series.between(date(3), date(5));
    assert_eq!(window.closes(), vec![3.0, 4.0, 5.0]);
    assert!(series.between(date(10), date(12)).is_empty());
}

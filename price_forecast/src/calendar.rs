//! Trading-day arithmetic.
//!
//! Only weekends are skipped; exchange holidays are not modelled.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Whether the date falls on Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first Monday-to-Friday date strictly after `date`.
pub fn next_trading_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Days::new(1);
    while is_weekend(next) {
        next = next + Days::new(1);
    }
    next
}

/// The `count` consecutive trading days following `date`.
pub fn trading_days_after(date: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut current = date;
    for _ in 0..count {
        current = next_trading_day(current);
        days.push(current);
    }
    days
}

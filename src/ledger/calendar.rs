//! Calendar-date arithmetic shared by every other engine component.
//!
//! Dates never carry a time of day or a zone. Month arithmetic clamps to the
//! last valid day of the target month, so `2024-01-31 + 1 month` lands on
//! `2024-02-29` rather than overflowing into March.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, NaiveDate};

use crate::errors::{EngineError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| EngineError::MalformedDate(raw.to_string()))
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or_else(|| saturate(days))
}

/// Shifts `date` by whole months, clamping the day to the target month length.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    let month = total.rem_euclid(12) as u32 + 1;
    let Ok(year) = i32::try_from(total.div_euclid(12)) else {
        return saturate(months as i64);
    };
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| saturate(months as i64))
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(days_in_month(date.year(), date.month()))
        .unwrap_or(date)
}

/// Three-way comparison returning `-1`, `0` or `1`.
pub fn compare(a: NaiveDate, b: NaiveDate) -> i8 {
    match a.cmp(&b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// True iff `date` lies within `[reference, reference + days]`, both ends inclusive.
pub fn within_days(date: NaiveDate, days: i64, reference: NaiveDate) -> bool {
    date >= reference && date <= add_days(reference, days)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 {
        (year.saturating_add(1), 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last_current| last_current.day())
        .unwrap_or(28)
}

/// Absolute month counter (`year * 12 + month0`) used for bucketing.
pub fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Whole calendar months from `from` to `to`, ignoring the day of month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    month_index(to) - month_index(from)
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    month_index(a) == month_index(b)
}

fn saturate(direction: i64) -> NaiveDate {
    if direction >= 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    }
}

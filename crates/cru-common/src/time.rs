//! Calendar handling for monthly datasets.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{CruError, CruResult};

/// First indexed year of the CRU monthly temperature files.
pub const CRU_BASE_YEAR: i32 = 1901;

/// Parse a calendar date.
///
/// Supports:
/// - Date only: "1901-01-01"
/// - Naive datetime: "1901-01-01T00:00:00" (time part dropped)
/// - RFC 3339: "1901-01-01T00:00:00Z" (time part dropped)
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ndt.date());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date format: {0}")]
    InvalidFormat(String),
}

impl From<TimeParseError> for CruError {
    fn from(err: TimeParseError) -> Self {
        CruError::config(err.to_string())
    }
}

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Fail with a configuration error naming `label` unless `date` is inside.
    pub fn require(&self, label: &str, date: NaiveDate) -> CruResult<()> {
        if self.contains(date) {
            Ok(())
        } else {
            Err(CruError::invalid_value(
                label,
                format!(
                    "{} is outside the dataset's valid range {} to {}",
                    date, self.start, self.end
                ),
            ))
        }
    }
}

/// Maps calendar dates onto the time dimension of a monthly dataset.
///
/// Month index 0 is January of `base_year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCalendar {
    pub base_year: i32,
    /// Number of months held along the time dimension
    pub month_count: usize,
}

impl MonthCalendar {
    pub fn new(base_year: i32, month_count: usize) -> Self {
        Self {
            base_year,
            month_count,
        }
    }

    /// Unchecked month index of a date: `month + 12 * (year - base_year) - 1`.
    pub fn month_index(&self, date: NaiveDate) -> i64 {
        date.month() as i64 + 12 * (date.year() - self.base_year) as i64 - 1
    }

    /// Month index of a date, failing if it is outside `[0, month_count)`.
    pub fn checked_month_index(&self, date: NaiveDate) -> CruResult<usize> {
        let index = self.month_index(date);
        if index < 0 || index >= self.month_count as i64 {
            return Err(CruError::date_out_of_range(
                date,
                format!(
                    "month index {} is outside [0, {}) for base year {}",
                    index, self.month_count, self.base_year
                ),
            ));
        }
        Ok(index as usize)
    }
}

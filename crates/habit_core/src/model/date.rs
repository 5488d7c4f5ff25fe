//! Calendar date value used across buckets, windows and chart points.
//!
//! # Responsibility
//! - Provide a validated `(year, month, day)` value with chronological order.
//! - Centralize the day arithmetic used by range extraction and charting.
//!
//! # Invariants
//! - A `DateValue` always names a real calendar day.
//! - Years are limited to `MIN_YEAR..=MAX_YEAR` so neighbor-day arithmetic
//!   never leaves the representable range.

use chrono::{Datelike, NaiveDate};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

const ISO_FORMAT: &str = "%Y-%m-%d";
const CHART_FORMAT: &str = "%Y/%m/%d";

/// Errors produced when building a `DateValue` from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The triple does not name a calendar day (e.g. `2023-02-29`).
    Invalid { year: i32, month: u32, day: u32 },
    /// The year is outside the supported range.
    YearOutOfRange(i32),
    /// Text input is not `YYYY-MM-DD`.
    Unparsable(String),
}

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { year, month, day } => {
                write!(f, "invalid calendar date {year:04}-{month:02}-{day:02}")
            }
            Self::YearOutOfRange(year) => write!(
                f,
                "year {year} is outside supported range {MIN_YEAR}..={MAX_YEAR}"
            ),
            Self::Unparsable(value) => write!(f, "expected YYYY-MM-DD date, got `{value}`"),
        }
    }
}

impl Error for DateError {}

/// A single calendar day.
///
/// Ordered by `(year, month, day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateValue(NaiveDate);

impl DateValue {
    /// Builds a date from its parts, rejecting impossible days.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(DateError::YearOutOfRange(year));
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(DateError::Invalid { year, month, day })
    }

    /// Parses `YYYY-MM-DD`.
    pub fn parse(text: &str) -> Result<Self, DateError> {
        let trimmed = text.trim();
        let date = NaiveDate::parse_from_str(trimmed, ISO_FORMAT)
            .map_err(|_| DateError::Unparsable(trimmed.to_string()))?;
        Self::from_naive(date)
    }

    /// Wraps a chrono date, applying the supported year range.
    pub fn from_naive(date: NaiveDate) -> Result<Self, DateError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
            return Err(DateError::YearOutOfRange(date.year()));
        }
        Ok(Self(date))
    }

    /// Wraps a date read from the system clock without the range check;
    /// day arithmetic saturates, so an out-of-range clock cannot panic.
    pub(crate) fn from_wall_clock(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// The calendar day before this one.
    ///
    /// Saturates at the earliest representable date, which the year range
    /// keeps out of reach.
    pub fn previous_day(&self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// Returns the date `days` calendar days earlier, saturating like
    /// [`DateValue::previous_day`].
    pub fn days_before(&self, days: u32) -> Self {
        (0..days).fold(*self, |date, _| date.previous_day())
    }

    /// Whether `self` is exactly one calendar day before `other`.
    pub fn is_day_before(&self, other: DateValue) -> bool {
        self.0.succ_opt() == Some(other.0)
    }

    /// Formats the date the way chart payloads expect (`yyyy/MM/dd`).
    pub fn to_chart_string(&self) -> String {
        self.0.format(CHART_FORMAT).to_string()
    }
}

impl Display for DateValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(ISO_FORMAT))
    }
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DateValue", 3)?;
        state.serialize_field("year", &self.year())?;
        state.serialize_field("month", &self.month())?;
        state.serialize_field("day", &self.day())?;
        state.end()
    }
}

/// Number of days in `(year, month)`, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next_first.signed_duration_since(first).num_days()).ok()
}

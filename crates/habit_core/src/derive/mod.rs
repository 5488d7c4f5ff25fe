//! Read-side views derived from month buckets.
//!
//! # Responsibility
//! - Reconstruct done dates inside a window.
//! - Build the compressed cumulative chart series.
//!
//! # Invariants
//! - Pure functions of their inputs: no store access, no clock access.
//! - Buckets are folded into one `(year, month) -> DaySet` map, so input order
//!   and accidental duplicates never change the result.

use crate::model::date::DateValue;
use crate::model::month_record::{DaySet, HabitMonthRecord};
use std::collections::BTreeMap;

pub mod chart;
pub mod range;

pub use chart::build_chart_series;
pub use range::extract_done_dates;

type MonthIndex = BTreeMap<(i32, u32), DaySet>;

fn index_by_month(records: &[HabitMonthRecord]) -> MonthIndex {
    let mut index = MonthIndex::new();
    for record in records {
        let month = (record.key.month.year(), record.key.month.month());
        let days = index.entry(month).or_default();
        *days = days.union(&record.days);
    }
    index
}

fn expand_days(
    (year, month): (i32, u32),
    days: &DaySet,
) -> impl Iterator<Item = DateValue> + '_ {
    days.iter()
        .filter_map(move |day| DateValue::new(year, month, day).ok())
}

/// All done dates across `records`, ascending and deduplicated.
pub fn all_done_dates(records: &[HabitMonthRecord]) -> Vec<DateValue> {
    index_by_month(records)
        .iter()
        .flat_map(|(month, days)| expand_days(*month, days))
        .collect()
}

/// Number of distinct done dates across `records`.
pub fn done_count(records: &[HabitMonthRecord]) -> u32 {
    index_by_month(records)
        .values()
        .map(|days| days.len() as u32)
        .sum()
}

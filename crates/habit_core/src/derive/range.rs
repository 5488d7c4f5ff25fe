//! Done dates inside a closed date window.

use crate::derive::{expand_days, index_by_month};
use crate::model::date::DateValue;
use crate::model::month_record::HabitMonthRecord;

/// Returns every done date in `[start, end]` (both inclusive), ascending.
///
/// Only buckets whose month intersects the window are expanded. An inverted
/// window (`start > end`) yields nothing.
pub fn extract_done_dates(
    records: &[HabitMonthRecord],
    start: DateValue,
    end: DateValue,
) -> Vec<DateValue> {
    if start > end {
        return Vec::new();
    }

    let index = index_by_month(records);
    let first_month = (start.year(), start.month());
    let last_month = (end.year(), end.month());

    index
        .range(first_month..=last_month)
        .flat_map(|(month, days)| expand_days(*month, days))
        .filter(|date| start <= *date && *date <= end)
        .collect()
}

//! Cumulative done-count step series.
//!
//! The series stores only the points where the step function changes or
//! starts a plateau, not one point per calendar day:
//! - a zero point the day before the first done date,
//! - one point per done date carrying the new running total,
//! - a plateau point the day before a done date that ends a gap,
//! - a closing point at `today` when the last done date is earlier.

use crate::derive::all_done_dates;
use crate::model::date::DateValue;
use crate::model::month_record::HabitMonthRecord;
use crate::model::view::{ChartPoint, ChartSeries};

/// Builds the step series for one habit's buckets.
///
/// Counts are non-decreasing and dates strictly increasing; N done dates
/// produce at most `2 * N + 2` points. Done dates later than `today` do not
/// get a trailing `today` point, which would break date ordering.
pub fn build_chart_series(records: &[HabitMonthRecord], today: DateValue) -> ChartSeries {
    let dates = all_done_dates(records);
    let Some(first) = dates.first() else {
        return ChartSeries::default();
    };

    let mut points = Vec::with_capacity(dates.len() * 2 + 2);
    let mut previous = first.previous_day();
    points.push(ChartPoint::new(previous, 0));

    let mut count = 0u32;
    for date in dates {
        if !previous.is_day_before(date) {
            points.push(ChartPoint::new(date.previous_day(), count));
        }
        count += 1;
        points.push(ChartPoint::new(date, count));
        previous = date;
    }

    if previous < today {
        points.push(ChartPoint::new(today, count));
    }
    ChartSeries::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::build_chart_series;
    use crate::model::date::DateValue;
    use crate::model::habit::UserId;
    use crate::model::month_record::{DaySet, HabitMonthRecord, MonthKey, MonthRecordKey};
    use crate::model::view::ChartPoint;
    use uuid::Uuid;

    fn date(year: i32, month: u32, day: u32) -> DateValue {
        DateValue::new(year, month, day).unwrap()
    }

    fn records_for(dates: &[DateValue]) -> Vec<HabitMonthRecord> {
        let habit = Uuid::new_v4();
        let mut records: Vec<HabitMonthRecord> = Vec::new();
        for date in dates {
            let month = MonthKey::for_date(habit, *date);
            match records.iter_mut().find(|r| r.key.month == month) {
                Some(record) => {
                    record.days.insert(date.day());
                }
                None => records.push(HabitMonthRecord {
                    key: MonthRecordKey::new(UserId::new("user-1").unwrap(), month),
                    days: [date.day()].into_iter().collect::<DaySet>(),
                    version: None,
                }),
            }
        }
        records
    }

    fn pairs(records: &[HabitMonthRecord], today: DateValue) -> Vec<(DateValue, u32)> {
        build_chart_series(records, today)
            .points()
            .iter()
            .map(|p| (p.date, p.cumulative_count))
            .collect()
    }

    #[test]
    fn no_records_gives_empty_series() {
        assert!(build_chart_series(&[], date(2024, 3, 1)).is_empty());
    }

    #[test]
    fn single_done_today() {
        let today = date(2024, 3, 1);
        let records = records_for(&[today]);
        assert_eq!(
            pairs(&records, today),
            vec![(date(2024, 2, 29), 0), (today, 1)]
        );
    }

    #[test]
    fn gap_inserts_plateau_before_next_done_date() {
        let today = date(2024, 3, 10);
        let records = records_for(&[date(2024, 3, 3), today]);
        assert_eq!(
            pairs(&records, today),
            vec![
                (date(2024, 3, 2), 0),
                (date(2024, 3, 3), 1),
                (date(2024, 3, 9), 1),
                (today, 2),
            ]
        );
    }

    #[test]
    fn closing_point_extends_to_today() {
        let today = date(2024, 3, 10);
        let records = records_for(&[date(2024, 3, 9)]);
        assert_eq!(
            pairs(&records, today),
            vec![(date(2024, 3, 8), 0), (date(2024, 3, 9), 1), (today, 1)]
        );
    }

    #[test]
    fn consecutive_run_across_months_has_no_plateaus() {
        let today = date(2024, 2, 2);
        let records = records_for(&[
            date(2024, 1, 30),
            date(2024, 1, 31),
            date(2024, 2, 1),
            today,
        ]);
        let counts: Vec<u32> = build_chart_series(&records, today)
            .points()
            .iter()
            .map(|p| p.cumulative_count)
            .collect();
        assert_eq!(counts, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn series_is_monotone_and_bounded() {
        let today = date(2024, 6, 30);
        let done = [
            date(2023, 12, 31),
            date(2024, 1, 1),
            date(2024, 1, 5),
            date(2024, 2, 29),
            date(2024, 3, 1),
            date(2024, 6, 2),
        ];
        let series = build_chart_series(&records_for(&done), today);
        let points: &[ChartPoint] = series.points();

        assert_eq!(points[0].cumulative_count, 0);
        assert!(points.len() <= 2 * done.len() + 2);
        for pair in points.windows(2) {
            assert!(pair[0].date < pair[1].date);
            assert!(pair[0].cumulative_count <= pair[1].cumulative_count);
        }
        assert!(series.last().unwrap().date >= today);
        assert_eq!(series.last().unwrap().cumulative_count, done.len() as u32);
    }

    #[test]
    fn future_done_date_skips_today_point() {
        let today = date(2024, 3, 1);
        let records = records_for(&[date(2024, 3, 5)]);
        assert_eq!(
            pairs(&records, today),
            vec![(date(2024, 3, 4), 0), (date(2024, 3, 5), 1)]
        );
    }

    #[test]
    fn chart_data_uses_slash_labels() {
        let today = date(2024, 3, 1);
        let data = build_chart_series(&records_for(&[today]), today).to_chart_data();
        assert_eq!(data.dates, vec!["2024/02/29", "2024/03/01"]);
        assert_eq!(data.values, vec![0, 1]);
    }
}

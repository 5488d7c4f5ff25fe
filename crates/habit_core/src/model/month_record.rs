//! Month-bucketed done-date model.
//!
//! # Responsibility
//! - Define the persisted bucket holding one habit's done days for one month.
//! - Define the partition/sort key shapes used to address buckets.
//!
//! # Invariants
//! - A bucket is addressed by `(user_id, habit_id, year, month)`; at most one
//!   exists per address.
//! - `days` only holds days that exist in the bucket's month.
//! - A persisted bucket is never empty; emptying one deletes it.
//! - `version` is assigned by the store and must round-trip unchanged into the
//!   next write.

use crate::model::date::{days_in_month, DateValue, MAX_YEAR, MIN_YEAR};
use crate::model::habit::{HabitId, UserId};
use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DAY_MASK_VALID_BITS: u32 = !1;

/// Kind of item stored under a user's partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    HabitDefinition,
    HabitMonthRecord,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HabitDefinition => "habit_definition",
            Self::HabitMonthRecord => "habit_month_record",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "habit_definition" => Some(Self::HabitDefinition),
            "habit_month_record" => Some(Self::HabitMonthRecord),
            _ => None,
        }
    }
}

/// Partition key: every item of one kind owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub user_id: UserId,
    pub kind: RecordKind,
}

impl PartitionKey {
    pub fn habit_definitions(user_id: UserId) -> Self {
        Self {
            user_id,
            kind: RecordKind::HabitDefinition,
        }
    }

    pub fn month_records(user_id: UserId) -> Self {
        Self {
            user_id,
            kind: RecordKind::HabitMonthRecord,
        }
    }
}

/// Failures when constructing month keys or buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthRecordError {
    InvalidMonth { year: i32, month: u32 },
    EmptyDays(MonthKey),
    DayOutOfRange { key: MonthKey, day: u32 },
}

impl Display for MonthRecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonth { year, month } => {
                write!(f, "invalid bucket month {year:04}-{month:02}")
            }
            Self::EmptyDays(key) => write!(f, "bucket {key} has no done days"),
            Self::DayOutOfRange { key, day } => {
                write!(f, "day {day} does not exist in bucket {key}")
            }
        }
    }
}

impl Error for MonthRecordError {}

/// Sort key of a bucket: `(habit_id, year, month)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    habit_id: HabitId,
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(habit_id: HabitId, year: i32, month: u32) -> Result<Self, MonthRecordError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return Err(MonthRecordError::InvalidMonth { year, month });
        }
        Ok(Self {
            habit_id,
            year,
            month,
        })
    }

    /// The bucket a done date belongs to.
    pub fn for_date(habit_id: HabitId, date: DateValue) -> Self {
        Self {
            habit_id,
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn habit_id(&self) -> HabitId {
        self.habit_id
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month).unwrap_or(0)
    }

    /// Full date for `day` inside this bucket, if the day exists.
    pub fn date_of(&self, day: u32) -> Option<DateValue> {
        DateValue::new(self.year, self.month, day).ok()
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{:04}-{:02}", self.habit_id, self.year, self.month)
    }
}

/// Full address of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonthRecordKey {
    pub user_id: UserId,
    pub month: MonthKey,
}

impl MonthRecordKey {
    pub fn new(user_id: UserId, month: MonthKey) -> Self {
        Self { user_id, month }
    }

    pub fn for_date(user_id: UserId, habit_id: HabitId, date: DateValue) -> Self {
        Self::new(user_id, MonthKey::for_date(habit_id, date))
    }

    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::month_records(self.user_id.clone())
    }
}

/// Set of days-of-month, stored as a bit mask over days `1..=31`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DaySet(u32);

impl DaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a set from its persisted mask; bit 0 must be clear.
    pub fn from_mask(mask: u32) -> Option<Self> {
        if mask & !DAY_MASK_VALID_BITS != 0 {
            return None;
        }
        Some(Self(mask))
    }

    pub fn mask(&self) -> u32 {
        self.0
    }

    /// Adds `day`; returns `false` when already present or outside `1..=31`.
    pub fn insert(&mut self, day: u32) -> bool {
        if !(1..=31).contains(&day) || self.contains(day) {
            return false;
        }
        self.0 |= 1 << day;
        true
    }

    /// Removes `day`; returns `false` when it was not present.
    pub fn remove(&mut self, day: u32) -> bool {
        if !self.contains(day) {
            return false;
        }
        self.0 &= !(1 << day);
        true
    }

    pub fn contains(&self, day: u32) -> bool {
        (1..=31).contains(&day) && self.0 & (1 << day) != 0
    }

    pub fn union(&self, other: &DaySet) -> DaySet {
        DaySet(self.0 | other.0)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn last(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(31 - self.0.leading_zeros())
        }
    }

    /// Days in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=31).filter(move |day| self.contains(*day))
    }
}

impl FromIterator<u32> for DaySet {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        let mut set = DaySet::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl Serialize for DaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Opaque store-assigned write version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionStamp(Uuid);

impl VersionStamp {
    /// Mints a stamp for a new write. Only stores call this.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Display for VersionStamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One habit's done days in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitMonthRecord {
    pub key: MonthRecordKey,
    pub days: DaySet,
    /// `None` until the store has accepted a first write.
    pub version: Option<VersionStamp>,
}

impl HabitMonthRecord {
    /// A not-yet-persisted bucket holding exactly `day`.
    pub fn with_day(key: MonthRecordKey, day: u32) -> Self {
        let mut days = DaySet::new();
        days.insert(day);
        Self {
            key,
            days,
            version: None,
        }
    }

    pub fn habit_id(&self) -> HabitId {
        self.key.month.habit_id()
    }

    pub fn contains(&self, day: u32) -> bool {
        self.days.contains(day)
    }

    pub fn done_count(&self) -> usize {
        self.days.len()
    }

    /// Done days expanded to full dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = DateValue> + '_ {
        self.days
            .iter()
            .filter_map(move |day| self.key.month.date_of(day))
    }

    /// Checks the persisted-bucket invariants.
    pub fn validate(&self) -> Result<(), MonthRecordError> {
        if self.days.is_empty() {
            return Err(MonthRecordError::EmptyDays(self.key.month));
        }
        if let Some(last) = self.days.last() {
            if last > self.key.month.days_in_month() {
                return Err(MonthRecordError::DayOutOfRange {
                    key: self.key.month,
                    day: last,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DaySet, HabitMonthRecord, MonthKey, MonthRecordError, MonthRecordKey};
    use crate::model::habit::UserId;
    use uuid::Uuid;

    fn key(year: i32, month: u32) -> MonthRecordKey {
        MonthRecordKey::new(
            UserId::new("user-1").unwrap(),
            MonthKey::new(Uuid::new_v4(), year, month).unwrap(),
        )
    }

    #[test]
    fn day_set_has_set_semantics_and_ordered_iteration() {
        let mut days: DaySet = [15, 1, 31, 15].into_iter().collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days.iter().collect::<Vec<_>>(), vec![1, 15, 31]);
        assert!(!days.insert(15));
        assert!(!days.insert(0));
        assert!(!days.insert(32));
        assert!(days.remove(1));
        assert!(!days.remove(1));
        assert_eq!(days.last(), Some(31));
    }

    #[test]
    fn day_set_mask_rejects_bit_zero() {
        assert!(DaySet::from_mask(1).is_none());
        let days = DaySet::from_mask((1 << 3) | (1 << 9)).unwrap();
        assert_eq!(days.iter().collect::<Vec<_>>(), vec![3, 9]);
    }

    #[test]
    fn month_key_rejects_invalid_month() {
        assert_eq!(
            MonthKey::new(Uuid::new_v4(), 2024, 13).unwrap_err(),
            MonthRecordError::InvalidMonth {
                year: 2024,
                month: 13
            }
        );
    }

    #[test]
    fn validate_rejects_empty_and_out_of_month_days() {
        let mut record = HabitMonthRecord::with_day(key(2023, 2), 28);
        assert!(record.validate().is_ok());

        record.days.insert(30);
        assert!(matches!(
            record.validate(),
            Err(MonthRecordError::DayOutOfRange { day: 30, .. })
        ));

        record.days = DaySet::new();
        assert!(matches!(
            record.validate(),
            Err(MonthRecordError::EmptyDays(_))
        ));
    }

    #[test]
    fn dates_expand_in_order() {
        let mut record = HabitMonthRecord::with_day(key(2024, 1), 31);
        record.days.insert(2);
        let dates: Vec<String> = record.dates().map(|date| date.to_string()).collect();
        assert_eq!(dates, ["2024-01-02", "2024-01-31"]);
    }
}

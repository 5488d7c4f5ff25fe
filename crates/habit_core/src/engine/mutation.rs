//! Optimistic-concurrency add/remove of done days.
//!
//! Every operation reads the bucket, edits an in-memory copy, and writes it
//! back with the version it read. A lost compare-and-swap re-reads and
//! re-decides; the loop is bounded by `max_attempts`.

use crate::engine::{EngineError, EngineResult};
use crate::model::date::DateValue;
use crate::model::habit::{HabitId, UserId};
use crate::model::month_record::{HabitMonthRecord, MonthRecordKey, VersionStamp};
use crate::repo::month_record_repo::MonthRecordRepository;
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, info, warn};

/// Attempt bound shared by every mutation.
pub const MAX_MUTATION_ATTEMPTS: u32 = 10;

/// How an add-day request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddDayOutcome {
    /// A new bucket was created for the month.
    Inserted,
    /// The day was added to an existing bucket.
    Updated,
    /// The day was already recorded, by this caller or a racing one.
    AlreadyPresent,
}

/// How a remove-day request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveDayOutcome {
    /// The day was removed and the bucket still holds other days.
    Updated,
    /// The day was the last one; the bucket was deleted.
    Deleted,
    /// A racing writer removed the day (or the bucket) first.
    AlreadyAbsent,
}

/// Applies day-level changes to month buckets.
pub struct MutationEngine<'r, M: MonthRecordRepository + ?Sized> {
    records: &'r M,
    max_attempts: u32,
}

impl<'r, M: MonthRecordRepository + ?Sized> MutationEngine<'r, M> {
    pub fn new(records: &'r M) -> Self {
        Self {
            records,
            max_attempts: MAX_MUTATION_ATTEMPTS,
        }
    }

    /// Overrides the attempt bound. Values below 1 are raised to 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Marks `date` as done for the habit.
    ///
    /// Idempotent: adding a day that is already recorded is a no-op.
    ///
    /// # Errors
    /// - `ConcurrencyExhausted` after `max_attempts` lost writes.
    /// - `Repo` for any non-conflict store failure.
    pub fn add_day(
        &self,
        user_id: &UserId,
        habit_id: HabitId,
        date: DateValue,
    ) -> EngineResult<AddDayOutcome> {
        let key = MonthRecordKey::for_date(user_id.clone(), habit_id, date);
        let day = date.day();
        let mut current = self.records.get_month_record(&key)?;

        for attempt in 1..=self.max_attempts {
            let written = match current.take() {
                None => {
                    let record = HabitMonthRecord::with_day(key.clone(), day);
                    self.records
                        .put_month_record(&record, None)
                        .map(|_| AddDayOutcome::Inserted)
                }
                Some(mut record) => {
                    if record.contains(day) {
                        debug!(
                            "event=add_day module=engine status=noop habit_id={habit_id} date={date} attempt={attempt}"
                        );
                        return Ok(AddDayOutcome::AlreadyPresent);
                    }
                    record.days.insert(day);
                    let expected = required_version(&record)?;
                    self.records
                        .put_month_record(&record, Some(expected))
                        .map(|_| AddDayOutcome::Updated)
                }
            };

            match written {
                Ok(outcome) => {
                    info!(
                        "event=add_day module=engine status=ok outcome={outcome:?} habit_id={habit_id} date={date} attempts={attempt}"
                    );
                    return Ok(outcome);
                }
                Err(RepoError::Conflict(_)) => {
                    warn!(
                        "event=add_day module=engine status=conflict habit_id={habit_id} date={date} attempt={attempt}"
                    );
                    // A vanished bucket comes back as `None` and is re-inserted.
                    current = self.records.get_month_record(&key)?;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(self.exhausted("add_day", &key, Some(day)))
    }

    /// Removes `date` from the habit's done days.
    ///
    /// # Errors
    /// - `DoneDateNotFound` when the day is not recorded at call time.
    /// - `ConcurrencyExhausted` after `max_attempts` lost writes.
    /// - `Repo` for any non-conflict store failure.
    pub fn remove_day(
        &self,
        user_id: &UserId,
        habit_id: HabitId,
        date: DateValue,
    ) -> EngineResult<RemoveDayOutcome> {
        let key = MonthRecordKey::for_date(user_id.clone(), habit_id, date);
        let day = date.day();
        let mut current = self.records.get_month_record(&key)?;

        if !current.as_ref().is_some_and(|record| record.contains(day)) {
            return Err(EngineError::DoneDateNotFound { habit_id, date });
        }

        for attempt in 1..=self.max_attempts {
            let Some(mut record) = current.take() else {
                return Ok(self.already_absent(habit_id, date, attempt));
            };
            if !record.contains(day) {
                return Ok(self.already_absent(habit_id, date, attempt));
            }

            record.days.remove(day);
            let expected = required_version(&record)?;
            let written = if record.days.is_empty() {
                self.records
                    .delete_month_record(&key, expected)
                    .map(|()| RemoveDayOutcome::Deleted)
            } else {
                self.records
                    .put_month_record(&record, Some(expected))
                    .map(|_| RemoveDayOutcome::Updated)
            };

            match written {
                Ok(outcome) => {
                    info!(
                        "event=remove_day module=engine status=ok outcome={outcome:?} habit_id={habit_id} date={date} attempts={attempt}"
                    );
                    return Ok(outcome);
                }
                Err(RepoError::Conflict(_)) => {
                    warn!(
                        "event=remove_day module=engine status=conflict habit_id={habit_id} date={date} attempt={attempt}"
                    );
                    current = self.records.get_month_record(&key)?;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(self.exhausted("remove_day", &key, Some(day)))
    }

    /// Deletes a whole bucket for cascade cleanup.
    ///
    /// Absence is success. Returns `true` when this call performed the delete.
    pub fn purge_month(&self, key: &MonthRecordKey) -> EngineResult<bool> {
        let mut current = self.records.get_month_record(key)?;

        for attempt in 1..=self.max_attempts {
            let Some(record) = current.take() else {
                return Ok(false);
            };
            let expected = required_version(&record)?;

            match self.records.delete_month_record(key, expected) {
                Ok(()) => {
                    debug!(
                        "event=purge_month module=engine status=ok habit_id={} year={} month={} attempts={attempt}",
                        key.month.habit_id(),
                        key.month.year(),
                        key.month.month()
                    );
                    return Ok(true);
                }
                Err(RepoError::Conflict(_)) => {
                    warn!(
                        "event=purge_month module=engine status=conflict habit_id={} year={} month={} attempt={attempt}",
                        key.month.habit_id(),
                        key.month.year(),
                        key.month.month()
                    );
                    current = self.records.get_month_record(key)?;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(self.exhausted("purge_month", key, None))
    }

    fn already_absent(&self, habit_id: HabitId, date: DateValue, attempt: u32) -> RemoveDayOutcome {
        debug!(
            "event=remove_day module=engine status=noop habit_id={habit_id} date={date} attempt={attempt}"
        );
        RemoveDayOutcome::AlreadyAbsent
    }

    fn exhausted(&self, event: &str, key: &MonthRecordKey, day: Option<u32>) -> EngineError {
        error!(
            "event={event} module=engine status=error error_code=concurrency_exhausted habit_id={} year={} month={} attempts={}",
            key.month.habit_id(),
            key.month.year(),
            key.month.month(),
            self.max_attempts
        );
        EngineError::ConcurrencyExhausted {
            month: key.month,
            day,
            attempts: self.max_attempts,
        }
    }
}

/// Stored buckets always carry a version; one without is corrupt input.
fn required_version(record: &HabitMonthRecord) -> RepoResult<VersionStamp> {
    record.version.ok_or_else(|| {
        RepoError::InvalidData(format!("stored bucket {} has no version", record.key.month))
    })
}

//! Habit use-case service.
//!
//! # Responsibility
//! - Orchestrate definition storage, the mutation engine and derived views
//!   into the operations front ends call.
//!
//! # Invariants
//! - Day mutations require the habit definition to exist.
//! - Habit deletion removes buckets first, then the definition, as
//!   independent store calls. A crash in between leaves orphaned buckets,
//!   which stay unreachable because they are only read through a live
//!   definition.
//! - Reads always go to the store; nothing is cached between calls.

use crate::clock::{Clock, SystemClock};
use crate::derive::{all_done_dates, build_chart_series, done_count, extract_done_dates};
use crate::engine::{AddDayOutcome, MutationEngine, RemoveDayOutcome};
use crate::model::date::DateValue;
use crate::model::habit::{HabitDefinition, HabitId, UserId};
use crate::model::month_record::{HabitMonthRecord, PartitionKey};
use crate::model::view::HabitRecord;
use crate::repo::habit_repo::HabitDefinitionRepository;
use crate::repo::month_record_repo::{MonthRecordRepository, SortKeyPredicate};
use crate::service::{ServiceError, ServiceResult};
use log::info;
use std::collections::BTreeMap;

/// Days before today included in the weekly window.
const WEEKLY_WINDOW_DAYS_BACK: u32 = 6;

/// Use-case facade over habit and bucket repositories.
pub struct HabitService<H, M, C = SystemClock> {
    habits: H,
    month_records: M,
    clock: C,
}

impl<H, M> HabitService<H, M, SystemClock>
where
    H: HabitDefinitionRepository,
    M: MonthRecordRepository,
{
    /// Creates a service that reads "today" from the local wall clock.
    pub fn new(habits: H, month_records: M) -> Self {
        Self::with_clock(habits, month_records, SystemClock)
    }
}

impl<H, M, C> HabitService<H, M, C>
where
    H: HabitDefinitionRepository,
    M: MonthRecordRepository,
    C: Clock,
{
    pub fn with_clock(habits: H, month_records: M, clock: C) -> Self {
        Self {
            habits,
            month_records,
            clock,
        }
    }

    pub fn today(&self) -> DateValue {
        self.clock.today()
    }

    /// Creates a habit and returns its generated id.
    pub fn create_habit(&self, user_id: &UserId, name: &str) -> ServiceResult<HabitId> {
        let habit = HabitDefinition::new(user_id.clone(), name)?;
        let habit_id = self.habits.create_habit(&habit)?;
        info!("event=habit_create module=service status=ok habit_id={habit_id}");
        Ok(habit_id)
    }

    pub fn rename_habit(
        &self,
        user_id: &UserId,
        habit_id: HabitId,
        new_name: &str,
    ) -> ServiceResult<()> {
        let habit = self.require_habit(user_id, habit_id)?;
        let renamed = habit.renamed(new_name)?;
        self.habits.update_habit(&renamed)?;
        info!("event=habit_rename module=service status=ok habit_id={habit_id}");
        Ok(())
    }

    /// Deletes the habit and every bucket it owns.
    pub fn delete_habit(&self, user_id: &UserId, habit_id: HabitId) -> ServiceResult<()> {
        self.require_habit(user_id, habit_id)?;

        let buckets = self.habit_buckets(user_id, habit_id)?;
        let engine = MutationEngine::new(&self.month_records);
        let mut purged = 0usize;
        for bucket in &buckets {
            if engine.purge_month(&bucket.key)? {
                purged += 1;
            }
        }

        self.habits.delete_habit(user_id, habit_id)?;
        info!(
            "event=habit_delete module=service status=ok habit_id={habit_id} buckets_found={} buckets_purged={purged}",
            buckets.len()
        );
        Ok(())
    }

    /// Lists the user's habits ordered by name.
    pub fn list_habits(&self, user_id: &UserId) -> ServiceResult<Vec<HabitDefinition>> {
        Ok(self.habits.list_habits(user_id)?)
    }

    /// Records `date` as done; repeating the call is a no-op.
    pub fn mark_done(
        &self,
        user_id: &UserId,
        habit_id: HabitId,
        date: DateValue,
    ) -> ServiceResult<AddDayOutcome> {
        self.require_habit(user_id, habit_id)?;
        let engine = MutationEngine::new(&self.month_records);
        Ok(engine.add_day(user_id, habit_id, date)?)
    }

    /// Removes a recorded done date; `DoneDateNotFound` when absent.
    pub fn unmark_done(
        &self,
        user_id: &UserId,
        habit_id: HabitId,
        date: DateValue,
    ) -> ServiceResult<RemoveDayOutcome> {
        self.require_habit(user_id, habit_id)?;
        let engine = MutationEngine::new(&self.month_records);
        Ok(engine.remove_day(user_id, habit_id, date)?)
    }

    /// Builds per-habit statistics for `[window_start, window_end]`.
    pub fn get_habit_records(
        &self,
        user_id: &UserId,
        window_start: DateValue,
        window_end: DateValue,
    ) -> ServiceResult<Vec<HabitRecord>> {
        if window_start > window_end {
            return Err(ServiceError::InvalidWindow {
                start: window_start,
                end: window_end,
            });
        }

        let today = self.clock.today();
        let definitions = self.habits.list_habits(user_id)?;
        let mut buckets_by_habit = self.buckets_by_habit(user_id)?;

        let records = definitions
            .into_iter()
            .map(|definition| {
                let buckets = buckets_by_habit
                    .remove(&definition.habit_id)
                    .unwrap_or_default();
                HabitRecord {
                    all_time_done_count: done_count(&buckets),
                    window_start,
                    window_end,
                    done_dates_in_window: extract_done_dates(&buckets, window_start, window_end),
                    chart_series: build_chart_series(&buckets, today),
                    definition,
                }
            })
            .collect::<Vec<_>>();

        info!(
            "event=habit_records module=service status=ok habits={} window_start={window_start} window_end={window_end}",
            records.len()
        );
        Ok(records)
    }

    /// Statistics for the seven days ending today.
    pub fn get_weekly_habit_records(&self, user_id: &UserId) -> ServiceResult<Vec<HabitRecord>> {
        let end = self.clock.today();
        let start = end.days_before(WEEKLY_WINDOW_DAYS_BACK);
        self.get_habit_records(user_id, start, end)
    }

    /// Every done date of one habit, oldest first.
    pub fn list_done_dates(
        &self,
        user_id: &UserId,
        habit_id: HabitId,
    ) -> ServiceResult<Vec<DateValue>> {
        self.require_habit(user_id, habit_id)?;
        let buckets = self.habit_buckets(user_id, habit_id)?;
        Ok(all_done_dates(&buckets))
    }

    fn require_habit(&self, user_id: &UserId, habit_id: HabitId) -> ServiceResult<HabitDefinition> {
        self.habits
            .get_habit(user_id, habit_id)?
            .ok_or(ServiceError::HabitNotFound(habit_id))
    }

    fn habit_buckets(
        &self,
        user_id: &UserId,
        habit_id: HabitId,
    ) -> ServiceResult<Vec<HabitMonthRecord>> {
        Ok(self.month_records.query_month_records(
            &PartitionKey::month_records(user_id.clone()),
            SortKeyPredicate::HabitPrefix(habit_id),
        )?)
    }

    fn buckets_by_habit(
        &self,
        user_id: &UserId,
    ) -> ServiceResult<BTreeMap<HabitId, Vec<HabitMonthRecord>>> {
        let buckets = self.month_records.query_month_records(
            &PartitionKey::month_records(user_id.clone()),
            SortKeyPredicate::All,
        )?;

        let mut grouped: BTreeMap<HabitId, Vec<HabitMonthRecord>> = BTreeMap::new();
        for bucket in buckets {
            grouped.entry(bucket.habit_id()).or_default().push(bucket);
        }
        Ok(grouped)
    }
}

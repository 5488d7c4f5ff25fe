//! Token-authenticated entry points.
//!
//! # Responsibility
//! - Resolve the caller from an authorization token before every use-case.
//! - Scope every call to the resolved user; callers never pass a user id.
//!
//! # Invariants
//! - Identity failures surface as `ServiceError::Unauthorized` before any
//!   store access happens.

use crate::clock::{Clock, SystemClock};
use crate::engine::{AddDayOutcome, RemoveDayOutcome};
use crate::identity::IdentityResolver;
use crate::model::date::DateValue;
use crate::model::habit::{HabitDefinition, HabitId, UserId};
use crate::model::view::HabitRecord;
use crate::repo::habit_repo::HabitDefinitionRepository;
use crate::repo::month_record_repo::MonthRecordRepository;
use crate::service::{HabitService, ServiceResult};

/// Habit operations addressed by authorization token.
pub struct HabitApi<I, H, M, C = SystemClock> {
    identity: I,
    service: HabitService<H, M, C>,
}

impl<I, H, M, C> HabitApi<I, H, M, C>
where
    I: IdentityResolver,
    H: HabitDefinitionRepository,
    M: MonthRecordRepository,
    C: Clock,
{
    pub fn new(identity: I, service: HabitService<H, M, C>) -> Self {
        Self { identity, service }
    }

    pub fn service(&self) -> &HabitService<H, M, C> {
        &self.service
    }

    pub fn create_habit(&self, auth_token: &str, name: &str) -> ServiceResult<HabitId> {
        let user_id = self.authenticate(auth_token)?;
        self.service.create_habit(&user_id, name)
    }

    pub fn rename_habit(
        &self,
        auth_token: &str,
        habit_id: HabitId,
        new_name: &str,
    ) -> ServiceResult<()> {
        let user_id = self.authenticate(auth_token)?;
        self.service.rename_habit(&user_id, habit_id, new_name)
    }

    pub fn delete_habit(&self, auth_token: &str, habit_id: HabitId) -> ServiceResult<()> {
        let user_id = self.authenticate(auth_token)?;
        self.service.delete_habit(&user_id, habit_id)
    }

    pub fn list_habits(&self, auth_token: &str) -> ServiceResult<Vec<HabitDefinition>> {
        let user_id = self.authenticate(auth_token)?;
        self.service.list_habits(&user_id)
    }

    pub fn mark_done(
        &self,
        auth_token: &str,
        habit_id: HabitId,
        date: DateValue,
    ) -> ServiceResult<AddDayOutcome> {
        let user_id = self.authenticate(auth_token)?;
        self.service.mark_done(&user_id, habit_id, date)
    }

    pub fn unmark_done(
        &self,
        auth_token: &str,
        habit_id: HabitId,
        date: DateValue,
    ) -> ServiceResult<RemoveDayOutcome> {
        let user_id = self.authenticate(auth_token)?;
        self.service.unmark_done(&user_id, habit_id, date)
    }

    pub fn get_habit_records(
        &self,
        auth_token: &str,
        window_start: DateValue,
        window_end: DateValue,
    ) -> ServiceResult<Vec<HabitRecord>> {
        let user_id = self.authenticate(auth_token)?;
        self.service
            .get_habit_records(&user_id, window_start, window_end)
    }

    pub fn get_weekly_habit_records(&self, auth_token: &str) -> ServiceResult<Vec<HabitRecord>> {
        let user_id = self.authenticate(auth_token)?;
        self.service.get_weekly_habit_records(&user_id)
    }

    pub fn list_done_dates(
        &self,
        auth_token: &str,
        habit_id: HabitId,
    ) -> ServiceResult<Vec<DateValue>> {
        let user_id = self.authenticate(auth_token)?;
        self.service.list_done_dates(&user_id, habit_id)
    }

    fn authenticate(&self, auth_token: &str) -> ServiceResult<UserId> {
        Ok(self.identity.resolve_user_id(auth_token)?)
    }
}

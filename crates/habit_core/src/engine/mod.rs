//! Day-level mutations over month buckets.
//!
//! # Responsibility
//! - Apply mark-done / mark-undone to the right bucket without locks.
//! - Absorb store-level version conflicts with bounded retry.
//!
//! # Invariants
//! - Store conflicts never escape this module; callers see the outcome,
//!   `DoneDateNotFound`, or `ConcurrencyExhausted`.
//! - A bucket is never persisted empty; removing its last day deletes it.
//! - Every write replaces or deletes a whole bucket.

use crate::model::date::DateValue;
use crate::model::habit::HabitId;
use crate::model::month_record::MonthKey;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod mutation;

pub use mutation::{AddDayOutcome, MutationEngine, RemoveDayOutcome, MAX_MUTATION_ATTEMPTS};

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced by the mutation engine.
#[derive(Debug)]
pub enum EngineError {
    /// The date to remove is not recorded as done.
    DoneDateNotFound { habit_id: HabitId, date: DateValue },
    /// Every attempt lost its compare-and-swap.
    ConcurrencyExhausted {
        month: MonthKey,
        day: Option<u32>,
        attempts: u32,
    },
    /// Non-conflict store failure, propagated unchanged.
    Repo(RepoError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DoneDateNotFound { habit_id, date } => {
                write!(f, "habit {habit_id} has no done record for {date}")
            }
            Self::ConcurrencyExhausted {
                month,
                day: Some(day),
                attempts,
            } => write!(
                f,
                "gave up updating habit {} on {:04}-{:02}-{:02} after {attempts} conflicting attempts",
                month.habit_id(),
                month.year(),
                month.month(),
                day
            ),
            Self::ConcurrencyExhausted {
                month,
                day: None,
                attempts,
            } => write!(
                f,
                "gave up purging habit {} bucket {:04}-{:02} after {attempts} conflicting attempts",
                month.habit_id(),
                month.year(),
                month.month()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Map storage and engine failures onto one caller-facing error.
//! - Keep front ends decoupled from storage details.

use crate::engine::EngineError;
use crate::identity::IdentityError;
use crate::model::date::DateValue;
use crate::model::habit::{HabitId, HabitValidationError};
use crate::model::month_record::MonthKey;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod habit_api;
pub mod habit_service;

pub use habit_api::HabitApi;
pub use habit_service::HabitService;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Habit name or user id failed validation.
    InvalidInput(HabitValidationError),
    /// Query window starts after it ends.
    InvalidWindow { start: DateValue, end: DateValue },
    /// Target habit does not exist for the caller.
    HabitNotFound(HabitId),
    /// The date to unmark is not recorded as done.
    DoneDateNotFound { habit_id: HabitId, date: DateValue },
    /// Concurrent writers kept winning; nothing was changed.
    ConcurrencyExhausted {
        month: MonthKey,
        day: Option<u32>,
        attempts: u32,
    },
    /// Caller identity could not be resolved.
    Unauthorized(IdentityError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ServiceError {
    /// Stable machine-readable code for front ends.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidWindow { .. } => "invalid_window",
            Self::HabitNotFound(_) => "habit_not_found",
            Self::DoneDateNotFound { .. } => "done_date_not_found",
            Self::ConcurrencyExhausted { .. } => "concurrency_exhausted",
            Self::Unauthorized(_) => "unauthorized",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::InvalidWindow { start, end } => {
                write!(f, "window start {start} is after window end {end}")
            }
            Self::HabitNotFound(habit_id) => write!(f, "habit not found: {habit_id}"),
            Self::DoneDateNotFound { habit_id, date } => {
                write!(f, "habit {habit_id} has no done record for {date}")
            }
            Self::ConcurrencyExhausted {
                month, attempts, ..
            } => write!(
                f,
                "bucket {month} kept changing concurrently; gave up after {attempts} attempts"
            ),
            Self::Unauthorized(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Unauthorized(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HabitValidationError> for ServiceError {
    fn from(value: HabitValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<IdentityError> for ServiceError {
    fn from(value: IdentityError) -> Self {
        Self::Unauthorized(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(habit_id) => Self::HabitNotFound(habit_id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::DoneDateNotFound { habit_id, date } => {
                Self::DoneDateNotFound { habit_id, date }
            }
            EngineError::ConcurrencyExhausted {
                month,
                day,
                attempts,
            } => Self::ConcurrencyExhausted {
                month,
                day,
                attempts,
            },
            EngineError::Repo(err) => Self::from(err),
        }
    }
}

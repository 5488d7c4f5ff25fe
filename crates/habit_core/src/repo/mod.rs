//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define the storage contracts for habit definitions and month buckets.
//! - Isolate SQL details from mutation and use-case orchestration.
//!
//! # Invariants
//! - Write paths validate model invariants before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Version-check failures surface as `RepoError::Conflict` and nothing else.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::habit::{HabitId, HabitValidationError};
use crate::model::month_record::{MonthKey, MonthRecordError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod habit_repo;
pub mod month_record_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all stores.
#[derive(Debug)]
pub enum RepoError {
    Validation(HabitValidationError),
    Record(MonthRecordError),
    Db(DbError),
    /// Habit definition does not exist for the user.
    NotFound(HabitId),
    /// Compare-and-swap lost: the stored version no longer matches, the row
    /// vanished, or an insert found an existing row.
    Conflict(MonthKey),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Record(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::Conflict(key) => write!(f, "version conflict on bucket {key}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "habit repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Record(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::Conflict(_)
            | Self::UninitializedConnection { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MonthRecordError> for RepoError {
    fn from(value: MonthRecordError) -> Self {
        Self::Record(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects connections that did not go through `open_db*`.
fn ensure_migrated(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

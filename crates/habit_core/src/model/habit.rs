//! Habit definition model.
//!
//! # Responsibility
//! - Define the user-owned record that names a habit.
//! - Normalize and validate display names before they reach storage.
//!
//! # Invariants
//! - `habit_id` is generated once and never reused for another habit.
//! - `name` is always stored in normalized form.
//! - `user_id` is never blank.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a habit.
pub type HabitId = Uuid;

pub const HABIT_NAME_MAX_CHARS: usize = 100;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Validation failures for habit model values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    EmptyUserId,
    EmptyName,
    NameTooLong { max_chars: usize, actual_chars: usize },
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "user id cannot be empty"),
            Self::EmptyName => write!(f, "habit name cannot be empty"),
            Self::NameTooLong {
                max_chars,
                actual_chars,
            } => write!(
                f,
                "habit name has {actual_chars} characters; at most {max_chars} allowed"
            ),
        }
    }
}

impl Error for HabitValidationError {}

/// Identity-provider subject that owns habits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a subject string, trimming surrounding whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, HabitValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(HabitValidationError::EmptyUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named habit owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitDefinition {
    #[serde(skip)]
    pub user_id: UserId,
    pub habit_id: HabitId,
    pub name: String,
}

impl HabitDefinition {
    /// Creates a definition with a freshly generated habit id.
    pub fn new(user_id: UserId, name: &str) -> Result<Self, HabitValidationError> {
        Self::with_id(user_id, Uuid::new_v4(), name)
    }

    /// Creates a definition for an existing habit id.
    pub fn with_id(
        user_id: UserId,
        habit_id: HabitId,
        name: &str,
    ) -> Result<Self, HabitValidationError> {
        Ok(Self {
            user_id,
            habit_id,
            name: normalize_habit_name(name)?,
        })
    }

    /// Returns a copy carrying a new display name; identity is unchanged.
    pub fn renamed(&self, name: &str) -> Result<Self, HabitValidationError> {
        Self::with_id(self.user_id.clone(), self.habit_id, name)
    }

    /// Checks the invariants on values that bypassed the constructors.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.user_id.as_str().trim().is_empty() {
            return Err(HabitValidationError::EmptyUserId);
        }
        normalize_habit_name(&self.name).map(|_| ())
    }
}

/// Trims, collapses internal whitespace runs and enforces length bounds.
pub fn normalize_habit_name(name: &str) -> Result<String, HabitValidationError> {
    let collapsed = WHITESPACE_RE.replace_all(name.trim(), " ").into_owned();
    if collapsed.is_empty() {
        return Err(HabitValidationError::EmptyName);
    }
    let actual_chars = collapsed.chars().count();
    if actual_chars > HABIT_NAME_MAX_CHARS {
        return Err(HabitValidationError::NameTooLong {
            max_chars: HABIT_NAME_MAX_CHARS,
            actual_chars,
        });
    }
    Ok(collapsed)
}

//! Habit tracker domain model.
//!
//! # Responsibility
//! - Define the persisted shapes (habit definitions, month buckets) and the
//!   derived read models built from them.
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId`.
//! - Done dates are stored per month bucket, never one row per day.

pub mod date;
pub mod habit;
pub mod month_record;
pub mod view;

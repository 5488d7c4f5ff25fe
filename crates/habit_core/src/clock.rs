//! Source of "today" for window and chart computations.

use crate::model::date::DateValue;
use chrono::Local;

/// Supplies the current calendar date.
pub trait Clock {
    fn today(&self) -> DateValue;
}

/// Local-timezone wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateValue {
        DateValue::from_wall_clock(Local::now().date_naive())
    }
}

/// Clock pinned to one date; used by tests and replay tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateValue);

impl Clock for FixedClock {
    fn today(&self) -> DateValue {
        self.0
    }
}

//! Core domain logic for the habit tracker.
//! This crate is the single source of truth for done-date storage and the
//! views derived from it.

pub mod clock;
pub mod config;
pub mod db;
pub mod derive;
pub mod engine;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, HabitConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use derive::{build_chart_series, extract_done_dates};
pub use engine::{
    AddDayOutcome, EngineError, EngineResult, MutationEngine, RemoveDayOutcome,
    MAX_MUTATION_ATTEMPTS,
};
pub use identity::{IdentityError, IdentityResolver, StaticIdentityResolver};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::date::{DateError, DateValue};
pub use model::habit::{HabitDefinition, HabitId, HabitValidationError, UserId};
pub use model::month_record::{
    DaySet, HabitMonthRecord, MonthKey, MonthRecordError, MonthRecordKey, PartitionKey,
    RecordKind, VersionStamp,
};
pub use model::view::{ChartData, ChartPoint, ChartSeries, HabitRecord};
pub use repo::habit_repo::{HabitDefinitionRepository, SqliteHabitRepository};
pub use repo::month_record_repo::{
    MonthRecordRepository, SortKeyPredicate, SqliteMonthRecordRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::{HabitApi, HabitService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

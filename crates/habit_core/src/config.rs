//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve database location and logging settings for front ends.
//!
//! # Invariants
//! - Blank values behave exactly like unset values.
//! - The resolved log level is always one of the canonical level names.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "HABIT_TRACKER_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "HABIT_TRACKER_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "HABIT_TRACKER_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "habit_tracker.sqlite3";

/// Configuration resolution failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel { variable: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel { variable, value } => write!(
                f,
                "{variable}=`{value}` is not a log level; expected trace|debug|info|warn|error"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// Logging stays disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl HabitConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = non_blank(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = match non_blank(LOG_LEVEL_ENV) {
            Some(value) => normalize_level(&value).map_err(|_| ConfigError::InvalidLogLevel {
                variable: LOG_LEVEL_ENV,
                value,
            })?,
            None => default_log_level(),
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir: non_blank(LOG_DIR_ENV).map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, HabitConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<HabitConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HabitConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = config_from(&[(DB_PATH_ENV, "  "), (LOG_DIR_ENV, "")]).unwrap();
        assert_eq!(
            config.db_path,
            std::env::temp_dir().join("habit_tracker.sqlite3")
        );
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config_from(&[
            (DB_PATH_ENV, "/var/lib/habits.db"),
            (LOG_LEVEL_ENV, "Warning"),
            (LOG_DIR_ENV, "/var/log/habits"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/habits.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/habits")));
    }

    #[test]
    fn invalid_level_is_rejected() {
        let err = config_from(&[(LOG_LEVEL_ENV, "loud")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidLogLevel {
                variable: LOG_LEVEL_ENV,
                value: "loud".to_string()
            }
        );
    }
}

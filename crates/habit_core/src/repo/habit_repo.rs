//! Habit definition repository contract and SQLite implementation.
//!
//! # Invariants
//! - Rows live under the `(user_id, habit_definition)` partition; one user
//!   can never read or change another user's habits.
//! - Listing is deterministic: `name ASC, habit_id ASC`.

use crate::model::habit::{HabitDefinition, HabitId, UserId};
use crate::model::month_record::{PartitionKey, RecordKind};
use crate::repo::{ensure_migrated, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const DEFINITION_SELECT_SQL: &str = "SELECT
    user_id,
    habit_id,
    name
FROM habit_definitions";

/// Storage contract for habit definitions.
pub trait HabitDefinitionRepository {
    fn create_habit(&self, habit: &HabitDefinition) -> RepoResult<HabitId>;
    /// Replaces the stored name; `NotFound` when the habit does not exist.
    fn update_habit(&self, habit: &HabitDefinition) -> RepoResult<()>;
    fn get_habit(&self, user_id: &UserId, habit_id: HabitId)
        -> RepoResult<Option<HabitDefinition>>;
    fn list_habits(&self, user_id: &UserId) -> RepoResult<Vec<HabitDefinition>>;
    /// Removes the definition row only; bucket cleanup is the caller's job.
    fn delete_habit(&self, user_id: &UserId, habit_id: HabitId) -> RepoResult<()>;
}

/// SQLite-backed habit definition repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Wraps a connection that has been opened through `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        Ok(Self { conn })
    }
}

impl HabitDefinitionRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &HabitDefinition) -> RepoResult<HabitId> {
        habit.validate()?;
        let partition = PartitionKey::habit_definitions(habit.user_id.clone());

        self.conn.execute(
            "INSERT INTO habit_definitions (user_id, record_kind, habit_id, name)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                partition.user_id.as_str(),
                partition.kind.as_str(),
                habit.habit_id.to_string(),
                habit.name.as_str(),
            ],
        )?;

        Ok(habit.habit_id)
    }

    fn update_habit(&self, habit: &HabitDefinition) -> RepoResult<()> {
        habit.validate()?;

        let changed = self.conn.execute(
            "UPDATE habit_definitions
             SET
                name = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE user_id = ?2 AND record_kind = ?3 AND habit_id = ?4;",
            params![
                habit.name.as_str(),
                habit.user_id.as_str(),
                RecordKind::HabitDefinition.as_str(),
                habit.habit_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(habit.habit_id));
        }
        Ok(())
    }

    fn get_habit(
        &self,
        user_id: &UserId,
        habit_id: HabitId,
    ) -> RepoResult<Option<HabitDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEFINITION_SELECT_SQL}
             WHERE user_id = ?1 AND record_kind = ?2 AND habit_id = ?3;"
        ))?;

        let row = stmt
            .query_row(
                params![
                    user_id.as_str(),
                    RecordKind::HabitDefinition.as_str(),
                    habit_id.to_string()
                ],
                read_definition_columns,
            )
            .optional()?;

        row.map(parse_definition).transpose()
    }

    fn list_habits(&self, user_id: &UserId) -> RepoResult<Vec<HabitDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEFINITION_SELECT_SQL}
             WHERE user_id = ?1 AND record_kind = ?2
             ORDER BY name ASC, habit_id ASC;"
        ))?;

        let rows = stmt.query_map(
            params![user_id.as_str(), RecordKind::HabitDefinition.as_str()],
            read_definition_columns,
        )?;

        let mut habits = Vec::new();
        for row in rows {
            habits.push(parse_definition(row?)?);
        }
        Ok(habits)
    }

    fn delete_habit(&self, user_id: &UserId, habit_id: HabitId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM habit_definitions
             WHERE user_id = ?1 AND record_kind = ?2 AND habit_id = ?3;",
            params![
                user_id.as_str(),
                RecordKind::HabitDefinition.as_str(),
                habit_id.to_string()
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(habit_id));
        }
        Ok(())
    }
}

type DefinitionColumns = (String, String, String);

fn read_definition_columns(row: &Row<'_>) -> rusqlite::Result<DefinitionColumns> {
    Ok((row.get("user_id")?, row.get("habit_id")?, row.get("name")?))
}

fn parse_definition(
    (user_text, habit_text, name): DefinitionColumns,
) -> RepoResult<HabitDefinition> {
    let user_id = UserId::new(user_text).map_err(|_| {
        RepoError::InvalidData("blank user id in habit_definitions.user_id".to_string())
    })?;
    let habit_id = Uuid::parse_str(&habit_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{habit_text}` in habit_definitions.habit_id"
        ))
    })?;

    let habit = HabitDefinition {
        user_id,
        habit_id,
        name,
    };
    habit.validate()?;
    Ok(habit)
}

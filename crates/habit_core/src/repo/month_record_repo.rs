//! Month bucket repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store whole buckets with compare-and-swap writes and deletes.
//! - Answer partition queries narrowed by a sort-key predicate.
//!
//! # Invariants
//! - Every accepted write mints a fresh `VersionStamp`; stamps are never
//!   reused, so a bucket that was deleted and recreated cannot be overwritten
//!   with a stamp read from its previous life.
//! - Each write or delete is a single statement, so the version check and the
//!   mutation are atomic with respect to other connections.
//! - A lost compare-and-swap is reported as `RepoError::Conflict` only.

use crate::model::habit::{HabitId, UserId};
use crate::model::month_record::{
    DaySet, HabitMonthRecord, MonthKey, MonthRecordKey, PartitionKey, RecordKind, VersionStamp,
};
use crate::repo::{ensure_migrated, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const MONTH_RECORD_SELECT_SQL: &str = "SELECT
    user_id,
    habit_id,
    year,
    month,
    days_mask,
    version
FROM habit_month_records";

/// Sort-key condition applied inside one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKeyPredicate {
    /// Every bucket in the partition.
    All,
    /// Every bucket of one habit.
    HabitPrefix(HabitId),
    /// Exactly one bucket.
    Exact(MonthKey),
}

/// Storage contract for month buckets.
pub trait MonthRecordRepository {
    /// Returns matching buckets ordered by `(habit_id, year, month)`.
    fn query_month_records(
        &self,
        partition: &PartitionKey,
        predicate: SortKeyPredicate,
    ) -> RepoResult<Vec<HabitMonthRecord>>;

    /// Writes the whole bucket.
    ///
    /// `expected = None` is an insert that fails with `Conflict` when the
    /// bucket already exists; `Some(version)` replaces the bucket only while
    /// its stored version still equals `version`.
    fn put_month_record(
        &self,
        record: &HabitMonthRecord,
        expected: Option<VersionStamp>,
    ) -> RepoResult<VersionStamp>;

    /// Deletes the bucket only while its stored version equals `expected`.
    fn delete_month_record(&self, key: &MonthRecordKey, expected: VersionStamp)
        -> RepoResult<()>;

    /// Fetches the current state of one bucket.
    fn get_month_record(&self, key: &MonthRecordKey) -> RepoResult<Option<HabitMonthRecord>> {
        let mut records =
            self.query_month_records(&key.partition_key(), SortKeyPredicate::Exact(key.month))?;
        if records.len() > 1 {
            return Err(RepoError::InvalidData(format!(
                "{} buckets stored for {}",
                records.len(),
                key.month
            )));
        }
        Ok(records.pop())
    }
}

/// SQLite-backed month bucket repository.
pub struct SqliteMonthRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMonthRecordRepository<'conn> {
    /// Wraps a connection that has been opened through `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        Ok(Self { conn })
    }
}

impl MonthRecordRepository for SqliteMonthRecordRepository<'_> {
    fn query_month_records(
        &self,
        partition: &PartitionKey,
        predicate: SortKeyPredicate,
    ) -> RepoResult<Vec<HabitMonthRecord>> {
        if partition.kind != RecordKind::HabitMonthRecord {
            return Ok(Vec::new());
        }

        let mut sql = format!("{MONTH_RECORD_SELECT_SQL} WHERE user_id = ? AND record_kind = ?");
        let mut bind_values = vec![
            Value::Text(partition.user_id.as_str().to_string()),
            Value::Text(partition.kind.as_str().to_string()),
        ];

        match predicate {
            SortKeyPredicate::All => {}
            SortKeyPredicate::HabitPrefix(habit_id) => {
                sql.push_str(" AND habit_id = ?");
                bind_values.push(Value::Text(habit_id.to_string()));
            }
            SortKeyPredicate::Exact(month) => {
                sql.push_str(" AND habit_id = ? AND year = ? AND month = ?");
                bind_values.push(Value::Text(month.habit_id().to_string()));
                bind_values.push(Value::Integer(i64::from(month.year())));
                bind_values.push(Value::Integer(i64::from(month.month())));
            }
        }
        sql.push_str(" ORDER BY habit_id ASC, year ASC, month ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_month_record_row(row)?);
        }
        Ok(records)
    }

    fn put_month_record(
        &self,
        record: &HabitMonthRecord,
        expected: Option<VersionStamp>,
    ) -> RepoResult<VersionStamp> {
        record.validate()?;

        let key = &record.key;
        let next_version = VersionStamp::generate();
        let changed = match expected {
            None => self.conn.execute(
                "INSERT INTO habit_month_records (
                    user_id,
                    record_kind,
                    habit_id,
                    year,
                    month,
                    days_mask,
                    version
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT (user_id, record_kind, habit_id, year, month) DO NOTHING;",
                params![
                    key.user_id.as_str(),
                    RecordKind::HabitMonthRecord.as_str(),
                    key.month.habit_id().to_string(),
                    key.month.year(),
                    key.month.month(),
                    i64::from(record.days.mask()),
                    next_version.to_string(),
                ],
            )?,
            Some(expected) => self.conn.execute(
                "UPDATE habit_month_records
                 SET
                    days_mask = ?1,
                    version = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE user_id = ?3
                   AND record_kind = ?4
                   AND habit_id = ?5
                   AND year = ?6
                   AND month = ?7
                   AND version = ?8;",
                params![
                    i64::from(record.days.mask()),
                    next_version.to_string(),
                    key.user_id.as_str(),
                    RecordKind::HabitMonthRecord.as_str(),
                    key.month.habit_id().to_string(),
                    key.month.year(),
                    key.month.month(),
                    expected.to_string(),
                ],
            )?,
        };

        if changed == 0 {
            return Err(RepoError::Conflict(key.month));
        }
        Ok(next_version)
    }

    fn delete_month_record(
        &self,
        key: &MonthRecordKey,
        expected: VersionStamp,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM habit_month_records
             WHERE user_id = ?1
               AND record_kind = ?2
               AND habit_id = ?3
               AND year = ?4
               AND month = ?5
               AND version = ?6;",
            params![
                key.user_id.as_str(),
                RecordKind::HabitMonthRecord.as_str(),
                key.month.habit_id().to_string(),
                key.month.year(),
                key.month.month(),
                expected.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::Conflict(key.month));
        }
        Ok(())
    }
}

fn parse_month_record_row(row: &Row<'_>) -> RepoResult<HabitMonthRecord> {
    let user_text: String = row.get("user_id")?;
    let user_id = UserId::new(user_text).map_err(|_| {
        RepoError::InvalidData("blank user id in habit_month_records.user_id".to_string())
    })?;

    let habit_text: String = row.get("habit_id")?;
    let habit_id = Uuid::parse_str(&habit_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{habit_text}` in habit_month_records.habit_id"
        ))
    })?;

    let year: i32 = row.get("year")?;
    let month: u32 = row.get("month")?;
    let month_key = MonthKey::new(habit_id, year, month)
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;

    let mask_value: i64 = row.get("days_mask")?;
    let days = u32::try_from(mask_value)
        .ok()
        .and_then(DaySet::from_mask)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid days mask `{mask_value}` in habit_month_records.days_mask"
            ))
        })?;

    let version_text: String = row.get("version")?;
    let version = VersionStamp::parse(&version_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid version `{version_text}` in habit_month_records.version"
        ))
    })?;

    let record = HabitMonthRecord {
        key: MonthRecordKey::new(user_id, month_key),
        days,
        version: Some(version),
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(record)
}

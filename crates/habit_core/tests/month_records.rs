use habit_core::db::open_db_in_memory;
use habit_core::{
    DateValue, HabitMonthRecord, MonthKey, MonthRecordKey, MonthRecordRepository, PartitionKey,
    RepoError, SortKeyPredicate, SqliteMonthRecordRepository, UserId, VersionStamp,
};
use rusqlite::params;
use uuid::Uuid;

fn user() -> UserId {
    UserId::new("alice").unwrap()
}

fn key(habit_id: Uuid, year: i32, month: u32) -> MonthRecordKey {
    MonthRecordKey::new(user(), MonthKey::new(habit_id, year, month).unwrap())
}

#[test]
fn insert_then_get_returns_stored_version() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let key = key(Uuid::new_v4(), 2024, 1);

    let version = repo
        .put_month_record(&HabitMonthRecord::with_day(key.clone(), 15), None)
        .unwrap();

    let stored = repo.get_month_record(&key).unwrap().unwrap();
    assert_eq!(stored.version, Some(version));
    assert_eq!(stored.days.iter().collect::<Vec<_>>(), vec![15]);
}

#[test]
fn insert_conflicts_when_bucket_exists() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let key = key(Uuid::new_v4(), 2024, 1);

    repo.put_month_record(&HabitMonthRecord::with_day(key.clone(), 1), None)
        .unwrap();
    let err = repo
        .put_month_record(&HabitMonthRecord::with_day(key.clone(), 2), None)
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(month) if month == key.month));

    let stored = repo.get_month_record(&key).unwrap().unwrap();
    assert_eq!(stored.days.iter().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn update_requires_matching_version_and_rotates_it() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let key = key(Uuid::new_v4(), 2024, 2);

    let first = repo
        .put_month_record(&HabitMonthRecord::with_day(key.clone(), 1), None)
        .unwrap();

    let mut record = repo.get_month_record(&key).unwrap().unwrap();
    record.days.insert(2);
    let second = repo.put_month_record(&record, Some(first)).unwrap();
    assert_ne!(first, second);

    record.days.insert(3);
    let stale = repo.put_month_record(&record, Some(first)).unwrap_err();
    assert!(matches!(stale, RepoError::Conflict(_)));

    let stored = repo.get_month_record(&key).unwrap().unwrap();
    assert_eq!(stored.days.iter().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(stored.version, Some(second));
}

#[test]
fn update_of_missing_bucket_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let key = key(Uuid::new_v4(), 2024, 3);

    let err = repo
        .put_month_record(
            &HabitMonthRecord::with_day(key.clone(), 4),
            Some(VersionStamp::generate()),
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
    assert!(repo.get_month_record(&key).unwrap().is_none());
}

#[test]
fn recreated_bucket_rejects_stamp_from_previous_life() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let key = key(Uuid::new_v4(), 2024, 4);

    let old = repo
        .put_month_record(&HabitMonthRecord::with_day(key.clone(), 10), None)
        .unwrap();
    repo.delete_month_record(&key, old).unwrap();
    repo.put_month_record(&HabitMonthRecord::with_day(key.clone(), 10), None)
        .unwrap();

    let mut record = HabitMonthRecord::with_day(key.clone(), 10);
    record.days.insert(11);
    assert!(matches!(
        repo.put_month_record(&record, Some(old)),
        Err(RepoError::Conflict(_))
    ));
    assert!(matches!(
        repo.delete_month_record(&key, old),
        Err(RepoError::Conflict(_))
    ));
}

#[test]
fn delete_requires_matching_version() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let key = key(Uuid::new_v4(), 2024, 5);

    let version = repo
        .put_month_record(&HabitMonthRecord::with_day(key.clone(), 5), None)
        .unwrap();

    assert!(matches!(
        repo.delete_month_record(&key, VersionStamp::generate()),
        Err(RepoError::Conflict(_))
    ));
    repo.delete_month_record(&key, version).unwrap();
    assert!(repo.get_month_record(&key).unwrap().is_none());
    assert!(matches!(
        repo.delete_month_record(&key, version),
        Err(RepoError::Conflict(_))
    ));
}

#[test]
fn empty_bucket_is_never_written() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let key = key(Uuid::new_v4(), 2024, 6);

    let mut record = HabitMonthRecord::with_day(key.clone(), 1);
    record.days.remove(1);
    assert!(matches!(
        repo.put_month_record(&record, None),
        Err(RepoError::Record(_))
    ));
    assert!(repo.get_month_record(&key).unwrap().is_none());
}

#[test]
fn predicates_narrow_the_partition() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let run = Uuid::new_v4();
    let read = Uuid::new_v4();

    for (habit_id, year, month) in [(run, 2024, 2), (run, 2023, 12), (read, 2024, 1)] {
        repo.put_month_record(&HabitMonthRecord::with_day(key(habit_id, year, month), 1), None)
            .unwrap();
    }
    let partition = PartitionKey::month_records(user());

    let all = repo
        .query_month_records(&partition, SortKeyPredicate::All)
        .unwrap();
    assert_eq!(all.len(), 3);

    let run_months: Vec<(i32, u32)> = repo
        .query_month_records(&partition, SortKeyPredicate::HabitPrefix(run))
        .unwrap()
        .iter()
        .map(|record| (record.key.month.year(), record.key.month.month()))
        .collect();
    assert_eq!(run_months, vec![(2023, 12), (2024, 2)]);

    let exact = repo
        .query_month_records(
            &partition,
            SortKeyPredicate::Exact(MonthKey::new(read, 2024, 1).unwrap()),
        )
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].habit_id(), read);

    let other_user = PartitionKey::month_records(UserId::new("bob").unwrap());
    assert!(repo
        .query_month_records(&other_user, SortKeyPredicate::All)
        .unwrap()
        .is_empty());

    let definitions = PartitionKey::habit_definitions(user());
    assert!(repo
        .query_month_records(&definitions, SortKeyPredicate::All)
        .unwrap()
        .is_empty());
}

#[test]
fn bucket_key_follows_the_date() {
    let habit_id = Uuid::new_v4();
    let date = DateValue::new(2024, 2, 29).unwrap();
    let key = MonthRecordKey::for_date(user(), habit_id, date);
    assert_eq!((key.month.year(), key.month.month()), (2024, 2));
    assert_eq!(key.month.habit_id(), habit_id);
}

#[test]
fn corrupt_rows_surface_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMonthRecordRepository::try_new(&conn).unwrap();
    let habit_id = Uuid::new_v4();

    // Day 30 does not exist in February.
    conn.execute(
        "INSERT INTO habit_month_records (user_id, habit_id, year, month, days_mask, version)
         VALUES (?1, ?2, 2023, 2, ?3, ?4);",
        params![
            "alice",
            habit_id.to_string(),
            1_i64 << 30,
            VersionStamp::generate().to_string()
        ],
    )
    .unwrap();

    assert!(matches!(
        repo.query_month_records(
            &PartitionKey::month_records(user()),
            SortKeyPredicate::HabitPrefix(habit_id)
        ),
        Err(RepoError::InvalidData(_))
    ));
}

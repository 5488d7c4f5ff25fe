use habit_core::db::open_db_in_memory;
use habit_core::{
    HabitDefinition, HabitDefinitionRepository, HabitValidationError, RepoError,
    SqliteHabitRepository, UserId,
};
use rusqlite::params;
use uuid::Uuid;

fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::try_new(&conn).unwrap();

    let habit = HabitDefinition::new(user("alice"), "  Morning   run ").unwrap();
    let id = repo.create_habit(&habit).unwrap();
    assert_eq!(id, habit.habit_id);

    let loaded = repo.get_habit(&user("alice"), id).unwrap().unwrap();
    assert_eq!(loaded.name, "Morning run");
    assert_eq!(loaded.user_id, user("alice"));
}

#[test]
fn habits_are_scoped_to_their_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::try_new(&conn).unwrap();

    let habit = HabitDefinition::new(user("alice"), "Read").unwrap();
    repo.create_habit(&habit).unwrap();

    assert!(repo.get_habit(&user("bob"), habit.habit_id).unwrap().is_none());
    assert!(repo.list_habits(&user("bob")).unwrap().is_empty());
    assert!(matches!(
        repo.delete_habit(&user("bob"), habit.habit_id),
        Err(RepoError::NotFound(id)) if id == habit.habit_id
    ));
    assert!(repo.get_habit(&user("alice"), habit.habit_id).unwrap().is_some());
}

#[test]
fn list_is_ordered_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::try_new(&conn).unwrap();

    for name in ["Stretch", "Journal", "Meditate"] {
        repo.create_habit(&HabitDefinition::new(user("alice"), name).unwrap())
            .unwrap();
    }

    let names: Vec<String> = repo
        .list_habits(&user("alice"))
        .unwrap()
        .into_iter()
        .map(|habit| habit.name)
        .collect();
    assert_eq!(names, ["Journal", "Meditate", "Stretch"]);
}

#[test]
fn update_replaces_name_and_requires_existing_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::try_new(&conn).unwrap();

    let habit = HabitDefinition::new(user("alice"), "Read").unwrap();
    repo.create_habit(&habit).unwrap();
    repo.update_habit(&habit.renamed("Read 20 pages").unwrap())
        .unwrap();

    let loaded = repo.get_habit(&user("alice"), habit.habit_id).unwrap().unwrap();
    assert_eq!(loaded.name, "Read 20 pages");

    let ghost = HabitDefinition::with_id(user("alice"), Uuid::new_v4(), "Ghost").unwrap();
    assert!(matches!(
        repo.update_habit(&ghost),
        Err(RepoError::NotFound(id)) if id == ghost.habit_id
    ));
}

#[test]
fn invalid_definitions_are_rejected_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::try_new(&conn).unwrap();

    let mut habit = HabitDefinition::new(user("alice"), "Read").unwrap();
    habit.name = "   ".to_string();

    assert!(matches!(
        repo.create_habit(&habit),
        Err(RepoError::Validation(HabitValidationError::EmptyName))
    ));
    assert!(repo.list_habits(&user("alice")).unwrap().is_empty());
}

#[test]
fn corrupt_rows_surface_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::try_new(&conn).unwrap();

    conn.execute(
        "INSERT INTO habit_definitions (user_id, habit_id, name) VALUES (?1, ?2, ?3);",
        params!["alice", "not-a-uuid", "Read"],
    )
    .unwrap();

    assert!(matches!(
        repo.list_habits(&user("alice")),
        Err(RepoError::InvalidData(_))
    ));
}

//! Command-line front end for the habit tracker core.
//!
//! # Responsibility
//! - Map subcommands onto `HabitService` use-cases for one local user.
//! - Print either human-readable lines or JSON (`--json`).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use habit_core::config::{HabitConfig, LOG_DIR_ENV};
use habit_core::{
    init_logging, open_db, AddDayOutcome, DateValue, HabitId, HabitRecord, HabitService,
    RemoveDayOutcome, SqliteHabitRepository, SqliteMonthRecordRepository, UserId,
};
use log::info;
use serde_json::json;
use std::path::{Path, PathBuf};

const USER_ENV: &str = "HABIT_TRACKER_USER";

type CliService<'conn> =
    HabitService<SqliteHabitRepository<'conn>, SqliteMonthRecordRepository<'conn>>;

#[derive(Parser)]
#[command(name = "habit")]
#[command(about = "Track daily habits and their done dates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides HABIT_TRACKER_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Acting user id (overrides HABIT_TRACKER_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Write rolling logs to this directory (overrides HABIT_TRACKER_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a habit
    Create { name: String },

    /// Rename a habit
    Rename { habit_id: HabitId, name: String },

    /// Delete a habit and all of its done dates
    Delete { habit_id: HabitId },

    /// List habits ordered by name
    List,

    /// Mark a day as done (defaults to today)
    Done(DayArgs),

    /// Remove a done mark (defaults to today)
    Undone(DayArgs),

    /// Show per-habit statistics for a window (defaults to the last 7 days)
    Records(RecordsArgs),

    /// List every done date of one habit
    Dates { habit_id: HabitId },
}

#[derive(Args)]
struct DayArgs {
    habit_id: HabitId,

    /// Day as YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    date: Option<DateValue>,
}

#[derive(Args)]
struct RecordsArgs {
    /// Window start as YYYY-MM-DD
    #[arg(long, value_parser = parse_date, requires = "to")]
    from: Option<DateValue>,

    /// Window end as YYYY-MM-DD
    #[arg(long, value_parser = parse_date, requires = "from")]
    to: Option<DateValue>,
}

fn parse_date(value: &str) -> Result<DateValue, String> {
    DateValue::parse(value).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = HabitConfig::from_env().context("invalid environment configuration")?;
    start_logging(&cli, &config)?;

    let user_id = resolve_user(cli.user.as_deref(), std::env::var(USER_ENV).ok())?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open database `{}`", db_path.display()))?;
    let service = HabitService::new(
        SqliteHabitRepository::try_new(&conn)?,
        SqliteMonthRecordRepository::try_new(&conn)?,
    );

    run(&service, &user_id, cli.command, cli.json)
}

fn start_logging(cli: &Cli, config: &HabitConfig) -> Result<()> {
    let Some(log_dir) = cli.log_dir.clone().or_else(|| config.log_dir.clone()) else {
        return Ok(());
    };
    let log_dir = absolute(&log_dir)?;
    let level = cli.log_level.as_deref().unwrap_or(config.log_level);
    init_logging(level, &log_dir)
        .with_context(|| format!("failed to start logging (see --log-dir / {LOG_DIR_ENV})"))?;
    info!("event=cli_start module=cli status=ok");
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()
        .context("cannot resolve current directory")?
        .join(path))
}

fn resolve_user(flag: Option<&str>, env_value: Option<String>) -> Result<UserId> {
    let Some(raw) = flag.map(str::to_string).or(env_value) else {
        bail!("no user given; pass --user or set {USER_ENV}");
    };
    UserId::new(raw).context("invalid user id")
}

fn run(service: &CliService<'_>, user_id: &UserId, command: Commands, as_json: bool) -> Result<()> {
    match command {
        Commands::Create { name } => {
            let habit_id = service.create_habit(user_id, &name)?;
            if as_json {
                println!("{}", json!({ "habit_id": habit_id }));
            } else {
                println!("{habit_id}");
            }
        }
        Commands::Rename { habit_id, name } => {
            service.rename_habit(user_id, habit_id, &name)?;
            print_status(as_json, "renamed", habit_id);
        }
        Commands::Delete { habit_id } => {
            service.delete_habit(user_id, habit_id)?;
            print_status(as_json, "deleted", habit_id);
        }
        Commands::List => {
            let habits = service.list_habits(user_id)?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else {
                for habit in habits {
                    println!("{}  {}", habit.habit_id, habit.name);
                }
            }
        }
        Commands::Done(args) => {
            let date = args.date.unwrap_or_else(|| service.today());
            let outcome = service.mark_done(user_id, args.habit_id, date)?;
            print_status(as_json, add_outcome_label(outcome), args.habit_id);
        }
        Commands::Undone(args) => {
            let date = args.date.unwrap_or_else(|| service.today());
            let outcome = service.unmark_done(user_id, args.habit_id, date)?;
            print_status(as_json, remove_outcome_label(outcome), args.habit_id);
        }
        Commands::Records(args) => {
            let records = match (args.from, args.to) {
                (Some(from), Some(to)) => service.get_habit_records(user_id, from, to)?,
                _ => service.get_weekly_habit_records(user_id)?,
            };
            if as_json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    println!("{}", render_record(record));
                }
            }
        }
        Commands::Dates { habit_id } => {
            let dates = service.list_done_dates(user_id, habit_id)?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&dates)?);
            } else {
                for date in dates {
                    println!("{date}");
                }
            }
        }
    }
    Ok(())
}

fn print_status(as_json: bool, status: &str, habit_id: HabitId) {
    if as_json {
        println!("{}", json!({ "habit_id": habit_id, "status": status }));
    } else {
        println!("{status} {habit_id}");
    }
}

fn add_outcome_label(outcome: AddDayOutcome) -> &'static str {
    match outcome {
        AddDayOutcome::Inserted | AddDayOutcome::Updated => "marked",
        AddDayOutcome::AlreadyPresent => "already_marked",
    }
}

fn remove_outcome_label(outcome: RemoveDayOutcome) -> &'static str {
    match outcome {
        RemoveDayOutcome::Updated | RemoveDayOutcome::Deleted => "unmarked",
        RemoveDayOutcome::AlreadyAbsent => "already_unmarked",
    }
}

fn render_record(record: &HabitRecord) -> String {
    let window: Vec<String> = record
        .done_dates_in_window
        .iter()
        .map(ToString::to_string)
        .collect();
    format!(
        "{}  {}  total={}  {}..{}: [{}]",
        record.definition.habit_id,
        record.definition.name,
        record.all_time_done_count,
        record.window_start,
        record.window_end,
        window.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::{parse_date, resolve_user, Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_done_with_explicit_date() {
        let cli = Cli::try_parse_from([
            "habit",
            "--user",
            "alice",
            "done",
            "6f1c2c0e-8a1f-4c43-9f0c-2b8f3f1d9a10",
            "--date",
            "2024-01-15",
        ])
        .unwrap();
        match cli.command {
            Commands::Done(args) => {
                assert_eq!(args.date.unwrap().to_string(), "2024-01-15");
            }
            _ => panic!("expected done command"),
        }
    }

    #[test]
    fn records_window_needs_both_bounds() {
        assert!(Cli::try_parse_from(["habit", "records", "--from", "2024-01-01"]).is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn user_flag_wins_over_environment() {
        let user = resolve_user(Some("alice"), Some("bob".to_string())).unwrap();
        assert_eq!(user.as_str(), "alice");
        assert_eq!(
            resolve_user(None, Some("bob".to_string())).unwrap().as_str(),
            "bob"
        );
        assert!(resolve_user(None, None).is_err());
        assert!(resolve_user(Some("  "), None).is_err());
    }
}

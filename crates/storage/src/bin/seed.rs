use std::fmt;

use chrono::{DateTime, Utc};
use mentornet_core::model::StudentId;
use storage::repository::{CachedIdentity, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    student_id: Option<StudentId>,
    clear: bool,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStudentId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
    NothingToDo,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStudentId { raw } => {
                write!(f, "invalid --student-id value: {raw:?}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
            ArgsError::NothingToDo => write!(f, "either --student-id or --clear is required"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("MENTORNET_DB_URL").unwrap_or_else(|_| "sqlite:mentornet.sqlite3".into());
        let mut student_id = std::env::var("MENTORNET_STUDENT_ID")
            .ok()
            .and_then(|value| StudentId::new(value).ok());
        let mut clear = false;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--student-id" => {
                    let value = require_value(&mut args, "--student-id")?;
                    let parsed = StudentId::new(value.clone())
                        .map_err(|_| ArgsError::InvalidStudentId { raw: value })?;
                    student_id = Some(parsed);
                }
                "--clear" => clear = true,
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if student_id.is_none() && !clear {
            return Err(ArgsError::NothingToDo);
        }

        Ok(Self {
            db_url,
            student_id,
            clear,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Seeds (or clears) the locally cached student identity so the");
    eprintln!("enrollment view can load without a session lookup.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:mentornet.sqlite3)");
    eprintln!("  --student-id <id>         Identity to cache");
    eprintln!("  --clear                   Forget the cached identity first");
    eprintln!("  --now <rfc3339>           Fixed timestamp for the cache entry");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  MENTORNET_DB_URL, MENTORNET_STUDENT_ID");
}

/// File-backed URLs get `mode=rwc` so a fresh database file is created.
fn with_create_mode(db_url: &str) -> String {
    if db_url.contains(":memory:") || db_url.contains('?') {
        db_url.to_string()
    } else {
        format!("{db_url}?mode=rwc")
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&with_create_mode(&args.db_url)).await?;

    if args.clear {
        storage.identity.clear_identity().await?;
        println!("Cleared cached identity in {}", args.db_url);
    }

    if let Some(student_id) = args.student_id {
        let identity = CachedIdentity {
            student_id,
            stored_at: args.now.unwrap_or_else(Utc::now),
        };
        storage.identity.store_identity(&identity).await?;
        println!(
            "Seeded identity {} into {}",
            identity.student_id, args.db_url
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

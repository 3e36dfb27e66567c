use std::fmt;

use mentornet_core::model::StudentId;
use services::{
    AppServices, Clock, EnrollmentSession, MentorNetConfig, SessionSnapshot, ViewState,
};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStudentId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidIndex { raw: String },
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
            ArgsError::InvalidIndex { raw } => write!(f, "invalid --select value: {raw}"),
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

struct Args {
    config: MentorNetConfig,
    db_url: String,
    select: Option<usize>,
    json: bool,
    verbose: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  mentornet show   [options]   # resolve, discover and hydrate (default)");
    eprintln!("  mentornet counts [options]   # enrollment counts for discovered courses");
    eprintln!("  mentornet forget [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --base-url <url>          Backend base URL");
    eprintln!("  --student-id <id>         Skip identity lookup");
    eprintln!("  --db <sqlite_url>         Identity cache (default: sqlite:mentornet.sqlite3)");
    eprintln!("  --select <index>          Highlight a course by position");
    eprintln!("  --json                    Print rows as JSON");
    eprintln!("  -v, --verbose             Debug logging (RUST_LOG wins when set)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MENTORNET_API_BASE_URL, MENTORNET_SESSION_COOKIE, MENTORNET_API_TOKEN,");
    eprintln!("  MENTORNET_STUDENT_ID, MENTORNET_DB_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Show,
    Counts,
    Forget,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "show" => Some(Self::Show),
            "counts" => Some(Self::Counts),
            "forget" => Some(Self::Forget),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut config = MentorNetConfig::from_env();
        let mut db_url = config.db_url().to_string();
        let mut select = None;
        let mut json = false;
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--base-url" => {
                    config.backend.base_url = Some(require_value(args, "--base-url")?);
                }
                "--student-id" => {
                    let value = require_value(args, "--student-id")?;
                    if StudentId::new(value.as_str()).is_err() {
                        return Err(ArgsError::InvalidStudentId { raw: value });
                    }
                    config.student_id = Some(value);
                }
                "--select" => {
                    let value = require_value(args, "--select")?;
                    let parsed: usize = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidIndex { raw: value.clone() })?;
                    select = Some(parsed);
                }
                "--json" => json = true,
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let db_url = normalize_sqlite_url(db_url);
        config.db_url = Some(db_url.clone());
        Ok(Self {
            config,
            db_url,
            select,
            json,
            verbose,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_snapshot(
    snapshot: &SessionSnapshot,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = snapshot.view.rows();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    match snapshot.view_state() {
        ViewState::IdentityUnresolved => {
            println!("Could not determine the signed-in student.");
            println!("Sign in again or set MENTORNET_STUDENT_ID / --student-id.");
        }
        ViewState::Empty => {
            let student = snapshot
                .student_id
                .as_ref()
                .map_or("this student", StudentId::as_str);
            println!("No enrolled courses found for {student}.");
        }
        ViewState::Loading => println!("Still loading."),
        ViewState::Populated => {
            for row in rows {
                let marker = if row.selected { '>' } else { ' ' };
                let quiz_average = row
                    .average_quiz_score
                    .map_or_else(|| "-".to_string(), |score| format!("{score:.0}"));
                println!(
                    "{marker} {:>2}. {} [{}]  {}  videos:{} quizzes:{} (avg {quiz_average}) \
                     projects submitted:{}",
                    row.index + 1,
                    row.title,
                    row.course_id,
                    row.completion_label(),
                    row.videos,
                    row.quizzes,
                    row.projects_submitted,
                );
            }
        }
    }
    Ok(())
}

async fn load_view(session: &EnrollmentSession, select: Option<usize>) -> SessionSnapshot {
    session.load().await;
    if let Some(index) = select {
        session.select(index);
    }
    let snapshot = session.snapshot();
    tracing::info!(
        attempts = snapshot.diagnostics.attempts().len(),
        misses = snapshot.diagnostics.misses().count(),
        "load finished"
    );
    snapshot
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means `show`.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Show,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with('-') => Command::Show,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with('-') {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_logging(parsed.verbose);
    prepare_sqlite_file(&parsed.db_url)?;

    match cmd {
        Command::Forget => {
            let storage = Storage::sqlite(&parsed.db_url).await?;
            storage.identity.clear_identity().await?;
            println!("Cleared cached identity in {}", parsed.db_url);
            Ok(())
        }
        Command::Show => {
            let services = AppServices::new_sqlite(&parsed.config, Clock::system()).await?;
            let snapshot = load_view(&services.session(), parsed.select).await;
            print_snapshot(&snapshot, parsed.json)
        }
        Command::Counts => {
            let services = AppServices::new_sqlite(&parsed.config, Clock::system()).await?;
            let snapshot = load_view(&services.session(), None).await;
            if snapshot.view.is_empty() {
                return print_snapshot(&snapshot, parsed.json);
            }

            let (counts, _) = services.enrollment_counts().await;
            if parsed.json {
                let body: Vec<serde_json::Value> = counts
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "courseId": entry.course_id.as_str(),
                            "count": entry.count.as_ref().ok(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&body)?);
                return Ok(());
            }
            for entry in &counts {
                match &entry.count {
                    Ok(count) => println!("{:<24} {count}", entry.course_id.as_str()),
                    Err(reason) => {
                        println!("{:<24} unavailable ({reason})", entry.course_id.as_str());
                    }
                }
            }
            println!(
                "{:<24} {}",
                "total",
                services::EnrollmentCounts::total(&counts)
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use services::{
    AlwaysConfirm, AppServices, ConfirmPrompt, DashboardView, DeleteOutcome, ExecutionLogStore,
    UserNotice, WeekContent,
};
use storage::repository::LogSnapshot;
use study_core::WeekStatus;
use study_core::model::{LogEntryId, ScoreBand, WeekNumber};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_URL: &str = "sqlite://dev.sqlite3";
const PUSH_TIMEOUT: Duration = Duration::from_secs(5);
const LIVENESS_CHECK: Duration = Duration::from_secs(1);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidWeek { raw: String },
    InvalidDbUrl { raw: String },
    MissingTitle,
    MissingId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidWeek { raw } => write!(f, "invalid --week value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingTitle => write!(f, "add requires --title"),
            ArgsError::MissingId => write!(f, "delete requires an entry id"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- summary [--week <n>] [--json]");
    eprintln!("  cargo run -p app -- list    [--json]");
    eprintln!("  cargo run -p app -- add     --title <text> [--detail <text>] [--week <n>]");
    eprintln!("  cargo run -p app -- delete  <id> [--yes]");
    eprintln!("  cargo run -p app -- watch");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>   default {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_WEEK, STUDY_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Summary,
    List,
    Add,
    Delete,
    Watch,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "summary" => Some(Self::Summary),
            "list" => Some(Self::List),
            "add" => Some(Self::Add),
            "delete" => Some(Self::Delete),
            "watch" => Some(Self::Watch),
            _ => None,
        }
    }
}

/// Values taken from the environment before flags are applied.
#[derive(Debug, Clone)]
struct Defaults {
    db_url: String,
    week: WeekNumber,
}

impl Defaults {
    fn from_env() -> Self {
        let db_url = std::env::var("STUDY_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let week = std::env::var("STUDY_WEEK")
            .ok()
            .and_then(|value| value.parse::<WeekNumber>().ok())
            .unwrap_or(WeekNumber::FIRST);
        Self { db_url, week }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    week: WeekNumber,
    yes: bool,
    json: bool,
    title: Option<String>,
    detail: String,
    id: Option<LogEntryId>,
}

impl Args {
    fn parse(
        cmd: Command,
        args: &mut impl Iterator<Item = String>,
        defaults: Defaults,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: defaults.db_url,
            week: defaults.week,
            yes: false,
            json: false,
            title: None,
            detail: String::new(),
            id: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--week" => {
                    let value = require_value(args, "--week")?;
                    parsed.week = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidWeek { raw: value.clone() })?;
                }
                "--title" => parsed.title = Some(require_value(args, "--title")?),
                "--detail" => parsed.detail = require_value(args, "--detail")?,
                "--yes" | "-y" => parsed.yes = true,
                "--json" => parsed.json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if cmd == Command::Delete && parsed.id.is_none() && !other.starts_with('-') => {
                    parsed.id = Some(LogEntryId::new(other));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        match cmd {
            Command::Add if parsed.title.is_none() => Err(ArgsError::MissingTitle),
            Command::Delete if parsed.id.is_none() => Err(ArgsError::MissingId),
            _ => Ok(parsed),
        }
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

/// Asks on the terminal; anything but `y`/`yes` declines.
///
/// The prompt port is synchronous, so the read runs under
/// `tokio::task::block_in_place` and must be called from the multi-thread
/// runtime `main` starts.
struct StdinConfirm;

impl ConfirmPrompt for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        tokio::task::block_in_place(|| {
            eprint!("{message} [y/N] ");
            let _ = std::io::stderr().flush();
            let mut line = String::new();
            if std::io::stdin().lock().read_line(&mut line).is_err() {
                return false;
            }
            is_yes(&line)
        })
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

struct StderrNotice;

impl UserNotice for StderrNotice {
    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STUDY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: print the summary when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Summary,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Summary,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter, Defaults::from_env()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let confirm: Arc<dyn ConfirmPrompt> = if parsed.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(StdinConfirm)
    };
    let services =
        AppServices::new_sqlite(&parsed.db_url, parsed.week, confirm, Arc::new(StderrNotice))
            .await?;
    tracing::debug!(db = %parsed.db_url, week = parsed.week.value(), ?cmd, "services ready");

    match cmd {
        Command::Summary => {
            let view = services.dashboard().view()?;
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_summary(&view);
            }
        }
        Command::List => {
            let log = services.execution_log();
            let subscription = log.subscribe().await?;
            print_snapshot(&log.entries(), parsed.json)?;
            subscription.cancel();
        }
        Command::Add => {
            let log = services.execution_log();
            let subscription = log.subscribe().await?;
            let title = parsed.title.unwrap_or_default();
            let id = log.create(title, parsed.detail).await?;
            println!("added {id}");
            wait_for_entry(&log, &id).await;
            print_snapshot(&log.entries(), parsed.json)?;
            subscription.cancel();
        }
        Command::Delete => {
            let log = services.execution_log();
            let subscription = log.subscribe().await?;
            let id = parsed.id.ok_or(ArgsError::MissingId)?;
            match log.delete(&id).await? {
                DeleteOutcome::Deleted => println!("deleted {id}"),
                DeleteOutcome::Declined => println!("kept {id}"),
            }
            subscription.cancel();
        }
        Command::Watch => {
            let log = services.execution_log();
            let subscription = log.subscribe().await?;
            let mut snapshots = log.watch();
            watch_until_interrupted(&mut snapshots, &subscription, parsed.json).await?;
            subscription.cancel();
        }
    }

    Ok(())
}

async fn wait_for_entry(log: &ExecutionLogStore, id: &LogEntryId) {
    let mut snapshots = log.watch();
    let arrived = tokio::time::timeout(PUSH_TIMEOUT, snapshots.wait_for(|s| s.get(id).is_some()))
        .await
        .is_ok_and(|res| res.is_ok());
    if !arrived {
        tracing::warn!(id = %id, "new entry not observed yet");
    }
}

async fn watch_until_interrupted(
    snapshots: &mut watch::Receiver<LogSnapshot>,
    subscription: &services::LogSubscription,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let initial = snapshots.borrow_and_update().clone();
    print_snapshot(&initial, json)?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&snapshot, json)?;
            }
            _ = tokio::time::sleep(LIVENESS_CHECK) => {
                if !subscription.is_active() {
                    eprintln!("subscription ended");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn status_marker(status: WeekStatus) -> &'static str {
    match status {
        WeekStatus::Completed => "[x]",
        WeekStatus::Current => "[>]",
        WeekStatus::Locked => "[ ]",
    }
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Excellent => "excellent",
        ScoreBand::Good => "good",
        ScoreBand::Moderate => "moderate",
    }
}

fn print_summary(view: &DashboardView) {
    let progress = view.progress;
    println!(
        "Progress: {}/{} weeks ({}%), {} remaining",
        progress.completed,
        progress.total,
        progress.percentage,
        progress.remaining()
    );
    println!();
    for item in &view.timeline {
        let cursor = if item.selected { "*" } else { " " };
        println!(
            "{cursor} {} Week {:>2}  {}",
            status_marker(item.status),
            item.week,
            item.title
        );
    }
    println!();
    println!(
        "Week {}: {} ({})",
        view.selected.week(),
        view.selected.title(),
        view.selected.subtitle()
    );

    match &view.content {
        WeekContent::Analyzed {
            bundle,
            ranked_ideas,
        } => {
            println!("Core message: {}", bundle.analysis.core_message);
            println!();
            println!("Ideas by leverage:");
            for ranked in ranked_ideas {
                let star = if ranked.is_highlighted() { "*" } else { " " };
                println!(
                    "  {star}#{} [{:>3} {:<9}] {} ({})",
                    ranked.rank,
                    ranked.idea.score.total,
                    band_label(ranked.idea.score.band()),
                    ranked.idea.title,
                    ranked.idea.recommendation.label()
                );
            }
        }
        WeekContent::NotYetAnalyzed => println!("Not yet analyzed."),
    }

    if let Some(video) = &view.video {
        println!();
        println!(
            "Lecture: {} https://www.youtube.com/watch?v={}",
            video.title, video.video_id
        );
    }
}

fn print_snapshot(snapshot: &LogSnapshot, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.entries())?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("No plans yet.");
        return Ok(());
    }
    for (number, entry) in snapshot.numbered() {
        let at = entry.created_at.map_or_else(
            || "pending".to_owned(),
            |at| at.format("%Y-%m-%d %H:%M").to_string(),
        );
        println!(
            "#{number:<3} week {:>2}  {at}  {}  ({})",
            entry.week, entry.title, entry.id
        );
        if let Some(detail) = &entry.detail {
            println!("     {detail}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Defaults {
        Defaults {
            db_url: DEFAULT_DB_URL.into(),
            week: WeekNumber::FIRST,
        }
    }

    fn parse(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_owned());
        Args::parse(cmd, &mut iter, defaults())
    }

    #[test]
    fn add_reads_title_detail_and_week() {
        let args = parse(
            Command::Add,
            &["--title", "Ship", "--detail", "today", "--week", "3"],
        )
        .unwrap();
        assert_eq!(args.title.as_deref(), Some("Ship"));
        assert_eq!(args.detail, "today");
        assert_eq!(args.week.value(), 3);
        assert_eq!(args.db_url, DEFAULT_DB_URL);
    }

    #[test]
    fn add_without_title_is_rejected() {
        assert!(matches!(
            parse(Command::Add, &["--detail", "x"]),
            Err(ArgsError::MissingTitle)
        ));
    }

    #[test]
    fn delete_takes_positional_id() {
        let args = parse(Command::Delete, &["abc123", "--yes"]).unwrap();
        assert_eq!(args.id, Some(LogEntryId::new("abc123")));
        assert!(args.yes);
        assert!(matches!(
            parse(Command::Delete, &[]),
            Err(ArgsError::MissingId)
        ));
    }

    #[test]
    fn out_of_range_week_is_rejected() {
        assert!(matches!(
            parse(Command::Summary, &["--week", "24"]),
            Err(ArgsError::InvalidWeek { .. })
        ));
    }

    #[test]
    fn positional_is_unknown_outside_delete() {
        assert!(matches!(
            parse(Command::List, &["stray"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn sqlite_urls_are_normalized() {
        assert_eq!(
            normalize_sqlite_url("sqlite://already.db".into()),
            "sqlite://already.db"
        );
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:/tmp/study.db".into()),
            "sqlite:///tmp/study.db"
        );
    }

    #[test]
    fn missing_flag_value_is_reported() {
        assert!(matches!(
            parse(Command::List, &["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
    }

    #[test]
    fn confirmation_accepts_only_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn score_bands_have_labels() {
        assert_eq!(band_label(ScoreBand::Excellent), "excellent");
        assert_eq!(band_label(ScoreBand::Moderate), "moderate");
    }
}

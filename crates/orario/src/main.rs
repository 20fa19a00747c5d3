use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use orario::calendar::clamp_week;
use orario::data::{self, EXAMS_FILE, SCHEDULE_FILE};
use orario::exams;
use orario::occurrences::{lessons_on_date, week_occurrences};
use orario::subjects::{find_by_name, planned_by_subject, unique_subjects};
use orario::{live_status, progress_by_subject, ScheduleStore, SemesterClock, SlotTable};

mod server;
mod views;

#[derive(Parser, Debug)]
#[command(name = "orario")]
#[command(about = "Semester timetable, live lesson status and study progress")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding schedule.json and exams.json
    #[arg(short, long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the JSON API server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show today's lessons and what is happening right now
    Today {
        /// Pretend it is this moment (e.g. 2026-01-12T09:00:00)
        #[arg(long)]
        at: Option<NaiveDateTime>,
    },

    /// Show every lesson of a semester week
    Week {
        /// Week number, defaults to the current week
        week: Option<i64>,
    },

    /// Show passed and planned lessons per subject
    Progress {
        /// Pretend it is this moment (e.g. 2026-03-01T12:00:00)
        #[arg(long)]
        at: Option<NaiveDateTime>,

        /// Only show the subject matching this name
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// List subjects with their teachers and rooms
    Subjects,

    /// List upcoming exams with a countdown
    Exams,
}

/// `RUST_LOG` wins over `--log-level`; hyper and tower_http are capped at warn either way
fn log_filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter> {
    let filter = rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse()?)
        .add_directive("tower_http=warn".parse()?);
    Ok(filter)
}

fn init_tracing(log_level: &str) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), log_level)?)
        .with_target(false)
        .init();
    Ok(())
}

fn now_or(at: Option<NaiveDateTime>) -> NaiveDateTime {
    at.unwrap_or_else(|| chrono::Local::now().naive_local())
}

fn load_store(data_dir: &Path) -> Result<ScheduleStore> {
    let path = data_dir.join(SCHEDULE_FILE);
    let templates = data::load_schedule(&path)
        .context("No usable schedule; run `corriere fetch` first")?;

    let mut store = ScheduleStore::new();
    store.replace_all(templates);
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level)?;
    debug!(data_dir = %args.data_dir.display(), "Starting");

    let clock = SemesterClock::default();
    let slots = SlotTable::default();

    match args.command {
        None => {
            server::serve(8080, args.data_dir).await?;
        }
        Some(Commands::Serve { port }) => {
            server::serve(port, args.data_dir).await?;
        }
        Some(Commands::Today { at }) => {
            let store = load_store(&args.data_dir)?;
            let now = now_or(at);
            let today = now.date();

            let mut lessons = lessons_on_date(&store, &clock, today);
            lessons.sort_by_key(|l| l.pair);
            let live = live_status(now, &lessons, &slots);
            print!(
                "{}",
                views::render_day(today, clock.week_number(today), &lessons, &slots, &live)
            );
        }
        Some(Commands::Week { week }) => {
            let store = load_store(&args.data_dir)?;
            let current = i64::from(clock.week_number(now_or(None).date()));
            let week = clamp_week(week.unwrap_or(current));
            let occurrences = week_occurrences(&store, &clock, week);
            print!("{}", views::render_week(week, &occurrences, &slots));
        }
        Some(Commands::Progress { at, subject }) => {
            let store = load_store(&args.data_dir)?;
            let mut passed = progress_by_subject(&store, &clock, now_or(at));
            let planned = planned_by_subject(&store, &clock);

            if let Some(wanted) = subject {
                let names: Vec<String> = passed.keys().cloned().collect();
                let found = find_by_name(&wanted, &names, |s| s.as_str())
                    .cloned()
                    .with_context(|| format!("No subject matching \"{}\"", wanted))?;
                passed.retain(|name, _| *name == found);
            }
            print!("{}", views::render_progress(&passed, &planned));
        }
        Some(Commands::Subjects) => {
            let store = load_store(&args.data_dir)?;
            print!("{}", views::render_subjects(&unique_subjects(&store)));
        }
        Some(Commands::Exams) => {
            let all = data::load_exams(&args.data_dir.join(EXAMS_FILE))?;
            let today = now_or(None).date();
            print!("{}", views::render_exams(&exams::upcoming(&all, today)));
        }
    }

    Ok(())
}

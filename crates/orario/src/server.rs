use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use chrono::NaiveDateTime;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use orario::calendar::{clamp_week, school_day};
use orario::data::{self, EXAMS_FILE, SCHEDULE_FILE};
use orario::exams::{self, Exam};
use orario::occurrences::{lessons_on_date, week_occurrences};
use orario::subjects::{planned_by_subject, unique_subjects};
use orario::types::{LessonTemplate, ProgressCount};
use orario::{live_status, progress_by_subject, ScheduleStore, SemesterClock, SlotTable};

/// Application state shared across requests
pub struct AppState {
    pub schedule: RwLock<ScheduleStore>,
    pub exams: RwLock<Vec<Exam>>,
    pub clock: SemesterClock,
    pub slots: SlotTable,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            schedule: RwLock::new(ScheduleStore::new()),
            exams: RwLock::new(Vec::new()),
            clock: SemesterClock::default(),
            slots: SlotTable::default(),
            data_dir,
        }
    }

    /// Reload both snapshots from disk.
    ///
    /// Files are parsed completely before either lock is taken, so readers see the old
    /// or the new schedule and never a mix. On error the current data stays in place.
    pub async fn refresh(&self) -> Result<usize> {
        let templates = data::load_schedule(&self.data_dir.join(SCHEDULE_FILE))?;
        let exams = data::load_exams(&self.data_dir.join(EXAMS_FILE))?;
        let count = templates.len();

        self.schedule.write().await.replace_all(templates);
        *self.exams.write().await = exams;

        Ok(count)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AtQuery {
    /// Override "now", e.g. `2026-01-12T09:00:00`
    pub at: Option<NaiveDateTime>,
}

fn resolve_now(at: Option<NaiveDateTime>) -> NaiveDateTime {
    at.unwrap_or_else(|| chrono::Local::now().naive_local())
}

/// A lesson plus its rendered time window
#[derive(Serialize)]
struct LessonView<'a> {
    time: String,
    #[serde(flatten)]
    lesson: &'a LessonTemplate,
}

#[derive(Serialize)]
struct SubjectProgress {
    passed: ProgressCount,
    planned: ProgressCount,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/today", get(today_handler))
        .route("/api/week/{week}", get(week_handler))
        .route("/api/progress", get(progress_handler))
        .route("/api/subjects", get(subjects_handler))
        .route("/api/exams", get(exams_handler))
        .route("/api/refresh", get(refresh_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server with file watching
pub async fn serve(port: u16, data_dir: PathBuf) -> Result<()> {
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        info!(path = %data_dir.display(), "Created data directory");
    }

    let state = Arc::new(AppState::new(data_dir));
    match state.refresh().await {
        Ok(count) => info!(count, "Schedule ready"),
        Err(e) => warn!(error = %e, "Starting with an empty schedule"),
    }

    // Dropping the debouncer stops the watcher
    let _watcher = start_file_watcher(state.clone())?;

    let app = router(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Server running");

    axum::serve(listener, app).await?;
    Ok(())
}

fn is_snapshot_file(path: &std::path::Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == SCHEDULE_FILE || n == EXAMS_FILE)
        .unwrap_or(false)
}

/// Watch the data directory and refresh when a snapshot file changes
fn start_file_watcher(state: Arc<AppState>) -> Result<Debouncer<RecommendedWatcher>> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(10);

    let mut debouncer = new_debouncer(
        Duration::from_secs(2),
        move |result: DebounceEventResult| match result {
            Ok(events) => {
                if events.iter().any(|e| is_snapshot_file(&e.path)) {
                    let _ = tx.blocking_send(());
                }
            }
            Err(e) => warn!(error = ?e, "File watcher error"),
        },
    )
    .context("Failed to create file watcher")?;

    debouncer
        .watcher()
        .watch(&state.data_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", state.data_dir.display()))?;
    info!(path = %state.data_dir.display(), "Watching for snapshot changes");

    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            debug!("Detected snapshot change");
            let before = state.schedule.read().await.len();
            match state.refresh().await {
                Ok(count) => info!(count, change = count as i64 - before as i64, "Schedule updated"),
                Err(e) => error!(error = %e, "Failed to refresh, keeping previous schedule"),
            }
        }
    });

    Ok(debouncer)
}

/// Today's lessons and live status
async fn today_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AtQuery>,
) -> Json<Value> {
    let now = resolve_now(query.at);
    let today = now.date();
    let store = state.schedule.read().await;

    let mut lessons = lessons_on_date(&store, &state.clock, today);
    lessons.sort_by_key(|l| l.pair);
    let live = live_status(now, &lessons, &state.slots);
    let views: Vec<LessonView> = lessons
        .iter()
        .map(|&lesson| LessonView {
            time: state.slots.label(lesson.pair),
            lesson,
        })
        .collect();

    Json(json!({
        "date": today,
        "week": state.clock.week_number(today),
        "day": school_day(today),
        "lessons": views,
        "live": live,
    }))
}

/// All occurrences of one semester week
async fn week_handler(State(state): State<Arc<AppState>>, Path(week): Path<i64>) -> Json<Value> {
    let week = clamp_week(week);
    let store = state.schedule.read().await;
    let occurrences = week_occurrences(&store, &state.clock, week);

    Json(json!({
        "week": week,
        "occurrences": occurrences,
    }))
}

/// Passed and planned counts per subject
async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AtQuery>,
) -> Json<BTreeMap<String, SubjectProgress>> {
    let now = resolve_now(query.at);
    let store = state.schedule.read().await;
    let passed = progress_by_subject(&store, &state.clock, now);
    let planned = planned_by_subject(&store, &state.clock);

    let progress = passed
        .into_iter()
        .map(|(subject, passed)| {
            let planned = planned.get(&subject).copied().unwrap_or_default();
            (subject, SubjectProgress { passed, planned })
        })
        .collect();
    Json(progress)
}

async fn subjects_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let store = state.schedule.read().await;
    Json(json!(unique_subjects(&store)))
}

/// Upcoming exams with their countdown
async fn exams_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AtQuery>,
) -> Json<Value> {
    let today = resolve_now(query.at).date();
    let all = state.exams.read().await;
    let list: Vec<Value> = exams::upcoming(&all, today)
        .into_iter()
        .map(|(exam, countdown)| {
            json!({
                "exam": exam,
                "countdown": countdown,
                "label": countdown.label(),
            })
        })
        .collect();
    Json(Value::Array(list))
}

/// Reload snapshots from disk (manual trigger)
async fn refresh_handler(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    info!("Manual refresh triggered");

    match state.refresh().await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!(error = %e, "Refresh failed");
            (StatusCode::UNPROCESSABLE_ENTITY, "ERROR")
        }
    }
}

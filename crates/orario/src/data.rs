//! Ingestion of upstream JSON snapshots.
//!
//! The API returns the schedule either as a bare array or wrapped as `{"items": [...]}`.
//! Rows are converted leniently: a row with a missing day, pair or week range is kept and
//! simply never occurs. Rows whose lesson kind is not `lecture`/`seminar` are dropped.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::exams::Exam;
use crate::types::{ActiveWeeks, LessonKind, LessonTemplate, SchoolDay};

/// Schedule snapshot file inside the data directory
pub const SCHEDULE_FILE: &str = "schedule.json";

/// Exam list snapshot file inside the data directory
pub const EXAMS_FILE: &str = "exams.json";

/// One upstream schedule row, before any interpretation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLesson {
    id: Value,
    #[serde(alias = "day_of_week")]
    day: Value,
    #[serde(alias = "pair_number")]
    pair: Value,
    subject: Value,
    #[serde(rename = "type", alias = "lesson_type")]
    kind: Value,
    teacher: Value,
    room: Value,
    weeks: Value,
    week_start: Value,
    week_end: Value,
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Integers and numeric strings
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn week(value: &Value) -> Option<u32> {
    integer(value).and_then(|w| u32::try_from(w).ok())
}

/// Interpret the `weeks` field. Unreadable values become an empty list (never active).
fn parse_weeks(raw: &RawLesson) -> Option<ActiveWeeks> {
    let never = || ActiveWeeks::Listed { list: Vec::new() };

    match &raw.weeks {
        Value::Null => match (&raw.week_start, &raw.week_end) {
            (Value::Null, Value::Null) => None,
            (start, end) => Some(match (week(start), week(end)) {
                (Some(start), Some(end)) => ActiveWeeks::Range { start, end },
                _ => never(),
            }),
        },
        // `[start, end, ...]`: anything after the first two entries is ignored
        Value::Array(items) if items.len() >= 2 => Some(match (week(&items[0]), week(&items[1])) {
            (Some(start), Some(end)) => ActiveWeeks::Range { start, end },
            _ => never(),
        }),
        Value::Object(map) => {
            if let Some(Value::Array(list)) = map.get("list") {
                let weeks: Option<Vec<u32>> = list.iter().map(week).collect();
                return Some(weeks.map_or_else(never, |list| ActiveWeeks::Listed { list }));
            }
            let start = map.get("start").and_then(week);
            let end = map.get("end").and_then(week);
            Some(match (start, end) {
                (Some(start), Some(end)) => ActiveWeeks::Range { start, end },
                _ => never(),
            })
        }
        _ => Some(never()),
    }
}

/// Convert one row, or `None` if its lesson kind is unknown
fn to_template(raw: RawLesson) -> Option<LessonTemplate> {
    let subject = text(&raw.subject);
    let Some(kind) = raw.kind.as_str().and_then(LessonKind::parse) else {
        warn!(subject = %subject, kind = %raw.kind, "Dropping lesson with unknown type");
        return None;
    };

    let day = raw.day.as_str().and_then(SchoolDay::parse);
    let pair = integer(&raw.pair).and_then(|p| u8::try_from(p).ok());
    if day.is_none() || pair.is_none() {
        debug!(subject = %subject, day = %raw.day, pair = %raw.pair, "Lesson will never occur");
    }

    Some(LessonTemplate {
        id: integer(&raw.id),
        day,
        pair,
        weeks: parse_weeks(&raw),
        subject,
        kind,
        teacher: text(&raw.teacher),
        room: text(&raw.room),
    })
}

/// Unwrap `[...]` or `{"items": [...]}`
fn schedule_items(body: Value) -> Result<Vec<Value>, IngestError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(IngestError::UnexpectedShape),
        },
        _ => Err(IngestError::UnexpectedShape),
    }
}

/// Reject sets where two lessons share a day and pair in some common week
pub fn check_overlaps(templates: &[LessonTemplate]) -> Result<(), IngestError> {
    let mut by_slot: BTreeMap<(SchoolDay, u8), Vec<&LessonTemplate>> = BTreeMap::new();
    for template in templates {
        if let (Some(day), Some(pair)) = (template.day, template.pair) {
            by_slot.entry((day, pair)).or_default().push(template);
        }
    }

    for ((day, pair), lessons) in by_slot {
        for (i, first) in lessons.iter().enumerate() {
            let weeks = first.effective_weeks();
            if let Some(second) = lessons[i + 1..]
                .iter()
                .find(|other| weeks.intersects(&other.effective_weeks()))
            {
                return Err(IngestError::OverlappingSlots {
                    day,
                    pair,
                    first: first.subject.clone(),
                    second: second.subject.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Parse a schedule body into templates, ready for `ScheduleStore::replace_all`
pub fn parse_schedule_json(body: &str) -> Result<Vec<LessonTemplate>, IngestError> {
    let items = schedule_items(serde_json::from_str(body)?)?;
    let total = items.len();

    let templates: Vec<LessonTemplate> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawLesson>(item) {
            Ok(raw) => to_template(raw),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable schedule row");
                None
            }
        })
        .collect();

    check_overlaps(&templates)?;

    debug!(total, kept = templates.len(), "Parsed schedule");
    Ok(templates)
}

/// Load the schedule snapshot at `path`
pub fn load_schedule(path: &Path) -> Result<Vec<LessonTemplate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schedule at {}", path.display()))?;
    let templates = parse_schedule_json(&content)
        .with_context(|| format!("Failed to parse schedule at {}", path.display()))?;

    info!(count = templates.len(), "Schedule loaded");
    Ok(templates)
}

/// Load the exam snapshot at `path`; a missing file means no exams
pub fn load_exams(path: &Path) -> Result<Vec<Exam>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read exams at {}", path.display()))?;
    let body: Value = serde_json::from_str(&content).context("Failed to parse exams JSON")?;
    let exams = schedule_items(body)
        .context("Unexpected exams shape")?
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Exam>(item) {
            Ok(exam) => Some(exam),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable exam row");
                None
            }
        })
        .collect::<Vec<_>>();

    debug!(count = exams.len(), "Loaded exams");
    Ok(exams)
}

//! Subject catalogue built from the schedule, plus the loose name matching the UI uses
//! to join subjects across data sources.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar::SemesterClock;
use crate::progress::count_occurrences;
use crate::store::ScheduleStore;
use crate::types::{LessonKind, ProgressCount};

/// Teacher placeholder used upstream when nobody is assigned
const UNKNOWN_TEACHER: &str = "Не указан";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectSummary {
    pub name: String,
    pub types: Vec<LessonKind>,
    pub teachers: Vec<String>,
    pub rooms: Vec<String>,
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// One summary per exact subject name, sorted by name
pub fn unique_subjects(store: &ScheduleStore) -> Vec<SubjectSummary> {
    let mut by_name: BTreeMap<&str, SubjectSummary> = BTreeMap::new();

    for lesson in store.templates() {
        let summary = by_name
            .entry(lesson.subject.as_str())
            .or_insert_with(|| SubjectSummary {
                name: lesson.subject.clone(),
                types: Vec::new(),
                teachers: Vec::new(),
                rooms: Vec::new(),
            });

        push_unique(&mut summary.types, lesson.kind);
        if !lesson.teacher.is_empty() && lesson.teacher != UNKNOWN_TEACHER {
            push_unique(&mut summary.teachers, lesson.teacher.clone());
        }
        if !lesson.room.is_empty() && !lesson.room.contains('*') {
            push_unique(&mut summary.rooms, lesson.room.clone());
        }
    }

    by_name.into_values().collect()
}

/// Total occurrences per subject over every template's whole active range
pub fn planned_by_subject(
    store: &ScheduleStore,
    clock: &SemesterClock,
) -> BTreeMap<String, ProgressCount> {
    count_occurrences(store, clock, None)
}

/// Loose subject comparison: case-insensitive, either name containing the other.
///
/// Unrelated subjects that share a substring will match; keep this out of counting code.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Exact name first, then the first loose match
pub fn find_by_name<'a, T, F>(name: &str, candidates: &'a [T], name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    candidates
        .iter()
        .find(|&c| name_of(c) == name)
        .or_else(|| candidates.iter().find(|&c| names_match(name_of(c), name)))
}

use chrono::NaiveDate;
use tracing::debug;

use crate::calendar::{school_day, SemesterClock};
use crate::store::ScheduleStore;
use crate::types::{LessonTemplate, Occurrence, SchoolDay, MAX_WEEKS};

/// Templates that take place on `day` in semester week `week`.
///
/// Result order is not meaningful. Templates without a day or pair never match.
pub fn occurrences_on(store: &ScheduleStore, day: SchoolDay, week: u32) -> Vec<&LessonTemplate> {
    let lessons: Vec<&LessonTemplate> = store
        .templates()
        .iter()
        .filter(|t| t.day == Some(day) && t.pair.is_some() && t.is_active_in(week))
        .collect();

    debug!(day = %day, week, count = lessons.len(), "Filtered lessons");
    lessons
}

/// Lessons held on a calendar date; empty on weekends
pub fn lessons_on_date<'a>(
    store: &'a ScheduleStore,
    clock: &SemesterClock,
    date: NaiveDate,
) -> Vec<&'a LessonTemplate> {
    match school_day(date) {
        Some(day) => occurrences_on(store, day, clock.week_number(date)),
        None => Vec::new(),
    }
}

/// Every occurrence of one week, sorted by date and pair
pub fn week_occurrences<'a>(
    store: &'a ScheduleStore,
    clock: &SemesterClock,
    week: u32,
) -> Vec<Occurrence<'a>> {
    let mut occurrences: Vec<Occurrence<'a>> = SchoolDay::ALL
        .iter()
        .flat_map(|&day| {
            let date = clock.date_for_occurrence(day, week);
            occurrences_on(store, day, week)
                .into_iter()
                .map(move |lesson| Occurrence { week, date, lesson })
        })
        .collect();

    occurrences.sort_by_key(|o| (o.date, o.lesson.pair));
    occurrences
}

/// Every occurrence from week 1 through [`MAX_WEEKS`]
pub fn semester_occurrences<'a>(
    store: &'a ScheduleStore,
    clock: &SemesterClock,
) -> Vec<Occurrence<'a>> {
    (1..=MAX_WEEKS)
        .flat_map(|week| week_occurrences(store, clock, week))
        .collect()
}

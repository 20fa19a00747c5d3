use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::calendar::SemesterClock;
use crate::store::ScheduleStore;
use crate::types::{ProgressCount, MAX_WEEKS};

/// Count, per subject and kind, the occurrences whose date is on or before `now`'s date.
///
/// A lesson counts as passed from midnight of its day. Subjects are keyed by exact name;
/// every schedulable subject is present, possibly with zero counts.
pub fn progress_by_subject(
    store: &ScheduleStore,
    clock: &SemesterClock,
    now: NaiveDateTime,
) -> BTreeMap<String, ProgressCount> {
    count_occurrences(store, clock, Some(now.date()))
}

/// Walk each template's active weeks and count occurrences up to `until` (inclusive).
/// `None` counts the whole active range, cut off after week [`MAX_WEEKS`].
pub(crate) fn count_occurrences(
    store: &ScheduleStore,
    clock: &SemesterClock,
    until: Option<NaiveDate>,
) -> BTreeMap<String, ProgressCount> {
    let mut counts: BTreeMap<String, ProgressCount> = BTreeMap::new();

    for template in store.templates() {
        let (Some(day), Some(_)) = (template.day, template.pair) else {
            continue;
        };

        let count = counts.entry(template.subject.clone()).or_default();
        // Weeks ascend, so dates do too
        for week in template.active_weeks() {
            let date = clock.date_for_occurrence(day, week);
            let past_limit = match until {
                Some(limit) => date > limit,
                None => week > MAX_WEEKS,
            };
            if past_limit {
                break;
            }
            count.bump(template.kind);
        }
    }

    counts
}

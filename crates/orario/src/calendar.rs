//! Semester calendar arithmetic.
//!
//! Weeks are 1-based and counted from a fixed semester start, which is always a Monday.

use chrono::{Datelike, Duration, NaiveDate};

use crate::types::{SchoolDay, MAX_WEEKS};

/// First day of the current semester (Monday of week 1)
pub const SEMESTER_START: (i32, u32, u32) = (2026, 1, 12);

/// The fixed semester start all week math is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemesterClock {
    start: NaiveDate,
}

impl Default for SemesterClock {
    fn default() -> Self {
        let (year, month, day) = SEMESTER_START;
        Self::new(NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default())
    }
}

impl SemesterClock {
    pub fn new(start: NaiveDate) -> Self {
        Self { start }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// 1-based week of `date`. Dates before the semester start clamp to week 1.
    ///
    /// There is no upper clamp; navigation code bounds displayed weeks with [`clamp_week`].
    pub fn week_number(&self, date: NaiveDate) -> u32 {
        if date < self.start {
            return 1;
        }
        let days = (date - self.start).num_days();
        u32::try_from(days / 7 + 1).unwrap_or(u32::MAX)
    }

    /// Calendar date of `day` in semester week `week`.
    ///
    /// `week` is expected to be at least 1. Results saturate at chrono's date bounds.
    pub fn date_for_occurrence(&self, day: SchoolDay, week: u32) -> NaiveDate {
        let offset = (i64::from(week) - 1) * 7 + day.offset();
        self.start
            .checked_add_signed(Duration::days(offset))
            .unwrap_or(if offset < 0 {
                NaiveDate::MIN
            } else {
                NaiveDate::MAX
            })
    }
}

/// School day of `date`, `None` on weekends
pub fn school_day(date: NaiveDate) -> Option<SchoolDay> {
    SchoolDay::from_weekday(date.weekday())
}

/// Bound a week for display and navigation to `1..=MAX_WEEKS`
pub fn clamp_week(week: i64) -> u32 {
    week.clamp(1, i64::from(MAX_WEEKS)) as u32
}

//! "What is happening right now" for today's lessons.
//!
//! Nothing is cached between calls; clients poll (the web app does so every 30 seconds).

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::types::{LessonTemplate, SlotTable};

/// A lesson starting within this many minutes turns an idle day into a break
pub const BREAK_WINDOW_MINUTES: i64 = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LiveStatus<'a> {
    /// A lesson is in progress
    Active {
        lesson: &'a LessonTemplate,
        elapsed_percent: f64,
        minutes_remaining: i64,
    },
    /// Between lessons, the next one starts soon
    Break {
        lesson: &'a LessonTemplate,
        minutes_until_start: i64,
    },
    Idle,
}

impl LiveStatus<'_> {
    pub fn is_active(&self) -> bool {
        matches!(self, LiveStatus::Active { .. })
    }

    pub fn minutes_until_start(&self) -> Option<i64> {
        match self {
            LiveStatus::Break {
                minutes_until_start,
                ..
            } => Some(*minutes_until_start),
            _ => None,
        }
    }

    pub fn lesson(&self) -> Option<&LessonTemplate> {
        match self {
            LiveStatus::Active { lesson, .. } | LiveStatus::Break { lesson, .. } => Some(*lesson),
            LiveStatus::Idle => None,
        }
    }
}

/// Whole minutes, rounded up
fn ceil_minutes(delta: TimeDelta) -> i64 {
    let ms = delta.num_milliseconds();
    ms.div_euclid(60_000) + i64::from(ms.rem_euclid(60_000) != 0)
}

/// Resolve the live state from `now` and the lessons scheduled on `now`'s date.
///
/// The first lesson in input order that contains `now` wins. Lessons whose pair is
/// missing from `slots` are ignored.
pub fn live_status<'a>(
    now: NaiveDateTime,
    todays: &[&'a LessonTemplate],
    slots: &SlotTable,
) -> LiveStatus<'a> {
    let today = now.date();
    let mut next: Option<(NaiveDateTime, &'a LessonTemplate)> = None;

    for &lesson in todays {
        let Some(slot) = lesson.pair.and_then(|pair| slots.get(pair)) else {
            continue;
        };
        let start = today.and_time(slot.start);
        let end = today.and_time(slot.end);

        if start <= now && now <= end {
            let total = (end - start).num_milliseconds();
            let elapsed = (now - start).num_milliseconds();
            let fraction = if total > 0 {
                (elapsed as f64 / total as f64).clamp(0.0, 1.0)
            } else {
                1.0
            };
            return LiveStatus::Active {
                lesson,
                elapsed_percent: fraction * 100.0,
                minutes_remaining: ceil_minutes(end - now),
            };
        }

        if now < start && next.map_or(true, |(soonest, _)| start < soonest) {
            next = Some((start, lesson));
        }
    }

    match next {
        Some((start, lesson)) => {
            let minutes = ceil_minutes(start - now);
            if minutes <= BREAK_WINDOW_MINUTES {
                LiveStatus::Break {
                    lesson,
                    minutes_until_start: minutes,
                }
            } else {
                LiveStatus::Idle
            }
        }
        None => LiveStatus::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LessonKind, SchoolDay};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 12)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn lesson(pair: u8, subject: &str) -> LessonTemplate {
        LessonTemplate::new(SchoolDay::Monday, pair, subject, LessonKind::Lecture).with_weeks(1, 18)
    }

    // ========== active tests ==========

    #[test]
    fn test_active_mid_lesson() {
        let first = lesson(1, "Экономика");
        let status = live_status(at(9, 0, 0), &[&first], &SlotTable::default());

        match status {
            LiveStatus::Active {
                lesson,
                elapsed_percent,
                minutes_remaining,
            } => {
                assert_eq!(lesson.subject, "Экономика");
                assert!((elapsed_percent - 75.0).abs() < 1e-9);
                assert_eq!(minutes_remaining, 20);
            }
            other => panic!("expected active, got {:?}", other),
        }
    }

    #[test]
    fn test_active_at_exact_boundaries() {
        let first = lesson(1, "Экономика");
        let slots = SlotTable::default();

        let at_start = live_status(at(8, 0, 0), &[&first], &slots);
        assert!(matches!(
            at_start,
            LiveStatus::Active { elapsed_percent, minutes_remaining: 80, .. } if elapsed_percent == 0.0
        ));

        let at_end = live_status(at(9, 20, 0), &[&first], &slots);
        assert!(matches!(
            at_end,
            LiveStatus::Active { elapsed_percent, minutes_remaining: 0, .. } if elapsed_percent == 100.0
        ));
    }

    #[test]
    fn test_minutes_remaining_rounds_up() {
        let first = lesson(1, "Экономика");
        let status = live_status(at(9, 0, 30), &[&first], &SlotTable::default());
        assert!(matches!(
            status,
            LiveStatus::Active {
                minutes_remaining: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_overlap_first_match_wins() {
        let a = lesson(1, "A");
        let b = lesson(1, "B");
        let status = live_status(at(8, 30, 0), &[&b, &a], &SlotTable::default());
        assert_eq!(status.lesson().unwrap().subject, "B");
    }

    // ========== break tests ==========

    #[test]
    fn test_break_before_first_lesson() {
        let first = lesson(1, "Экономика");
        let status = live_status(at(7, 30, 0), &[&first], &SlotTable::default());

        assert_eq!(status.minutes_until_start(), Some(30));
        assert!(!status.is_active());
    }

    #[test]
    fn test_break_between_lessons_picks_soonest() {
        let first = lesson(1, "Экономика");
        let second = lesson(2, "Менеджмент");
        let third = lesson(3, "Качество");
        let status = live_status(
            at(9, 25, 0),
            &[&third, &first, &second],
            &SlotTable::default(),
        );

        match status {
            LiveStatus::Break {
                lesson,
                minutes_until_start,
            } => {
                assert_eq!(lesson.subject, "Менеджмент");
                assert_eq!(minutes_until_start, 5);
            }
            other => panic!("expected break, got {:?}", other),
        }
    }

    #[test]
    fn test_break_window_edge() {
        let first = lesson(1, "Экономика");
        let slots = SlotTable::default();

        let exactly = live_status(at(7, 20, 0), &[&first], &slots);
        assert_eq!(exactly.minutes_until_start(), Some(BREAK_WINDOW_MINUTES));

        let just_over = live_status(at(7, 19, 30), &[&first], &slots);
        assert_eq!(just_over, LiveStatus::Idle);
    }

    // ========== idle tests ==========

    #[test]
    fn test_idle_long_before_first_lesson() {
        let first = lesson(1, "Экономика");
        let status = live_status(at(6, 0, 0), &[&first], &SlotTable::default());
        assert_eq!(status, LiveStatus::Idle);
    }

    #[test]
    fn test_idle_after_last_lesson() {
        let first = lesson(1, "Экономика");
        let status = live_status(at(15, 0, 0), &[&first], &SlotTable::default());
        assert_eq!(status, LiveStatus::Idle);
    }

    #[test]
    fn test_idle_without_lessons() {
        let status = live_status(at(10, 0, 0), &[], &SlotTable::default());
        assert_eq!(status, LiveStatus::Idle);
    }

    #[test]
    fn test_unknown_pair_ignored() {
        let late = lesson(6, "Экономика");
        let status = live_status(at(10, 0, 0), &[&late], &SlotTable::default());
        assert_eq!(status, LiveStatus::Idle);
    }

    #[test]
    fn test_active_never_reports_minutes_until_start() {
        let slots = SlotTable::default();
        let lessons = [lesson(1, "A"), lesson(2, "B"), lesson(3, "C")];
        let todays: Vec<&LessonTemplate> = lessons.iter().collect();

        for minute in 0..(24 * 60) {
            let now = at(minute / 60, minute % 60, 0);
            let status = live_status(now, &todays, &slots);
            assert!(!(status.is_active() && status.minutes_until_start().is_some()));
        }
    }

    // ========== serialization tests ==========

    #[test]
    fn test_status_serializes_with_state_tag() {
        let first = lesson(1, "Экономика");
        let status = live_status(at(7, 30, 0), &[&first], &SlotTable::default());
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["state"], "break");
        assert_eq!(json["minutes_until_start"], 30);
        assert_eq!(json["lesson"]["subject"], "Экономика");

        let idle = serde_json::to_value(LiveStatus::Idle).unwrap();
        assert_eq!(idle["state"], "idle");
    }
}

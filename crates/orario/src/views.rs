use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Write;

use orario::exams::{Countdown, Exam};
use orario::live::LiveStatus;
use orario::subjects::SubjectSummary;
use orario::types::{LessonTemplate, Occurrence, ProgressCount, SlotTable};

fn lesson_line(out: &mut String, lesson: &LessonTemplate, slots: &SlotTable) {
    let pair = lesson
        .pair
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string());
    let _ = writeln!(
        out,
        "  {} пара • {}  {} ({})",
        pair,
        slots.label(lesson.pair),
        lesson.subject,
        lesson.kind.label()
    );
    if !lesson.room.is_empty() || !lesson.teacher.is_empty() {
        let _ = writeln!(out, "      🏫 {}  👩‍🏫 {}", lesson.room, lesson.teacher);
    }
}

fn live_line(out: &mut String, live: &LiveStatus<'_>) {
    match live {
        LiveStatus::Active {
            lesson,
            elapsed_percent,
            minutes_remaining,
        } => {
            let _ = writeln!(
                out,
                "● Сейчас идёт: {} — {} мин до конца ({:.0}%)",
                lesson.subject, minutes_remaining, elapsed_percent
            );
        }
        LiveStatus::Break {
            lesson,
            minutes_until_start,
        } => {
            let _ = writeln!(
                out,
                "☕ Перемена — далее {} через {} мин",
                lesson.subject, minutes_until_start
            );
        }
        LiveStatus::Idle => {}
    }
}

/// One day of lessons, already sorted, with the live status on top
pub fn render_day(
    date: NaiveDate,
    week: u32,
    lessons: &[&LessonTemplate],
    slots: &SlotTable,
    live: &LiveStatus<'_>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📅 {} • {}-я неделя", date.format("%d.%m.%Y"), week);
    live_line(&mut out, live);

    if lessons.is_empty() {
        out.push_str("  В этот день занятий нет. Отдыхайте!\n");
        return out;
    }
    for lesson in lessons {
        lesson_line(&mut out, lesson, slots);
    }
    out
}

pub fn render_week(week: u32, occurrences: &[Occurrence<'_>], slots: &SlotTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}-я неделя", week);

    let mut by_date: BTreeMap<NaiveDate, Vec<&LessonTemplate>> = BTreeMap::new();
    for occurrence in occurrences {
        by_date
            .entry(occurrence.date)
            .or_default()
            .push(occurrence.lesson);
    }

    if by_date.is_empty() {
        out.push_str("  Занятий нет\n");
    }
    for (date, lessons) in by_date {
        let day = orario::calendar::school_day(date)
            .map(|d| d.short_label())
            .unwrap_or("");
        let _ = writeln!(out, "{} {}", day, date.format("%d.%m"));
        for lesson in lessons {
            lesson_line(&mut out, lesson, slots);
        }
    }
    out
}

/// Passed vs planned counts per subject
pub fn render_progress(
    passed: &BTreeMap<String, ProgressCount>,
    planned: &BTreeMap<String, ProgressCount>,
) -> String {
    let mut out = String::new();
    for (subject, done) in passed {
        let total = planned.get(subject).copied().unwrap_or_default();
        let _ = writeln!(out, "{}", subject);
        let _ = writeln!(
            out,
            "  лекции {}/{}  семинары {}/{}",
            done.lecture, total.lecture, done.seminar, total.seminar
        );
    }
    if out.is_empty() {
        out.push_str("Расписание пустое\n");
    }
    out
}

pub fn render_subjects(subjects: &[SubjectSummary]) -> String {
    let mut out = String::new();
    for subject in subjects {
        let kinds: Vec<&str> = subject.types.iter().map(|k| k.label()).collect();
        let _ = writeln!(out, "📚 {} [{}]", subject.name, kinds.join(", "));
        if !subject.teachers.is_empty() {
            let _ = writeln!(out, "  👨‍🏫 {}", subject.teachers.join(", "));
        }
        if !subject.rooms.is_empty() {
            let _ = writeln!(out, "  🏫 {}", subject.rooms.join(", "));
        }
    }
    out
}

pub fn render_exams(exams: &[(&Exam, Countdown)]) -> String {
    if exams.is_empty() {
        return "Пока нет экзаменов в расписании\n".to_string();
    }

    let mut out = String::new();
    for (exam, countdown) in exams {
        let _ = write!(out, "{} — {}", exam.exam_date, exam.subject);
        if !exam.exam_time.is_empty() {
            let _ = write!(out, ", {}", exam.exam_time);
        }
        if !exam.room.is_empty() {
            let _ = write!(out, ", ауд. {}", exam.room);
        }
        let _ = writeln!(out, "  [{}]", countdown.label());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use orario::types::{LessonKind, SchoolDay};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_render_day_empty() {
        let out = render_day(
            date(2026, 1, 17),
            1,
            &[],
            &SlotTable::default(),
            &LiveStatus::Idle,
        );
        assert!(out.contains("1-я неделя"));
        assert!(out.contains("занятий нет"));
    }

    #[test]
    fn test_render_day_with_live_lesson() {
        let lesson = LessonTemplate::new(SchoolDay::Monday, 1, "Экономика", LessonKind::Lecture)
            .with_place("Халимов Ш.Х.", "204");
        let live = LiveStatus::Active {
            lesson: &lesson,
            elapsed_percent: 75.0,
            minutes_remaining: 20,
        };

        let out = render_day(
            date(2026, 1, 12),
            1,
            &[&lesson],
            &SlotTable::default(),
            &live,
        );
        assert!(out.contains("Сейчас идёт: Экономика"));
        assert!(out.contains("20 мин до конца (75%)"));
        assert!(out.contains("1 пара • 08:00 - 09:20"));
        assert!(out.contains("204"));
    }

    #[test]
    fn test_render_week_groups_by_date() {
        let monday = LessonTemplate::new(SchoolDay::Monday, 1, "Экономика", LessonKind::Lecture);
        let friday = LessonTemplate::new(SchoolDay::Friday, 5, "Бизнес", LessonKind::Seminar);
        let occurrences = vec![
            Occurrence {
                week: 1,
                date: date(2026, 1, 12),
                lesson: &monday,
            },
            Occurrence {
                week: 1,
                date: date(2026, 1, 16),
                lesson: &friday,
            },
        ];

        let out = render_week(1, &occurrences, &SlotTable::default());
        assert!(out.contains("Пн 12.01"));
        assert!(out.contains("Пт 16.01"));
        assert!(out.contains("5 пара • —"));
    }

    #[test]
    fn test_render_progress() {
        let mut passed = BTreeMap::new();
        passed.insert(
            "Экономика".to_string(),
            ProgressCount {
                lecture: 3,
                seminar: 2,
            },
        );
        let mut planned = BTreeMap::new();
        planned.insert(
            "Экономика".to_string(),
            ProgressCount {
                lecture: 18,
                seminar: 18,
            },
        );

        let out = render_progress(&passed, &planned);
        assert!(out.contains("лекции 3/18  семинары 2/18"));
    }

    #[test]
    fn test_render_exams_empty() {
        assert!(render_exams(&[]).contains("нет экзаменов"));
    }

    #[test]
    fn test_render_exams_labels() {
        let exam = Exam {
            subject: "Экономика".to_string(),
            exam_date: "2026-06-01".to_string(),
            exam_time: "09:00".to_string(),
            ..Exam::default()
        };
        let out = render_exams(&[(&exam, Countdown::Tomorrow)]);
        assert!(out.contains("2026-06-01 — Экономика, 09:00"));
        assert!(out.contains("[Завтра]"));
    }
}

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Number of weeks in a semester. Templates without explicit weeks run for all of them.
pub const MAX_WEEKS: u32 = 20;

/// A teaching day. Weekends have no lessons, so they have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl SchoolDay {
    pub const ALL: [SchoolDay; 5] = [
        SchoolDay::Monday,
        SchoolDay::Tuesday,
        SchoolDay::Wednesday,
        SchoolDay::Thursday,
        SchoolDay::Friday,
    ];

    /// Days after the Monday of the same week
    pub fn offset(self) -> i64 {
        match self {
            SchoolDay::Monday => 0,
            SchoolDay::Tuesday => 1,
            SchoolDay::Wednesday => 2,
            SchoolDay::Thursday => 3,
            SchoolDay::Friday => 4,
        }
    }

    /// Map a calendar weekday, `None` for Saturday and Sunday
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(SchoolDay::Monday),
            Weekday::Tue => Some(SchoolDay::Tuesday),
            Weekday::Wed => Some(SchoolDay::Wednesday),
            Weekday::Thu => Some(SchoolDay::Thursday),
            Weekday::Fri => Some(SchoolDay::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    /// Parse the lower-case English name used by the API ("monday", ...)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "monday" => Some(SchoolDay::Monday),
            "tuesday" => Some(SchoolDay::Tuesday),
            "wednesday" => Some(SchoolDay::Wednesday),
            "thursday" => Some(SchoolDay::Thursday),
            "friday" => Some(SchoolDay::Friday),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchoolDay::Monday => "monday",
            SchoolDay::Tuesday => "tuesday",
            SchoolDay::Wednesday => "wednesday",
            SchoolDay::Thursday => "thursday",
            SchoolDay::Friday => "friday",
        }
    }

    /// Short label shown on the day tabs
    pub fn short_label(self) -> &'static str {
        match self {
            SchoolDay::Monday => "Пн",
            SchoolDay::Tuesday => "Вт",
            SchoolDay::Wednesday => "Ср",
            SchoolDay::Thursday => "Чт",
            SchoolDay::Friday => "Пт",
        }
    }
}

impl fmt::Display for SchoolDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lecture or seminar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Lecture,
    Seminar,
}

impl LessonKind {
    /// Case-insensitive parse; anything other than the two known kinds is `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "lecture" => Some(LessonKind::Lecture),
            "seminar" => Some(LessonKind::Seminar),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LessonKind::Lecture => "Лекция",
            LessonKind::Seminar => "Семинар",
        }
    }
}

/// Weeks in which a template produces occurrences
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActiveWeeks {
    /// Inclusive range. `start > end` is tolerated and contains nothing.
    Range { start: u32, end: u32 },
    /// Explicit week numbers
    Listed { list: Vec<u32> },
}

impl ActiveWeeks {
    pub fn contains(&self, week: u32) -> bool {
        match self {
            ActiveWeeks::Range { start, end } => *start <= week && week <= *end,
            ActiveWeeks::Listed { list } => list.contains(&week),
        }
    }

    /// Whether some week is active in both
    pub fn intersects(&self, other: &ActiveWeeks) -> bool {
        match (self, other) {
            (
                ActiveWeeks::Range { start: s1, end: e1 },
                ActiveWeeks::Range { start: s2, end: e2 },
            ) => s1.max(s2) <= e1.min(e2),
            (ActiveWeeks::Listed { list }, other) | (other, ActiveWeeks::Listed { list }) => {
                list.iter().any(|&week| other.contains(week))
            }
        }
    }
}

/// One recurring weekly lesson slot.
///
/// `day` and `pair` are optional so that partially broken upstream rows can still be
/// stored; a template missing either never produces an occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub day: Option<SchoolDay>,

    /// Daily slot number, looked up in the [`SlotTable`]
    pub pair: Option<u8>,

    pub subject: String,

    #[serde(rename = "type")]
    pub kind: LessonKind,

    pub teacher: String,

    pub room: String,

    /// `None` is the legacy shape: every week from 1 to [`MAX_WEEKS`]
    pub weeks: Option<ActiveWeeks>,
}

impl LessonTemplate {
    pub fn new(day: SchoolDay, pair: u8, subject: &str, kind: LessonKind) -> Self {
        Self {
            id: None,
            day: Some(day),
            pair: Some(pair),
            subject: subject.to_string(),
            kind,
            teacher: String::new(),
            room: String::new(),
            weeks: None,
        }
    }

    pub fn with_weeks(mut self, start: u32, end: u32) -> Self {
        self.weeks = Some(ActiveWeeks::Range { start, end });
        self
    }

    pub fn with_place(mut self, teacher: &str, room: &str) -> Self {
        self.teacher = teacher.to_string();
        self.room = room.to_string();
        self
    }

    /// Whether the template has enough data to ever occur
    pub fn is_schedulable(&self) -> bool {
        self.day.is_some() && self.pair.is_some()
    }

    /// Active weeks with the legacy default applied
    pub fn effective_weeks(&self) -> ActiveWeeks {
        self.weeks.clone().unwrap_or(ActiveWeeks::Range {
            start: 1,
            end: MAX_WEEKS,
        })
    }

    pub fn is_active_in(&self, week: u32) -> bool {
        match &self.weeks {
            Some(weeks) => weeks.contains(week),
            None => (1..=MAX_WEEKS).contains(&week),
        }
    }

    /// Active week numbers in ascending order
    pub fn active_weeks(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match &self.weeks {
            Some(ActiveWeeks::Range { start, end }) => Box::new(*start..=*end),
            Some(ActiveWeeks::Listed { list }) => {
                let mut weeks = list.clone();
                weeks.sort_unstable();
                weeks.dedup();
                Box::new(weeks.into_iter())
            }
            None => Box::new(1..=MAX_WEEKS),
        }
    }
}

/// Wall-clock window of one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Fixed `pair -> time window` lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    slots: BTreeMap<u8, Slot>,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new([
            (1, Slot::new(hm(8, 0), hm(9, 20))),
            (2, Slot::new(hm(9, 30), hm(10, 50))),
            (3, Slot::new(hm(11, 0), hm(12, 20))),
        ])
    }
}

impl SlotTable {
    pub fn new(slots: impl IntoIterator<Item = (u8, Slot)>) -> Self {
        Self {
            slots: slots.into_iter().collect(),
        }
    }

    pub fn get(&self, pair: u8) -> Option<Slot> {
        self.slots.get(&pair).copied()
    }

    /// "08:00 - 09:20", or a dash for an unknown pair
    pub fn label(&self, pair: Option<u8>) -> String {
        pair.and_then(|p| self.get(p))
            .map(|slot| slot.label())
            .unwrap_or_else(|| "—".to_string())
    }
}

/// A template realized on a concrete week and date. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence<'a> {
    pub week: u32,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub lesson: &'a LessonTemplate,
}

/// Per-subject counts of occurrences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCount {
    pub lecture: u32,
    pub seminar: u32,
}

impl ProgressCount {
    pub fn bump(&mut self, kind: LessonKind) {
        match kind {
            LessonKind::Lecture => self.lecture = self.lecture.saturating_add(1),
            LessonKind::Seminar => self.seminar = self.seminar.saturating_add(1),
        }
    }

    pub fn total(&self) -> u32 {
        self.lecture.saturating_add(self.seminar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== SchoolDay tests ==========

    #[test]
    fn test_school_day_offsets() {
        let offsets: Vec<i64> = SchoolDay::ALL.iter().map(|d| d.offset()).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_school_day_from_weekend_is_none() {
        assert_eq!(SchoolDay::from_weekday(Weekday::Sat), None);
        assert_eq!(SchoolDay::from_weekday(Weekday::Sun), None);
        assert_eq!(
            SchoolDay::from_weekday(Weekday::Wed),
            Some(SchoolDay::Wednesday)
        );
    }

    #[test]
    fn test_school_day_parse() {
        assert_eq!(SchoolDay::parse("monday"), Some(SchoolDay::Monday));
        assert_eq!(SchoolDay::parse(" Friday "), Some(SchoolDay::Friday));
        assert_eq!(SchoolDay::parse("saturday"), None);
        assert_eq!(SchoolDay::parse(""), None);
    }

    // ========== LessonKind tests ==========

    #[test]
    fn test_lesson_kind_parse() {
        assert_eq!(LessonKind::parse("lecture"), Some(LessonKind::Lecture));
        assert_eq!(LessonKind::parse("SEMINAR"), Some(LessonKind::Seminar));
        assert_eq!(LessonKind::parse("lab"), None);
    }

    // ========== ActiveWeeks tests ==========

    #[test]
    fn test_range_is_inclusive() {
        let weeks = ActiveWeeks::Range { start: 4, end: 8 };
        assert!(!weeks.contains(3));
        assert!(weeks.contains(4));
        assert!(weeks.contains(8));
        assert!(!weeks.contains(9));
    }

    #[test]
    fn test_inverted_range_contains_nothing() {
        let weeks = ActiveWeeks::Range { start: 8, end: 4 };
        assert!((0..30).all(|w| !weeks.contains(w)));
    }

    #[test]
    fn test_listed_weeks() {
        let weeks = ActiveWeeks::Listed {
            list: vec![1, 3, 5],
        };
        assert!(weeks.contains(3));
        assert!(!weeks.contains(2));
    }

    #[test]
    fn test_ranges_intersect() {
        let a = ActiveWeeks::Range { start: 1, end: 9 };
        let b = ActiveWeeks::Range { start: 9, end: 18 };
        let c = ActiveWeeks::Range { start: 10, end: 18 };
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }

    #[test]
    fn test_listed_intersects_range() {
        let odd = ActiveWeeks::Listed {
            list: vec![1, 3, 5],
        };
        let even = ActiveWeeks::Listed {
            list: vec![2, 4, 6],
        };
        let late = ActiveWeeks::Range { start: 5, end: 20 };
        assert!(!odd.intersects(&even));
        assert!(odd.intersects(&late));
        assert!(late.intersects(&odd));
        assert!(!even.intersects(&ActiveWeeks::Range { start: 7, end: 20 }));
    }

    #[test]
    fn test_inverted_range_intersects_nothing() {
        let inverted = ActiveWeeks::Range { start: 9, end: 3 };
        assert!(!inverted.intersects(&ActiveWeeks::Range { start: 1, end: 20 }));
    }

    // ========== LessonTemplate tests ==========

    #[test]
    fn test_template_without_weeks_runs_whole_semester() {
        let lesson = LessonTemplate::new(SchoolDay::Monday, 1, "Экономика", LessonKind::Lecture);
        assert!(lesson.is_active_in(1));
        assert!(lesson.is_active_in(MAX_WEEKS));
        assert!(!lesson.is_active_in(MAX_WEEKS + 1));
        assert!(!lesson.is_active_in(0));
        assert_eq!(lesson.active_weeks().count(), MAX_WEEKS as usize);
    }

    #[test]
    fn test_active_weeks_listed_sorted_and_deduped() {
        let mut lesson =
            LessonTemplate::new(SchoolDay::Monday, 1, "Экономика", LessonKind::Lecture);
        lesson.weeks = Some(ActiveWeeks::Listed {
            list: vec![5, 1, 5, 3],
        });
        assert_eq!(lesson.active_weeks().collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn test_template_missing_day_not_schedulable() {
        let mut lesson =
            LessonTemplate::new(SchoolDay::Monday, 1, "Экономика", LessonKind::Lecture);
        lesson.day = None;
        assert!(!lesson.is_schedulable());
    }

    #[test]
    fn test_template_serializes_with_api_names() {
        let lesson = LessonTemplate::new(SchoolDay::Tuesday, 2, "Экономика", LessonKind::Seminar)
            .with_weeks(1, 18);
        let json = serde_json::to_value(&lesson).unwrap();
        assert_eq!(json["day"], "tuesday");
        assert_eq!(json["type"], "seminar");
        assert_eq!(json["pair"], 2);
        assert_eq!(json["weeks"]["start"], 1);
        assert_eq!(json["weeks"]["end"], 18);
        assert!(json.get("id").is_none());
    }

    // ========== SlotTable tests ==========

    #[test]
    fn test_default_slot_labels() {
        let slots = SlotTable::default();
        assert_eq!(slots.label(Some(1)), "08:00 - 09:20");
        assert_eq!(slots.label(Some(2)), "09:30 - 10:50");
        assert_eq!(slots.label(Some(3)), "11:00 - 12:20");
        assert_eq!(slots.label(Some(7)), "—");
        assert_eq!(slots.label(None), "—");
    }

    // ========== ProgressCount tests ==========

    #[test]
    fn test_progress_count_bump() {
        let mut count = ProgressCount::default();
        count.bump(LessonKind::Lecture);
        count.bump(LessonKind::Lecture);
        count.bump(LessonKind::Seminar);
        assert_eq!(count.lecture, 2);
        assert_eq!(count.seminar, 1);
        assert_eq!(count.total(), 3);
    }

    #[test]
    fn test_progress_count_bump_saturates() {
        let mut count = ProgressCount {
            lecture: u32::MAX,
            seminar: 0,
        };
        count.bump(LessonKind::Lecture);
        assert_eq!(count.lecture, u32::MAX);
    }
}

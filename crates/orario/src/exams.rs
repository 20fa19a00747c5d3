use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An exam as published by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exam {
    pub id: Option<i64>,
    pub subject: String,
    pub teacher: String,
    /// `YYYY-MM-DD`, may be empty
    pub exam_date: String,
    pub exam_time: String,
    pub room: String,
    pub exam_type: String,
    pub notes: String,
}

impl Exam {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.exam_date.trim(), "%Y-%m-%d").ok()
    }
}

/// Days left until an exam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum Countdown {
    Past,
    Today,
    Tomorrow,
    InDays(i64),
}

impl Countdown {
    pub fn label(&self) -> String {
        match self {
            Countdown::Past => "Прошёл".to_string(),
            Countdown::Today => "Сегодня".to_string(),
            Countdown::Tomorrow => "Завтра".to_string(),
            Countdown::InDays(days) if *days <= 31 => format!("Через {} дн.", days),
            Countdown::InDays(days) => format!("{} дн.", days),
        }
    }
}

pub fn countdown(exam_date: NaiveDate, today: NaiveDate) -> Countdown {
    match (exam_date - today).num_days() {
        d if d < 0 => Countdown::Past,
        0 => Countdown::Today,
        1 => Countdown::Tomorrow,
        d => Countdown::InDays(d),
    }
}

/// Exams on or after `today`, soonest first. Exams without a readable date are left out.
pub fn upcoming(exams: &[Exam], today: NaiveDate) -> Vec<(&Exam, Countdown)> {
    let mut dated: Vec<(NaiveDate, &Exam)> = exams
        .iter()
        .filter_map(|exam| exam.date().map(|date| (date, exam)))
        .filter(|(date, _)| *date >= today)
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    dated
        .into_iter()
        .map(|(date, exam)| (exam, countdown(date, today)))
        .collect()
}

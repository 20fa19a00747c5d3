//! Orario - semester timetable engine for the group app.
//!
//! Recurring weekly lesson templates come in from the API as one snapshot and are
//! projected onto concrete semester weeks and dates. On top of that projection sit the
//! per-subject progress counts and the "live lesson / break" status.
//!
//! Everything here is synchronous and pure apart from the file loaders in [`data`].

pub mod calendar;
pub mod data;
pub mod error;
pub mod exams;
pub mod live;
pub mod occurrences;
pub mod progress;
pub mod store;
pub mod subjects;
pub mod types;

pub use calendar::SemesterClock;
pub use error::IngestError;
pub use live::{live_status, LiveStatus};
pub use occurrences::occurrences_on;
pub use progress::progress_by_subject;
pub use store::ScheduleStore;
pub use types::{LessonKind, LessonTemplate, Occurrence, SchoolDay, SlotTable};

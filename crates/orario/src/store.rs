use tracing::debug;

use crate::types::LessonTemplate;

/// Owner of the current set of lesson templates.
///
/// The only mutation is [`ScheduleStore::replace_all`]; every query module borrows the
/// store read-only.
#[derive(Debug, Clone, Default)]
pub struct ScheduleStore {
    templates: Vec<LessonTemplate>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every stored template and keep `templates` instead.
    ///
    /// No validation happens here: templates that can never occur are kept and simply
    /// never match a query.
    pub fn replace_all(&mut self, templates: Vec<LessonTemplate>) {
        debug!(
            previous = self.templates.len(),
            count = templates.len(),
            "Schedule replaced"
        );
        self.templates = templates;
    }

    pub fn templates(&self) -> &[LessonTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl From<Vec<LessonTemplate>> for ScheduleStore {
    fn from(templates: Vec<LessonTemplate>) -> Self {
        Self { templates }
    }
}

//! Capacity ledger: the locally known lessons and their remaining spaces.

use crate::error::LedgerError;
use crate::types::{Lesson, LessonId};

/// In-memory record of lessons and remaining capacity
///
/// Lessons keep the order they were loaded in, which is the tiebreak order
/// for the catalog view. Only [`CapacityLedger::decrement`] and
/// [`CapacityLedger::increment`] change a lesson after load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapacityLedger {
    lessons: Vec<Lesson>,
}

impl CapacityLedger {
    /// Empty ledger
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lessons: Vec::new(),
        }
    }

    /// Replace the entire contents with `lessons`
    ///
    /// When an id appears more than once the first occurrence wins.
    pub fn load(&mut self, lessons: impl IntoIterator<Item = Lesson>) {
        let mut loaded: Vec<Lesson> = Vec::new();
        for lesson in lessons {
            if loaded.iter().any(|existing| existing.id == lesson.id) {
                tracing::warn!(lesson_id = %lesson.id, "Duplicate lesson in load, keeping first");
                continue;
            }
            loaded.push(lesson);
        }
        tracing::debug!(count = loaded.len(), "Ledger loaded");
        self.lessons = loaded;
    }

    /// Take one space from a lesson
    ///
    /// Returns the spaces left afterwards.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] for an unknown id, [`LedgerError::NoCapacity`]
    /// when the lesson is already full. The ledger is unchanged on error.
    pub fn decrement(&mut self, id: &LessonId) -> Result<u32, LedgerError> {
        let lesson = self.get_mut(id)?;
        if lesson.spaces == 0 {
            return Err(LedgerError::NoCapacity(id.clone()));
        }
        lesson.spaces -= 1;
        Ok(lesson.spaces)
    }

    /// Give one space back to a lesson
    ///
    /// Returns the spaces left afterwards. No upper bound is enforced.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] for an unknown id.
    pub fn increment(&mut self, id: &LessonId) -> Result<u32, LedgerError> {
        let lesson = self.get_mut(id)?;
        lesson.spaces = lesson.spaces.saturating_add(1);
        Ok(lesson.spaces)
    }

    /// Look up a lesson
    #[must_use]
    pub fn get(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| &lesson.id == id)
    }

    /// Remaining spaces for a lesson
    #[must_use]
    pub fn spaces(&self, id: &LessonId) -> Option<u32> {
        self.get(id).map(|lesson| lesson.spaces)
    }

    /// All lessons in load order
    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// Number of lessons
    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Whether no lessons are loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    fn get_mut(&mut self, id: &LessonId) -> Result<&mut Lesson, LedgerError> {
        self.lessons
            .iter_mut()
            .find(|lesson| &lesson.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }
}

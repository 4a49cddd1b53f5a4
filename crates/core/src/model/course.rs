use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("lesson title cannot be empty")]
    EmptyLessonTitle,

    #[error("lesson order must be >= 1")]
    InvalidOrder,

    #[error("lesson order {order} is already used in this course")]
    DuplicateOrder { order: u32 },

    #[error("lesson {0} already exists in this course")]
    DuplicateLesson(LessonId),

    #[error("lesson {lesson} belongs to course {owner}")]
    ForeignLesson { lesson: LessonId, owner: CourseId },

    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A single unit of course content.
///
/// Completion is not stored here; it is derived from `UserProgress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    id: LessonId,
    title: String,
    content: String,
    course_id: CourseId,
    order: u32,
}

impl Lesson {
    /// Creates a lesson with a 1-based order rank.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyLessonTitle` for a blank title and
    /// `CourseError::InvalidOrder` for order 0.
    pub fn new(
        id: LessonId,
        course_id: CourseId,
        title: impl Into<String>,
        content: impl Into<String>,
        order: u32,
    ) -> Result<Self, CourseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyLessonTitle);
        }
        if order == 0 {
            return Err(CourseError::InvalidOrder);
        }
        Ok(Self {
            id,
            title,
            content: content.into(),
            course_id,
            order,
        })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// An ordered sequence of lessons.
///
/// When `sequential` is set, a lesson unlocks only after its predecessor is
/// completed (see [`crate::gate`]). Order ranks are kept unique by every
/// mutating method; data loaded from storage with tied ranks falls back to
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    #[serde(rename = "lockUntilPassed", alias = "sequential")]
    sequential: bool,
    #[serde(default)]
    lessons: Vec<Lesson>,
}

impl Course {
    /// Creates an empty course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
        sequential: bool,
    ) -> Result<Self, CourseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description: description.into().trim().to_owned(),
            sequential,
            lessons: Vec::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn is_sequential(&self) -> bool {
        self.sequential
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    /// Lessons in storage order.
    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// Lessons sorted by order rank; ties keep storage order.
    #[must_use]
    pub fn lessons_in_order(&self) -> Vec<&Lesson> {
        let mut ordered: Vec<&Lesson> = self.lessons.iter().collect();
        ordered.sort_by_key(|lesson| lesson.order);
        ordered
    }

    /// Lesson at a 0-based position in traversal order.
    #[must_use]
    pub fn lesson_at(&self, index: usize) -> Option<&Lesson> {
        self.lessons_in_order().get(index).copied()
    }

    #[must_use]
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| &lesson.id == id)
    }

    /// 0-based position of a lesson in traversal order.
    #[must_use]
    pub fn position_of(&self, id: &LessonId) -> Option<usize> {
        self.lessons_in_order()
            .iter()
            .position(|lesson| &lesson.id == id)
    }

    /// The lesson following `id` in traversal order, if any.
    #[must_use]
    pub fn next_lesson_after(&self, id: &LessonId) -> Option<&Lesson> {
        let position = self.position_of(id)?;
        self.lesson_at(position + 1)
    }

    /// Update title, description and sequencing. Lessons are untouched.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank.
    pub fn update_details(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        sequential: bool,
    ) -> Result<(), CourseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        self.title = title;
        self.description = description.into().trim().to_owned();
        self.sequential = sequential;
        Ok(())
    }

    /// Rank the next appended lesson receives.
    ///
    /// One past the highest rank in use, so removals never cause a collision.
    #[must_use]
    pub fn next_order(&self) -> u32 {
        self.lessons
            .iter()
            .map(Lesson::order)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Append a new lesson at the end of the course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the title is blank or the id is already used.
    pub fn append_lesson(
        &mut self,
        id: LessonId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<&Lesson, CourseError> {
        let lesson = Lesson::new(id, self.id.clone(), title, content, self.next_order())?;
        self.insert_lesson(lesson)
    }

    /// Insert a fully built lesson, enforcing ownership and unique ranks.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ForeignLesson`, `CourseError::DuplicateLesson` or
    /// `CourseError::DuplicateOrder`.
    pub fn insert_lesson(&mut self, lesson: Lesson) -> Result<&Lesson, CourseError> {
        if lesson.course_id != self.id {
            return Err(CourseError::ForeignLesson {
                lesson: lesson.id,
                owner: lesson.course_id,
            });
        }
        if self.lesson(&lesson.id).is_some() {
            return Err(CourseError::DuplicateLesson(lesson.id));
        }
        if self.lessons.iter().any(|l| l.order == lesson.order) {
            return Err(CourseError::DuplicateOrder {
                order: lesson.order,
            });
        }
        self.lessons.push(lesson);
        let last = self.lessons.len() - 1;
        Ok(&self.lessons[last])
    }

    /// Replace title and content of a lesson, keeping its rank.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::LessonNotFound` or `CourseError::EmptyLessonTitle`.
    pub fn update_lesson(
        &mut self,
        id: &LessonId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<&Lesson, CourseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyLessonTitle);
        }
        let lesson = self
            .lessons
            .iter_mut()
            .find(|lesson| &lesson.id == id)
            .ok_or_else(|| CourseError::LessonNotFound(id.clone()))?;
        lesson.title = title;
        lesson.content = content.into();
        Ok(&*lesson)
    }

    /// Remove a lesson. Remaining ranks are left as they are.
    pub fn remove_lesson(&mut self, id: &LessonId) -> Option<Lesson> {
        let index = self.lessons.iter().position(|lesson| &lesson.id == id)?;
        Some(self.lessons.remove(index))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

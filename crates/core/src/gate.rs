//! Lesson unlocking within a course.

use serde::Serialize;

use crate::model::{Course, Lesson, UserProgress};

/// Whether the lesson at `index` (0-based, traversal order) may be opened.
///
/// The first lesson is always open and non-sequential courses open every
/// lesson. In a sequential course a later lesson opens once the lesson right
/// before it is completed; earlier lessons are not re-checked. Indices past
/// the end of the course are never available.
#[must_use]
pub fn is_lesson_available(course: &Course, progress: &UserProgress, index: usize) -> bool {
    if index == 0 {
        return true;
    }
    let ordered = course.lessons_in_order();
    if index >= ordered.len() {
        return false;
    }
    if !course.is_sequential() {
        return true;
    }
    progress.has_completed(ordered[index - 1].id())
}

/// A lesson together with its state for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonState<'a> {
    pub index: usize,
    pub lesson: &'a Lesson,
    pub completed: bool,
    pub available: bool,
}

/// All lessons of `course` in traversal order with completion and availability.
#[must_use]
pub fn lesson_states<'a>(course: &'a Course, progress: &UserProgress) -> Vec<LessonState<'a>> {
    course
        .lessons_in_order()
        .into_iter()
        .enumerate()
        .map(|(index, lesson)| LessonState {
            index,
            lesson,
            completed: progress.has_completed(lesson.id()),
            available: is_lesson_available(course, progress, index),
        })
        .collect()
}

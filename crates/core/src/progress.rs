//! Lesson completion and per-course progress summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Course, Lesson, UserProgress};

/// What happened when a lesson was marked as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum CompletionOutcome {
    /// The lesson was newly recorded.
    #[serde(rename_all = "camelCase")]
    Completed { course_completed: bool },
    /// The lesson was already in the completed set; nothing changed.
    AlreadyCompleted,
    /// The lesson does not belong to the course or the progress record.
    NotInCourse,
}

impl CompletionOutcome {
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, CompletionOutcome::Completed { .. })
    }
}

/// Record `lesson` as completed in `progress`.
///
/// Re-completing a lesson is a no-op and leaves `last_accessed_at` untouched.
/// On a new completion the course flag is recomputed as "completed count
/// equals lesson count"; it is not revisited when lessons are added later.
pub fn complete_lesson(
    progress: &mut UserProgress,
    lesson: &Lesson,
    course: &Course,
    now: DateTime<Utc>,
) -> CompletionOutcome {
    if lesson.course_id() != course.id()
        || progress.course_id() != course.id()
        || course.lesson(lesson.id()).is_none()
    {
        return CompletionOutcome::NotInCourse;
    }
    if progress.has_completed(lesson.id()) {
        return CompletionOutcome::AlreadyCompleted;
    }

    let course_completed = progress.completed_count() + 1 == course.lesson_count();
    progress.insert_completed(lesson.id().clone(), course_completed, now);
    CompletionOutcome::Completed { course_completed }
}

//
// ─── COURSE SUMMARY ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CourseStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Completion figures of one course for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCompletion {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    pub status: CourseStatus,
}

impl CourseCompletion {
    /// Summarise `progress` (if any) against `course`.
    #[must_use]
    pub fn of(course: &Course, progress: Option<&UserProgress>) -> Self {
        let total = course.lesson_count();
        let completed = progress.map_or(0, UserProgress::completed_count);
        let percentage = rounded_percent(completed as u64, total as u64);
        let status = match progress {
            Some(p) if p.is_course_completed() => CourseStatus::Completed,
            _ if completed > 0 => CourseStatus::InProgress,
            _ => CourseStatus::NotStarted,
        };
        Self {
            completed,
            total,
            percentage,
            status,
        }
    }
}

/// `round(100 * part / whole)` with halves rounded up, clamped to 100.
///
/// Returns 0 when `whole` is 0.
#[must_use]
pub fn rounded_percent(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    let scaled = (200 * u128::from(part) + u128::from(whole)) / (2 * u128::from(whole));
    u8::try_from(scaled.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseId, LessonId, UserId};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn course(lessons: usize) -> Course {
        let mut course = Course::new(CourseId::new("c1"), "Course", "", true).unwrap();
        for i in 1..=lessons {
            course
                .append_lesson(LessonId::new(format!("l{i}")), format!("Lesson {i}"), "")
                .unwrap();
        }
        course
    }

    fn progress() -> UserProgress {
        UserProgress::new(UserId::new("u1"), CourseId::new("c1"), fixed_now())
    }

    #[test]
    fn completing_twice_is_a_no_op() {
        let course = course(2);
        let lesson = course.lesson_at(0).unwrap().clone();
        let mut progress = progress();
        let later = fixed_now() + Duration::hours(1);

        let first = complete_lesson(&mut progress, &lesson, &course, later);
        assert_eq!(
            first,
            CompletionOutcome::Completed {
                course_completed: false
            }
        );
        let snapshot = progress.clone();

        let second = complete_lesson(&mut progress, &lesson, &course, later + Duration::hours(1));
        assert_eq!(second, CompletionOutcome::AlreadyCompleted);
        assert_eq!(progress, snapshot);
        assert_eq!(progress.last_accessed_at(), later);
    }

    #[test]
    fn course_completes_in_any_order() {
        let course = course(3);
        let mut progress = progress();
        for index in [2, 0, 1] {
            let lesson = course.lesson_at(index).unwrap().clone();
            let outcome = complete_lesson(&mut progress, &lesson, &course, fixed_now());
            assert!(outcome.changed());
        }
        assert!(progress.is_course_completed());
        assert_eq!(
            CourseCompletion::of(&course, Some(&progress)).status,
            CourseStatus::Completed
        );
    }

    #[test]
    fn adding_lessons_does_not_revoke_completion() {
        let mut course = course(1);
        let lesson = course.lesson_at(0).unwrap().clone();
        let mut progress = progress();
        complete_lesson(&mut progress, &lesson, &course, fixed_now());
        assert!(progress.is_course_completed());

        course
            .append_lesson(LessonId::new("l2"), "Lesson 2", "")
            .unwrap();
        assert!(progress.is_course_completed());
        let summary = CourseCompletion::of(&course, Some(&progress));
        assert_eq!(summary.percentage, 50);
        assert_eq!(summary.status, CourseStatus::Completed);
    }

    #[test]
    fn foreign_lesson_is_rejected() {
        let course = course(1);
        let mut other = Course::new(CourseId::new("c2"), "Other", "", false).unwrap();
        let foreign = other
            .append_lesson(LessonId::new("x"), "X", "")
            .unwrap()
            .clone();
        let mut progress = progress();
        assert_eq!(
            complete_lesson(&mut progress, &foreign, &course, fixed_now()),
            CompletionOutcome::NotInCourse
        );
        assert_eq!(progress.completed_count(), 0);
    }

    #[test]
    fn summary_without_progress_is_not_started() {
        let summary = CourseCompletion::of(&course(3), None);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.percentage, 0);
        assert_eq!(summary.status, CourseStatus::NotStarted);
    }

    #[test]
    fn rounded_percent_rounds_half_up() {
        assert_eq!(rounded_percent(20, 30), 67);
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(rounded_percent(1, 2), 50);
        assert_eq!(rounded_percent(1, 8), 13);
        assert_eq!(rounded_percent(5, 0), 0);
    }
}

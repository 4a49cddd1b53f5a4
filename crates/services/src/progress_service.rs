use std::sync::Arc;

use lms_core::gate::{LessonState, is_lesson_available, lesson_states};
use lms_core::model::{Course, CourseId, Lesson, LessonId, User, UserProgress};
use lms_core::progress::{CompletionOutcome, CourseCompletion, complete_lesson};
use serde::Serialize;
use storage::repository::{CourseRepository, ProgressRepository, UserRepository};
use tracing::{debug, info};

use crate::Clock;
use crate::error::ProgressServiceError;

/// A course as seen by the current student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub course: Course,
    pub progress: UserProgress,
    pub completion: CourseCompletion,
}

impl CourseView {
    /// Lessons in traversal order with their completed/available flags.
    #[must_use]
    pub fn lessons(&self) -> Vec<LessonState<'_>> {
        lesson_states(&self.course, &self.progress)
    }
}

/// One lesson page: the lesson, where it sits, and whether it is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    pub course_id: CourseId,
    pub lesson: Lesson,
    pub index: usize,
    pub completed: bool,
    pub available: bool,
    pub next_lesson: Option<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub course: Course,
    pub completion: CourseCompletion,
}

/// Student-facing progress operations.
///
/// Every operation acts on behalf of the current user. Without one, or when
/// the course or lesson is unknown, operations return `Ok(None)` and touch
/// nothing.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            courses,
            progress,
        }
    }

    /// Visit a course. The first visit creates and stores an empty progress
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn open_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<CourseView>, ProgressServiceError> {
        let Some(user) = self.current_user().await? else {
            return Ok(None);
        };
        let Some(course) = self.courses.get_course(course_id).await? else {
            return Ok(None);
        };

        let progress = match self.progress.get_progress(user.id(), course.id()).await? {
            Some(existing) => existing,
            None => {
                let created =
                    UserProgress::new(user.id().clone(), course.id().clone(), self.clock.now());
                self.progress.upsert_progress(&created).await?;
                info!(user_id = %user.id(), course_id = %course.id(), "progress record created");
                created
            }
        };

        let completion = CourseCompletion::of(&course, Some(&progress));
        Ok(Some(CourseView {
            course,
            progress,
            completion,
        }))
    }

    /// Mark a lesson of a course as finished for the current user.
    ///
    /// The record is written only when the outcome changed something; a
    /// repeated completion leaves storage and timestamps untouched.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn complete_lesson(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
    ) -> Result<Option<CompletionOutcome>, ProgressServiceError> {
        let Some(user) = self.current_user().await? else {
            debug!(lesson_id = %lesson_id, "no current user; completion skipped");
            return Ok(None);
        };
        let Some(course) = self.courses.get_course(course_id).await? else {
            return Ok(None);
        };
        let Some(lesson) = course.lesson(lesson_id) else {
            return Ok(None);
        };

        let now = self.clock.now();
        let mut progress = self
            .progress
            .get_progress(user.id(), course.id())
            .await?
            .unwrap_or_else(|| UserProgress::new(user.id().clone(), course.id().clone(), now));

        let outcome = complete_lesson(&mut progress, lesson, &course, now);
        if let CompletionOutcome::Completed { course_completed } = outcome {
            self.progress.upsert_progress(&progress).await?;
            info!(
                user_id = %user.id(),
                course_id = %course.id(),
                lesson_id = %lesson_id,
                course_completed,
                "lesson completed"
            );
        }
        Ok(Some(outcome))
    }

    /// Look up a lesson page without recording a visit.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn lesson_page(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonView>, ProgressServiceError> {
        let Some(user) = self.current_user().await? else {
            return Ok(None);
        };
        let Some(course) = self.courses.get_course(course_id).await? else {
            return Ok(None);
        };
        let (Some(lesson), Some(index)) = (course.lesson(lesson_id), course.position_of(lesson_id))
        else {
            return Ok(None);
        };

        let progress = self
            .progress
            .get_progress(user.id(), course.id())
            .await?
            .unwrap_or_else(|| {
                UserProgress::new(user.id().clone(), course.id().clone(), self.clock.now())
            });

        Ok(Some(LessonView {
            course_id: course.id().clone(),
            lesson: lesson.clone(),
            index,
            completed: progress.has_completed(lesson_id),
            available: is_lesson_available(&course, &progress, index),
            next_lesson: course.next_lesson_after(lesson_id).cloned(),
        }))
    }

    /// Completion figures for every course in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn course_summaries(
        &self,
    ) -> Result<Option<Vec<CourseSummary>>, ProgressServiceError> {
        let Some(user) = self.current_user().await? else {
            return Ok(None);
        };
        let courses = self.courses.list_courses().await?;
        let records = self.progress.list_progress_for_user(user.id()).await?;

        let summaries = courses
            .into_iter()
            .map(|course| {
                let record = records.iter().find(|p| p.course_id() == course.id());
                let completion = CourseCompletion::of(&course, record);
                CourseSummary { course, completion }
            })
            .collect();
        Ok(Some(summaries))
    }

    async fn current_user(&self) -> Result<Option<User>, ProgressServiceError> {
        let Some(id) = self.users.current_user_id().await? else {
            return Ok(None);
        };
        Ok(self.users.get_user(&id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lms_core::model::{Role, UserId};
    use lms_core::progress::CourseStatus;
    use lms_core::time::fixed_now;
    use storage::repository::Storage;

    struct Fixture {
        storage: Storage,
        course: Course,
    }

    async fn fixture(sequential: bool) -> Fixture {
        let storage = Storage::in_memory();
        let user =
            User::new(UserId::new("u1"), "Anna", "Sales", Role::Student, fixed_now()).unwrap();
        storage.users.upsert_user(&user).await.unwrap();
        storage.users.set_current_user(user.id()).await.unwrap();

        let mut course = Course::new(CourseId::new("c1"), "Safety", "", sequential).unwrap();
        for (id, title) in [("l1", "One"), ("l2", "Two"), ("l3", "Three")] {
            course.append_lesson(LessonId::new(id), title, "").unwrap();
        }
        storage.courses.upsert_course(&course).await.unwrap();
        Fixture { storage, course }
    }

    fn service(storage: &Storage, clock: Clock) -> ProgressService {
        ProgressService::new(
            clock,
            storage.users.clone(),
            storage.courses.clone(),
            storage.progress.clone(),
        )
    }

    #[tokio::test]
    async fn first_visit_creates_empty_progress() {
        let Fixture { storage, course } = fixture(true).await;
        let service = service(&storage, Clock::fixed(fixed_now()));

        let view = service.open_course(course.id()).await.unwrap().unwrap();
        assert_eq!(view.progress.completed_count(), 0);
        assert_eq!(view.completion.status, CourseStatus::NotStarted);
        let available: Vec<bool> = view.lessons().iter().map(|s| s.available).collect();
        assert_eq!(available, vec![true, false, false]);

        let stored = storage.progress.list_progress().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_for(&UserId::new("u1"), course.id()));

        service.open_course(course.id()).await.unwrap();
        assert_eq!(storage.progress.list_progress().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completing_every_lesson_completes_the_course() {
        let Fixture { storage, course } = fixture(true).await;
        let service = service(&storage, Clock::fixed(fixed_now()));

        for id in ["l2", "l1", "l3"] {
            let outcome = service
                .complete_lesson(course.id(), &LessonId::new(id))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(
                outcome,
                CompletionOutcome::Completed {
                    course_completed: id == "l3"
                }
            );
        }

        let summaries = service.course_summaries().await.unwrap().unwrap();
        assert_eq!(summaries[0].completion.percentage, 100);
        assert_eq!(summaries[0].completion.status, CourseStatus::Completed);
    }

    #[tokio::test]
    async fn repeated_completion_keeps_the_timestamp() {
        let Fixture { storage, course } = fixture(false).await;
        let first = service(&storage, Clock::fixed(fixed_now()));
        first
            .complete_lesson(course.id(), &LessonId::new("l1"))
            .await
            .unwrap();

        let later = service(&storage, Clock::fixed(fixed_now() + Duration::hours(3)));
        let outcome = later
            .complete_lesson(course.id(), &LessonId::new("l1"))
            .await
            .unwrap();
        assert_eq!(outcome, Some(CompletionOutcome::AlreadyCompleted));

        let stored = storage
            .progress
            .get_progress(&UserId::new("u1"), course.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_accessed_at(), fixed_now());
        assert_eq!(stored.completed_count(), 1);
    }

    #[tokio::test]
    async fn without_current_user_nothing_is_written() {
        let Fixture { storage, course } = fixture(true).await;
        storage.users.clear_current_user().await.unwrap();
        let service = service(&storage, Clock::fixed(fixed_now()));

        assert!(service.open_course(course.id()).await.unwrap().is_none());
        assert!(service
            .complete_lesson(course.id(), &LessonId::new("l1"))
            .await
            .unwrap()
            .is_none());
        assert!(service.course_summaries().await.unwrap().is_none());
        assert!(storage.progress.list_progress().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_course_or_lesson_is_ignored() {
        let Fixture { storage, course } = fixture(true).await;
        let service = service(&storage, Clock::fixed(fixed_now()));

        assert!(service
            .open_course(&CourseId::new("ghost"))
            .await
            .unwrap()
            .is_none());
        assert!(service
            .complete_lesson(course.id(), &LessonId::new("ghost"))
            .await
            .unwrap()
            .is_none());
        assert!(storage.progress.list_progress().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lesson_page_reports_gate_and_next_lesson() {
        let Fixture { storage, course } = fixture(true).await;
        let service = service(&storage, Clock::fixed(fixed_now()));

        let second = service
            .lesson_page(course.id(), &LessonId::new("l2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.index, 1);
        assert!(!second.available);
        assert_eq!(second.next_lesson.unwrap().id(), &LessonId::new("l3"));

        service
            .complete_lesson(course.id(), &LessonId::new("l1"))
            .await
            .unwrap();
        let second = service
            .lesson_page(course.id(), &LessonId::new("l2"))
            .await
            .unwrap()
            .unwrap();
        assert!(second.available);
        assert!(!second.completed);

        let last = service
            .lesson_page(course.id(), &LessonId::new("l3"))
            .await
            .unwrap()
            .unwrap();
        assert!(last.next_lesson.is_none());
    }
}

use std::sync::Arc;

use lms_core::model::{Course, CourseError, CourseId, Lesson, LessonId};
use storage::repository::{CourseRepository, StorageError};
use tracing::info;

use crate::error::CourseServiceError;

/// Course and lesson authoring.
///
/// Operations on a course or lesson that does not exist return `Ok(None)`
/// (or `Ok(false)`) and leave storage untouched.
#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.list_courses().await?)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, CourseServiceError> {
        Ok(self.courses.get_course(id).await?)
    }

    /// Create an empty course with a generated id.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` if the title is blank.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn create_course(
        &self,
        title: &str,
        description: &str,
        sequential: bool,
    ) -> Result<Course, CourseServiceError> {
        let course = Course::new(CourseId::generate(), title, description, sequential)?;
        self.courses.upsert_course(&course).await?;
        info!(course_id = %course.id(), "course created");
        Ok(course)
    }

    /// Update title, description and sequencing; lessons are kept.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` if the title is blank.
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn update_course(
        &self,
        id: &CourseId,
        title: &str,
        description: &str,
        sequential: bool,
    ) -> Result<Option<Course>, CourseServiceError> {
        let Some(mut course) = self.courses.get_course(id).await? else {
            return Ok(None);
        };
        course.update_details(title, description, sequential)?;
        self.courses.upsert_course(&course).await?;
        Ok(Some(course))
    }

    /// Returns `Ok(false)` if there was no such course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn delete_course(&self, id: &CourseId) -> Result<bool, CourseServiceError> {
        match self.courses.delete_course(id).await {
            Ok(()) => {
                info!(course_id = %id, "course deleted");
                Ok(true)
            }
            Err(StorageError::NotFound) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Append a lesson ranked after every existing lesson.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` if the title is blank.
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn add_lesson(
        &self,
        course_id: &CourseId,
        title: &str,
        content: &str,
    ) -> Result<Option<Lesson>, CourseServiceError> {
        let Some(mut course) = self.courses.get_course(course_id).await? else {
            return Ok(None);
        };
        let lesson = course
            .append_lesson(LessonId::generate(), title, content)?
            .clone();
        self.courses.upsert_course(&course).await?;
        info!(
            course_id = %course_id,
            lesson_id = %lesson.id(),
            order = lesson.order(),
            "lesson added"
        );
        Ok(Some(lesson))
    }

    /// Replace a lesson's title and body; its rank is kept.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` if the title is blank.
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn update_lesson(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
        title: &str,
        content: &str,
    ) -> Result<Option<Lesson>, CourseServiceError> {
        let Some(mut course) = self.courses.get_course(course_id).await? else {
            return Ok(None);
        };
        let lesson = match course.update_lesson(lesson_id, title, content) {
            Ok(lesson) => lesson.clone(),
            Err(CourseError::LessonNotFound(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        self.courses.upsert_course(&course).await?;
        Ok(Some(lesson))
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn remove_lesson(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
    ) -> Result<Option<Lesson>, CourseServiceError> {
        let Some(mut course) = self.courses.get_course(course_id).await? else {
            return Ok(None);
        };
        let Some(removed) = course.remove_lesson(lesson_id) else {
            return Ok(None);
        };
        self.courses.upsert_course(&course).await?;
        info!(course_id = %course_id, lesson_id = %lesson_id, "lesson removed");
        Ok(Some(removed))
    }

    /// All courses as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` or `CourseServiceError::Json`.
    pub async fn export_json(&self) -> Result<String, CourseServiceError> {
        let courses = self.courses.list_courses().await?;
        Ok(serde_json::to_string_pretty(&courses)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::Storage;

    fn service() -> CourseService {
        CourseService::new(Storage::in_memory().courses)
    }

    #[tokio::test]
    async fn lessons_are_appended_in_rank_order() {
        let service = service();
        let course = service.create_course("Safety", "", true).await.unwrap();
        let first = service
            .add_lesson(course.id(), "One", "# One")
            .await
            .unwrap()
            .unwrap();
        let second = service
            .add_lesson(course.id(), "Two", "# Two")
            .await
            .unwrap()
            .unwrap();
        assert_eq!((first.order(), second.order()), (1, 2));

        service.remove_lesson(course.id(), first.id()).await.unwrap();
        let third = service
            .add_lesson(course.id(), "Three", "")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(third.order(), 3);

        let stored = service.get_course(course.id()).await.unwrap().unwrap();
        assert_eq!(stored.lesson_count(), 2);
        assert_eq!(stored.lesson_at(0).unwrap().id(), second.id());
    }

    #[tokio::test]
    async fn update_lesson_keeps_rank() {
        let service = service();
        let course = service.create_course("Safety", "", false).await.unwrap();
        let lesson = service
            .add_lesson(course.id(), "One", "old")
            .await
            .unwrap()
            .unwrap();
        let updated = service
            .update_lesson(course.id(), lesson.id(), "One (v2)", "new")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.order(), lesson.order());
        assert_eq!(updated.title(), "One (v2)");
        assert_eq!(updated.content(), "new");

        let missing = service
            .update_lesson(course.id(), &LessonId::new("nope"), "x", "")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn missing_course_is_a_silent_no_op() {
        let service = service();
        let ghost = CourseId::new("ghost");
        assert!(service.add_lesson(&ghost, "One", "").await.unwrap().is_none());
        assert!(service
            .update_course(&ghost, "T", "", false)
            .await
            .unwrap()
            .is_none());
        assert!(!service.delete_course(&ghost).await.unwrap());
        assert!(service.list_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_course_validates_title() {
        let service = service();
        let course = service.create_course("Safety", "", false).await.unwrap();
        let err = service
            .update_course(course.id(), " ", "", true)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseServiceError::Course(CourseError::EmptyTitle)));
    }

    #[tokio::test]
    async fn export_json_lists_courses() {
        let service = service();
        service.create_course("Safety", "basics", true).await.unwrap();
        let json = service.export_json().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["title"], "Safety");
        assert_eq!(value[0]["lockUntilPassed"], true);
    }
}

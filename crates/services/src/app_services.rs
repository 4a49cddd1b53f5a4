use std::sync::Arc;

use lms_core::model::{
    Course, CourseId, LessonId, Question, QuestionId, QuestionKind, Quiz, QuizDraft, QuizId,
    RawAnswer, Role, User, UserId,
};
use lms_core::scoring::{QuizScorer, ScoringPolicy};
use storage::repository::{CourseRepository, QuizRepository, Storage, UserRepository};
use tracing::info;

use crate::Clock;
use crate::assessment_service::AssessmentService;
use crate::course_service::CourseService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::report_service::ReportService;
use crate::user_service::UserService;

pub const DEFAULT_ADMIN_ID: &str = "admin";
pub const SAMPLE_COURSE_ID: &str = "course-1";
pub const SAMPLE_LESSON_ID: &str = "lesson-1";
pub const SAMPLE_QUIZ_ID: &str = "quiz-1";

const SAMPLE_LESSON_BODY: &str = "# Welcome to the learning system\n\n\
This is your first lesson. It walks you through the basics of the platform.\n\n\
## What you will learn\n\
- How to work through lessons\n\
- How to take quizzes\n\
- How to follow your progress\n\n\
[quiz:quiz-1]";

/// Assembles app-facing services over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    users: Arc<UserService>,
    courses: Arc<CourseService>,
    quizzes: Arc<QuizService>,
    progress: Arc<ProgressService>,
    assessments: Arc<AssessmentService>,
    reports: Arc<ReportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and make sure the default
    /// data exists.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or default data
    /// setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        policy: ScoringPolicy,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::bootstrap(storage, clock, policy).await
    }

    /// Build services over a fresh in-memory store, with default data.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if default data setup fails.
    pub async fn in_memory(clock: Clock, policy: ScoringPolicy) -> Result<Self, AppServicesError> {
        Self::bootstrap(Storage::in_memory(), clock, policy).await
    }

    /// Seed default data into `storage`, then wire the services.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if default data setup fails.
    pub async fn bootstrap(
        storage: Storage,
        clock: Clock,
        policy: ScoringPolicy,
    ) -> Result<Self, AppServicesError> {
        ensure_default_data(&storage, clock).await?;
        Ok(Self::from_storage(storage, clock, policy))
    }

    /// Wire the services without touching stored data.
    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, policy: ScoringPolicy) -> Self {
        let users = Arc::new(UserService::new(clock, Arc::clone(&storage.users)));
        let courses = Arc::new(CourseService::new(Arc::clone(&storage.courses)));
        let quizzes = Arc::new(QuizService::new(Arc::clone(&storage.quizzes)));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.progress),
        ));
        let assessments = Arc::new(AssessmentService::new(
            clock,
            QuizScorer::new(policy),
            Arc::clone(&storage.users),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.progress),
        ));
        let reports = Arc::new(ReportService::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.progress),
        ));

        Self {
            users,
            courses,
            quizzes,
            progress,
            assessments,
            reports,
        }
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn assessments(&self) -> Arc<AssessmentService> {
        Arc::clone(&self.assessments)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<ReportService> {
        Arc::clone(&self.reports)
    }
}

/// Create the administrator when there are no users, and the sample course
/// with its quiz when there are no courses. Existing data is never touched.
///
/// # Errors
///
/// Returns `AppServicesError` if storage access fails.
pub async fn ensure_default_data(storage: &Storage, clock: Clock) -> Result<(), AppServicesError> {
    ensure_default_admin(storage.users.as_ref(), clock).await?;
    ensure_sample_course(storage.courses.as_ref(), storage.quizzes.as_ref()).await
}

async fn ensure_default_admin(
    users: &dyn UserRepository,
    clock: Clock,
) -> Result<(), AppServicesError> {
    if !users.list_users().await?.is_empty() {
        return Ok(());
    }
    let admin = User::new(
        UserId::new(DEFAULT_ADMIN_ID),
        "Administrator",
        "IT",
        Role::Admin,
        clock.now(),
    )?;
    users.upsert_user(&admin).await?;
    info!(user_id = DEFAULT_ADMIN_ID, "default administrator created");
    Ok(())
}

async fn ensure_sample_course(
    courses: &dyn CourseRepository,
    quizzes: &dyn QuizRepository,
) -> Result<(), AppServicesError> {
    if !courses.list_courses().await?.is_empty() {
        return Ok(());
    }

    let mut course = Course::new(
        CourseId::new(SAMPLE_COURSE_ID),
        "Introduction to the system",
        "A starter course to get to know the learning platform",
        true,
    )?;
    course.append_lesson(LessonId::new(SAMPLE_LESSON_ID), "Welcome", SAMPLE_LESSON_BODY)?;
    courses.upsert_course(&course).await?;

    let mut quiz = Quiz::new(
        QuizId::new(SAMPLE_QUIZ_ID),
        QuizDraft {
            title: "Knowledge check".into(),
            description: "A quiz on the first lesson".into(),
            time_limit_secs: Some(600),
            passing_score: Some(70),
        },
    )?;
    quiz.add_question(Question::new(
        QuestionId::new("q1"),
        QuestionKind::Single,
        "What is this platform called?",
        Some(vec![
            "LMS".into(),
            "Learning platform".into(),
            "Training system".into(),
            "All of the above".into(),
        ]),
        &RawAnswer::Number(3),
        10,
    )?)?;
    quizzes.upsert_quiz(&quiz).await?;

    info!(course_id = SAMPLE_COURSE_ID, quiz_id = SAMPLE_QUIZ_ID, "sample course created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lms_core::model::Submission;
    use lms_core::time::fixed_now;
    use storage::repository::{KeyValueStore, StorageError};

    #[tokio::test]
    async fn default_data_is_created_once() {
        let storage = Storage::in_memory();
        let clock = Clock::fixed(fixed_now());
        ensure_default_data(&storage, clock).await.unwrap();
        ensure_default_data(&storage, clock).await.unwrap();

        let users = storage.users.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role(), Role::Admin);
        assert_eq!(users[0].department(), "IT");

        let courses = storage.courses.list_courses().await.unwrap();
        assert_eq!(courses.len(), 1);
        assert!(courses[0].is_sequential());
        assert_eq!(courses[0].lesson_at(0).unwrap().order(), 1);

        let quiz = storage
            .quizzes
            .get_quiz(&QuizId::new(SAMPLE_QUIZ_ID))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quiz.passing_score(), 70);
        assert_eq!(quiz.time_limit_secs(), Some(600));
        assert_eq!(quiz.total_points(), 10);
    }

    #[tokio::test]
    async fn existing_catalog_is_left_alone() {
        let storage = Storage::in_memory();
        let own = Course::new(CourseId::new("mine"), "Mine", "", false).unwrap();
        storage.courses.upsert_course(&own).await.unwrap();

        ensure_default_data(&storage, Clock::fixed(fixed_now()))
            .await
            .unwrap();
        let courses = storage.courses.list_courses().await.unwrap();
        assert_eq!(courses, vec![own]);
        assert!(storage.quizzes.list_quizzes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sample_quiz_is_passable() {
        let services = AppServices::in_memory(Clock::fixed(fixed_now()), ScoringPolicy::default())
            .await
            .unwrap();
        services.users().register_student("Anna", "Sales").await.unwrap();

        let answers: Submission = [(QuestionId::new("q1"), RawAnswer::Number(3))].into();
        let result = services
            .assessments()
            .submit_quiz(
                &CourseId::new(SAMPLE_COURSE_ID),
                &QuizId::new(SAMPLE_QUIZ_ID),
                answers,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.score(), 100);
        assert!(result.passed());
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("disk unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk unavailable".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk unavailable".into()))
        }
    }

    #[tokio::test]
    async fn storage_failures_surface_as_errors() {
        let storage = Storage::from_store(Arc::new(BrokenStore));
        let err = AppServices::bootstrap(
            storage,
            Clock::fixed(fixed_now()),
            ScoringPolicy::default(),
        )
        .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AppServicesError::Storage(StorageError::Connection(_))
        ));
    }
}

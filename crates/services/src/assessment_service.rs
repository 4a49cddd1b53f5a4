use std::sync::Arc;

use lms_core::model::{CourseId, QuizId, QuizResult, Submission, UserProgress};
use lms_core::scoring::QuizScorer;
use storage::repository::{CourseRepository, ProgressRepository, QuizRepository, UserRepository};
use tracing::info;

use crate::Clock;
use crate::error::ProgressServiceError;

/// Quiz attempts by the current student.
#[derive(Clone)]
pub struct AssessmentService {
    clock: Clock,
    scorer: QuizScorer,
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    quizzes: Arc<dyn QuizRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl AssessmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        scorer: QuizScorer,
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        quizzes: Arc<dyn QuizRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            scorer,
            users,
            courses,
            quizzes,
            progress,
        }
    }

    #[must_use]
    pub fn scorer(&self) -> QuizScorer {
        self.scorer
    }

    /// Score an attempt and append the result to the student's record for
    /// `course_id`, creating the record if needed.
    ///
    /// Returns `Ok(None)` without writing when there is no current user or the
    /// course or quiz is unknown.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn submit_quiz(
        &self,
        course_id: &CourseId,
        quiz_id: &QuizId,
        answers: Submission,
    ) -> Result<Option<QuizResult>, ProgressServiceError> {
        let Some(user_id) = self.users.current_user_id().await? else {
            return Ok(None);
        };
        if self.users.get_user(&user_id).await?.is_none() {
            return Ok(None);
        }
        let Some(quiz) = self.quizzes.get_quiz(quiz_id).await? else {
            return Ok(None);
        };
        let Some(course) = self.courses.get_course(course_id).await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        let result = self.scorer.score_quiz(&quiz, &user_id, answers, now);

        let mut progress = self
            .progress
            .get_progress(&user_id, course.id())
            .await?
            .unwrap_or_else(|| UserProgress::new(user_id.clone(), course.id().clone(), now));
        progress.record_quiz_result(result.clone(), now);
        self.progress.upsert_progress(&progress).await?;

        info!(
            user_id = %user_id,
            quiz_id = %quiz_id,
            score = result.score(),
            passed = result.passed(),
            "quiz attempt recorded"
        );
        Ok(Some(result))
    }

    /// Every recorded attempt at `quiz_id` by the current user in
    /// `course_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn attempts(
        &self,
        course_id: &CourseId,
        quiz_id: &QuizId,
    ) -> Result<Vec<QuizResult>, ProgressServiceError> {
        let Some(user_id) = self.users.current_user_id().await? else {
            return Ok(Vec::new());
        };
        let Some(progress) = self.progress.get_progress(&user_id, course_id).await? else {
            return Ok(Vec::new());
        };
        Ok(progress
            .quiz_results()
            .iter()
            .filter(|result| result.quiz_id() == quiz_id)
            .cloned()
            .collect())
    }
}

use std::sync::Arc;

use lms_core::model::{Question, QuestionDraft, QuestionId, Quiz, QuizDraft, QuizId};
use storage::repository::{QuizRepository, StorageError};
use tracing::info;

use crate::error::QuizServiceError;

/// Quiz and question authoring.
#[derive(Clone)]
pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { quizzes }
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, QuizServiceError> {
        Ok(self.quizzes.list_quizzes().await?)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn get_quiz(&self, id: &QuizId) -> Result<Option<Quiz>, QuizServiceError> {
        Ok(self.quizzes.get_quiz(id).await?)
    }

    /// Create a quiz without questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for invalid metadata.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, QuizServiceError> {
        let quiz = Quiz::new(QuizId::generate(), draft)?;
        self.quizzes.upsert_quiz(&quiz).await?;
        info!(quiz_id = %quiz.id(), passing_score = quiz.passing_score(), "quiz created");
        Ok(quiz)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for invalid metadata.
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn update_quiz(
        &self,
        id: &QuizId,
        draft: QuizDraft,
    ) -> Result<Option<Quiz>, QuizServiceError> {
        let Some(mut quiz) = self.quizzes.get_quiz(id).await? else {
            return Ok(None);
        };
        quiz.update_details(draft)?;
        self.quizzes.upsert_quiz(&quiz).await?;
        Ok(Some(quiz))
    }

    /// Returns `Ok(false)` if there was no such quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn delete_quiz(&self, id: &QuizId) -> Result<bool, QuizServiceError> {
        match self.quizzes.delete_quiz(id).await {
            Ok(()) => {
                info!(quiz_id = %id, "quiz deleted");
                Ok(true)
            }
            Err(StorageError::NotFound) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Validate and append a question with a generated id.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` if the draft is invalid.
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn add_question(
        &self,
        quiz_id: &QuizId,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, QuizServiceError> {
        let Some(mut quiz) = self.quizzes.get_quiz(quiz_id).await? else {
            return Ok(None);
        };
        let question = draft.validate(QuestionId::generate())?;
        quiz.add_question(question.clone())?;
        self.quizzes.upsert_quiz(&quiz).await?;
        info!(
            quiz_id = %quiz_id,
            question_id = %question.id(),
            kind = %question.kind(),
            "question added"
        );
        Ok(Some(question))
    }

    /// Replace a question in place, keeping its id and position.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` if the draft is invalid.
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn update_question(
        &self,
        quiz_id: &QuizId,
        question_id: &QuestionId,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, QuizServiceError> {
        let Some(mut quiz) = self.quizzes.get_quiz(quiz_id).await? else {
            return Ok(None);
        };
        if quiz.question(question_id).is_none() {
            return Ok(None);
        }
        let question = draft.validate(question_id.clone())?;
        quiz.replace_question(question.clone())?;
        self.quizzes.upsert_quiz(&quiz).await?;
        Ok(Some(question))
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn remove_question(
        &self,
        quiz_id: &QuizId,
        question_id: &QuestionId,
    ) -> Result<Option<Question>, QuizServiceError> {
        let Some(mut quiz) = self.quizzes.get_quiz(quiz_id).await? else {
            return Ok(None);
        };
        let Some(removed) = quiz.remove_question(question_id) else {
            return Ok(None);
        };
        self.quizzes.upsert_quiz(&quiz).await?;
        Ok(Some(removed))
    }

    /// All quizzes as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` or `QuizServiceError::Json`.
    pub async fn export_json(&self) -> Result<String, QuizServiceError> {
        let quizzes = self.quizzes.list_quizzes().await?;
        Ok(serde_json::to_string_pretty(&quizzes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{
        DEFAULT_PASSING_SCORE, DEFAULT_QUESTION_POINTS, QuestionKind, QuizError, RawAnswer,
    };
    use storage::repository::Storage;

    fn service() -> QuizService {
        QuizService::new(Storage::in_memory().quizzes)
    }

    fn draft(title: &str) -> QuizDraft {
        QuizDraft {
            title: title.into(),
            ..QuizDraft::default()
        }
    }

    fn question(kind: QuestionKind, answer: RawAnswer) -> QuestionDraft {
        QuestionDraft {
            kind,
            text: "Question?".into(),
            options: None,
            correct_answer: answer,
            points: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let quiz = service().create_quiz(draft("Check")).await.unwrap();
        assert_eq!(quiz.passing_score(), DEFAULT_PASSING_SCORE);
        assert!(quiz.id().as_str().starts_with("quiz-"));
    }

    #[tokio::test]
    async fn questions_can_be_added_updated_and_removed() {
        let service = service();
        let quiz = service.create_quiz(draft("Check")).await.unwrap();
        let added = service
            .add_question(quiz.id(), question(QuestionKind::TrueFalse, "true".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(added.points(), DEFAULT_QUESTION_POINTS);

        let mut replacement = question(QuestionKind::FillBlank, "Paris".into());
        replacement.points = Some(25);
        let updated = service
            .update_question(quiz.id(), added.id(), replacement)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id(), added.id());

        let stored = service.get_quiz(quiz.id()).await.unwrap().unwrap();
        assert_eq!(stored.total_points(), 25);
        assert_eq!(stored.questions()[0].kind(), QuestionKind::FillBlank);

        service.remove_question(quiz.id(), added.id()).await.unwrap();
        let stored = service.get_quiz(quiz.id()).await.unwrap().unwrap();
        assert!(stored.questions().is_empty());
    }

    #[tokio::test]
    async fn invalid_question_is_rejected_without_writing() {
        let service = service();
        let quiz = service.create_quiz(draft("Check")).await.unwrap();
        let mut bad = question(QuestionKind::Single, RawAnswer::Number(1));
        bad.points = Some(0);
        let err = service.add_question(quiz.id(), bad).await.unwrap_err();
        assert!(matches!(err, QuizServiceError::Quiz(QuizError::InvalidPoints)));

        let stored = service.get_quiz(quiz.id()).await.unwrap().unwrap();
        assert!(stored.questions().is_empty());
    }

    #[tokio::test]
    async fn passing_score_above_hundred_is_rejected() {
        let service = service();
        let quiz = service.create_quiz(draft("Check")).await.unwrap();
        let mut bad = draft("Check");
        bad.passing_score = Some(120);
        let err = service.update_quiz(quiz.id(), bad).await.unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Quiz(QuizError::InvalidPassingScore(120))
        ));
    }

    #[tokio::test]
    async fn delete_and_export() {
        let service = service();
        let keep = service.create_quiz(draft("Keep")).await.unwrap();
        let drop = service.create_quiz(draft("Drop")).await.unwrap();
        assert!(service.delete_quiz(drop.id()).await.unwrap());
        assert!(!service.delete_quiz(drop.id()).await.unwrap());

        let json = service.export_json().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["id"], keep.id().as_str());
        assert_eq!(value[0]["passingScore"], 70);
    }
}

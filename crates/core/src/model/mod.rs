mod answer;
mod course;
mod ids;
mod progress;
mod quiz;
mod user;

pub use ids::{CourseId, LessonId, ParseIdError, QuestionId, QuizId, ResultId, UserId};

pub use answer::{AnswerShapeError, AnswerValue, RawAnswer, RawScalar, Submission};
pub use course::{Course, CourseError, Lesson};
pub use progress::{QuizResult, UserProgress};
pub use quiz::{
    DEFAULT_PASSING_SCORE, DEFAULT_QUESTION_POINTS, ParseQuestionKindError, Question,
    QuestionDraft, QuestionKind, Quiz, QuizDraft, QuizError,
};
pub use user::{Role, User, UserError};

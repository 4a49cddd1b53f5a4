use thiserror::Error;

use crate::model::{AnswerShapeError, CourseError, QuizError, UserError};
use crate::report::ExportError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    AnswerShape(#[from] AnswerShapeError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

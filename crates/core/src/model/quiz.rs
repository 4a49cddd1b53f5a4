use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::{AnswerShapeError, AnswerValue, RawAnswer};
use crate::model::ids::{QuestionId, QuizId};

/// Passing score applied when the author does not set one.
pub const DEFAULT_PASSING_SCORE: u8 = 70;

/// Point weight applied when the author does not set one.
pub const DEFAULT_QUESTION_POINTS: u32 = 10;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("passing score must be between 0 and 100, got {0}")]
    InvalidPassingScore(u8),

    #[error("time limit must be > 0 seconds")]
    InvalidTimeLimit,

    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("question points must be > 0")]
    InvalidPoints,

    #[error("true/false answer must be \"true\" or \"false\"")]
    InvalidTrueFalse,

    #[error("question {0} already exists in this quiz")]
    DuplicateQuestion(QuestionId),

    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),

    #[error(transparent)]
    AnswerShape(#[from] AnswerShapeError),
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// The ten supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "multiple")]
    Multiple,
    #[serde(rename = "truefalse")]
    TrueFalse,
    #[serde(rename = "fillblank")]
    FillBlank,
    #[serde(rename = "sequence")]
    Sequence,
    #[serde(rename = "dragdrop")]
    DragDrop,
    #[serde(rename = "dragdrop-categories")]
    DragDropCategories,
    #[serde(rename = "hotspot")]
    Hotspot,
    #[serde(rename = "hotspot-multiple")]
    HotspotMultiple,
    #[serde(rename = "hotspot-sequence")]
    HotspotSequence,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 10] = [
        QuestionKind::Single,
        QuestionKind::Multiple,
        QuestionKind::TrueFalse,
        QuestionKind::FillBlank,
        QuestionKind::Sequence,
        QuestionKind::DragDrop,
        QuestionKind::DragDropCategories,
        QuestionKind::Hotspot,
        QuestionKind::HotspotMultiple,
        QuestionKind::HotspotSequence,
    ];

    /// Stored type tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
            QuestionKind::TrueFalse => "truefalse",
            QuestionKind::FillBlank => "fillblank",
            QuestionKind::Sequence => "sequence",
            QuestionKind::DragDrop => "dragdrop",
            QuestionKind::DragDropCategories => "dragdrop-categories",
            QuestionKind::Hotspot => "hotspot",
            QuestionKind::HotspotMultiple => "hotspot-multiple",
            QuestionKind::HotspotSequence => "hotspot-sequence",
        }
    }

    /// Human-readable description of the answer shape this kind expects.
    #[must_use]
    pub fn expected_shape(self) -> &'static str {
        match self {
            QuestionKind::Single => "a non-negative option index",
            QuestionKind::Multiple | QuestionKind::HotspotMultiple => "a list of choices",
            QuestionKind::TrueFalse => "\"true\" or \"false\"",
            QuestionKind::FillBlank => "text",
            QuestionKind::Hotspot => "a region id",
            QuestionKind::Sequence | QuestionKind::DragDrop | QuestionKind::HotspotSequence => {
                "an ordered list"
            }
            QuestionKind::DragDropCategories => "an item-to-category mapping",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown question type: {0}")]
pub struct ParseQuestionKindError(String);

impl FromStr for QuestionKind {
    type Err = ParseQuestionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| ParseQuestionKindError(s.to_owned()))
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Author input for a new or edited question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub kind: QuestionKind,
    pub text: String,
    pub options: Option<Vec<String>>,
    pub correct_answer: RawAnswer,
    pub points: Option<u32>,
}

impl QuestionDraft {
    /// Validate the draft into a question with the given id.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for blank text, zero points or an answer that does
    /// not fit the kind.
    pub fn validate(self, id: QuestionId) -> Result<Question, QuizError> {
        Question::new(
            id,
            self.kind,
            self.text,
            self.options,
            &self.correct_answer,
            self.points.unwrap_or(DEFAULT_QUESTION_POINTS),
        )
    }
}

/// Persisted shape of a question; the correct answer stays loosely typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    id: QuestionId,
    #[serde(rename = "type")]
    kind: QuestionKind,
    question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    correct_answer: RawAnswer,
    points: u32,
}

/// A scored question whose correct answer matches its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    text: String,
    options: Option<Vec<String>>,
    correct_answer: AnswerValue,
    points: u32,
}

impl Question {
    /// Creates a question, interpreting `correct_answer` for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for blank text, zero points, an answer that does
    /// not fit the kind, or a true/false answer other than `"true"`/`"false"`.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        text: impl Into<String>,
        options: Option<Vec<String>>,
        correct_answer: &RawAnswer,
        points: u32,
    ) -> Result<Self, QuizError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuizError::EmptyQuestion);
        }
        if points == 0 {
            return Err(QuizError::InvalidPoints);
        }
        let correct_answer = AnswerValue::coerce(kind, correct_answer)?;
        if kind == QuestionKind::TrueFalse
            && !matches!(&correct_answer, AnswerValue::Text(t) if t == "true" || t == "false")
        {
            return Err(QuizError::InvalidTrueFalse);
        }

        let options = options
            .map(|opts| {
                opts.into_iter()
                    .map(|opt| opt.trim().to_owned())
                    .filter(|opt| !opt.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|opts| !opts.is_empty());

        Ok(Self {
            id,
            kind,
            text,
            options,
            correct_answer,
            points,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    #[must_use]
    pub fn correct_answer(&self) -> &AnswerValue {
        &self.correct_answer
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuizError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(
            record.id,
            record.kind,
            record.question,
            record.options,
            &record.correct_answer,
            record.points,
        )
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        Self {
            correct_answer: question.correct_answer.to_raw(),
            id: question.id,
            kind: question.kind,
            question: question.text,
            options: question.options,
            points: question.points,
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Author input for quiz metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub time_limit_secs: Option<u32>,
    pub passing_score: Option<u8>,
}

/// A typed question set with a passing threshold.
///
/// The time limit is informational; scoring never looks at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_limit: Option<u32>,
    passing_score: u8,
}

impl Quiz {
    /// Creates an empty quiz from a draft.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for a blank title, a passing score above 100 or a
    /// zero time limit.
    pub fn new(id: QuizId, draft: QuizDraft) -> Result<Self, QuizError> {
        let mut quiz = Self {
            id,
            title: String::new(),
            description: String::new(),
            questions: Vec::new(),
            time_limit: None,
            passing_score: DEFAULT_PASSING_SCORE,
        };
        quiz.update_details(draft)?;
        Ok(quiz)
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
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
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    /// Sum of all question weights.
    #[must_use]
    pub fn total_points(&self) -> u64 {
        self.questions.iter().map(|q| u64::from(q.points)).sum()
    }

    /// Replace title, description, time limit and passing score.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for a blank title, a passing score above 100 or a
    /// zero time limit.
    pub fn update_details(&mut self, draft: QuizDraft) -> Result<(), QuizError> {
        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        let passing_score = draft.passing_score.unwrap_or(DEFAULT_PASSING_SCORE);
        if passing_score > 100 {
            return Err(QuizError::InvalidPassingScore(passing_score));
        }
        if draft.time_limit_secs == Some(0) {
            return Err(QuizError::InvalidTimeLimit);
        }

        self.title = title;
        self.description = draft.description.trim().to_owned();
        self.time_limit = draft.time_limit_secs;
        self.passing_score = passing_score;
        Ok(())
    }

    /// Append a question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::DuplicateQuestion` if the id is already present.
    pub fn add_question(&mut self, question: Question) -> Result<(), QuizError> {
        if self.question(&question.id).is_some() {
            return Err(QuizError::DuplicateQuestion(question.id));
        }
        self.questions.push(question);
        Ok(())
    }

    /// Replace a question in place, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::QuestionNotFound` if no question has that id.
    pub fn replace_question(&mut self, question: Question) -> Result<(), QuizError> {
        let slot = self
            .questions
            .iter_mut()
            .find(|q| q.id == question.id)
            .ok_or_else(|| QuizError::QuestionNotFound(question.id.clone()))?;
        *slot = question;
        Ok(())
    }

    pub fn remove_question(&mut self, id: &QuestionId) -> Option<Question> {
        let index = self.questions.iter().position(|q| &q.id == id)?;
        Some(self.questions.remove(index))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

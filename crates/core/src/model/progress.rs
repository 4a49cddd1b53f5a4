use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::Submission;
use crate::model::ids::{CourseId, LessonId, QuizId, ResultId, UserId};

//
// ─── QUIZ RESULT ───────────────────────────────────────────────────────────────
//

/// One scored quiz attempt. A new attempt always produces a new result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    id: ResultId,
    user_id: UserId,
    quiz_id: QuizId,
    score: u8,
    passed: bool,
    answers: Submission,
    completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Assembles a result. `passed` is taken as computed by the scorer.
    #[must_use]
    pub fn new(
        id: ResultId,
        user_id: UserId,
        quiz_id: QuizId,
        score: u8,
        passed: bool,
        answers: Submission,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            quiz_id,
            score: score.min(100),
            passed,
            answers,
            completed_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ResultId {
        &self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn answers(&self) -> &Submission {
        &self.answers
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// Progress of one student through one course.
///
/// Identified by `(user_id, course_id)`. Lesson completion goes through
/// [`crate::progress::complete_lesson`] so that `course_completed` stays in
/// step with the completed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    user_id: UserId,
    course_id: CourseId,
    #[serde(default)]
    completed_lessons: BTreeSet<LessonId>,
    #[serde(default)]
    quiz_results: Vec<QuizResult>,
    #[serde(default)]
    course_completed: bool,
    last_accessed_at: DateTime<Utc>,
}

impl UserProgress {
    /// Fresh, empty progress created on first visit.
    #[must_use]
    pub fn new(user_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            course_id,
            completed_lessons: BTreeSet::new(),
            quiz_results: Vec::new(),
            course_completed: false,
            last_accessed_at: now,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    /// Whether this record belongs to the given `(user, course)` pair.
    #[must_use]
    pub fn is_for(&self, user_id: &UserId, course_id: &CourseId) -> bool {
        &self.user_id == user_id && &self.course_id == course_id
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &BTreeSet<LessonId> {
        &self.completed_lessons
    }

    #[must_use]
    pub fn has_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_lessons.len()
    }

    #[must_use]
    pub fn quiz_results(&self) -> &[QuizResult] {
        &self.quiz_results
    }

    #[must_use]
    pub fn is_course_completed(&self) -> bool {
        self.course_completed
    }

    #[must_use]
    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        self.last_accessed_at
    }

    /// Append a quiz attempt. Earlier attempts are kept.
    pub fn record_quiz_result(&mut self, result: QuizResult, now: DateTime<Utc>) {
        self.quiz_results.push(result);
        self.last_accessed_at = now;
    }

    pub(crate) fn insert_completed(
        &mut self,
        lesson_id: LessonId,
        course_completed: bool,
        now: DateTime<Utc>,
    ) -> bool {
        let inserted = self.completed_lessons.insert(lesson_id);
        if inserted {
            self.course_completed = course_completed;
            self.last_accessed_at = now;
        }
        inserted
    }
}

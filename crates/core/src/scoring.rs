//! Quiz scoring.
//!
//! Every question is all-or-nothing: a correct answer earns the question's
//! full weight, anything else earns zero. The percentage score is
//! `round(100 * earned / possible)` (0 for a quiz without points) and the
//! attempt passes when the score reaches the quiz's passing threshold.
//! Scoring never looks at the clock or the quiz time limit.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    AnswerValue, Question, QuestionId, QuestionKind, Quiz, QuizResult, RawAnswer, ResultId,
    Submission, UserId,
};
use crate::progress::rounded_percent;

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// How fill-in-the-blank answers are compared with the expected text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMatch {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Trimmed, inner whitespace collapsed, case-insensitive.
    Normalized,
}

impl TextMatch {
    #[must_use]
    pub fn matches(self, expected: &str, given: &str) -> bool {
        match self {
            TextMatch::Exact => expected == given,
            TextMatch::Normalized => normalize(expected) == normalize(given),
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown text match mode `{0}` (expected `exact` or `normalized`)")]
pub struct ParseTextMatchError(String);

impl FromStr for TextMatch {
    type Err = ParseTextMatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(TextMatch::Exact),
            "normalized" | "normalised" => Ok(TextMatch::Normalized),
            _ => Err(ParseTextMatchError(s.to_owned())),
        }
    }
}

/// Tunable parts of answer comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub fill_blank: TextMatch,
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub correct: bool,
    pub earned: u32,
    pub possible: u32,
}

/// Breakdown of one evaluated attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub earned: u64,
    pub possible: u64,
    pub score: u8,
    pub passed: bool,
    pub outcomes: Vec<QuestionOutcome>,
}

//
// ─── SCORER ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
pub struct QuizScorer {
    policy: ScoringPolicy,
}

impl QuizScorer {
    #[must_use]
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    /// Whether `given` is a correct answer to `question`.
    ///
    /// A missing answer or one that cannot be read in the question's shape
    /// is incorrect.
    #[must_use]
    pub fn is_correct(&self, question: &Question, given: Option<&RawAnswer>) -> bool {
        let Some(raw) = given else {
            return false;
        };
        let Ok(given) = AnswerValue::coerce(question.kind(), raw) else {
            return false;
        };

        match (question.kind(), question.correct_answer(), &given) {
            (QuestionKind::Single, AnswerValue::Index(expected), AnswerValue::Index(got)) => {
                expected == got
            }
            (
                QuestionKind::Multiple | QuestionKind::HotspotMultiple,
                AnswerValue::Selection(expected),
                AnswerValue::Selection(got),
            ) => expected == got,
            (QuestionKind::TrueFalse, AnswerValue::Text(expected), AnswerValue::Text(got)) => {
                expected == got
            }
            (QuestionKind::FillBlank, AnswerValue::Text(expected), AnswerValue::Text(got)) => {
                self.policy.fill_blank.matches(expected, got)
            }
            (QuestionKind::Hotspot, AnswerValue::Text(expected), AnswerValue::Text(got)) => {
                expected.trim() == got.trim()
            }
            (
                QuestionKind::Sequence | QuestionKind::DragDrop | QuestionKind::HotspotSequence,
                AnswerValue::Ordered(expected),
                AnswerValue::Ordered(got),
            ) => expected == got,
            (
                QuestionKind::DragDropCategories,
                AnswerValue::Categories(expected),
                AnswerValue::Categories(got),
            ) => expected == got,
            _ => false,
        }
    }

    /// Evaluate every question of `quiz` against `answers`.
    #[must_use]
    pub fn evaluate(&self, quiz: &Quiz, answers: &Submission) -> QuizScore {
        let outcomes: Vec<QuestionOutcome> = quiz
            .questions()
            .iter()
            .map(|question| {
                let correct = self.is_correct(question, answers.get(question.id()));
                QuestionOutcome {
                    question_id: question.id().clone(),
                    correct,
                    earned: if correct { question.points() } else { 0 },
                    possible: question.points(),
                }
            })
            .collect();

        let earned = outcomes.iter().map(|o| u64::from(o.earned)).sum();
        let possible = outcomes.iter().map(|o| u64::from(o.possible)).sum();
        let score = rounded_percent(earned, possible);

        QuizScore {
            earned,
            possible,
            score,
            passed: score >= quiz.passing_score(),
            outcomes,
        }
    }

    /// Score an attempt and package it as a new, immutable result.
    #[must_use]
    pub fn score_quiz(
        &self,
        quiz: &Quiz,
        user_id: &UserId,
        answers: Submission,
        completed_at: DateTime<Utc>,
    ) -> QuizResult {
        let evaluated = self.evaluate(quiz, &answers);
        QuizResult::new(
            ResultId::generate(),
            user_id.clone(),
            quiz.id().clone(),
            evaluated.score,
            evaluated.passed,
            answers,
            completed_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuizDraft, QuizId};
    use crate::time::fixed_now;

    fn quiz(passing: u8, questions: Vec<Question>) -> Quiz {
        let mut quiz = Quiz::new(
            QuizId::new("quiz"),
            QuizDraft {
                title: "Quiz".into(),
                passing_score: Some(passing),
                ..QuizDraft::default()
            },
        )
        .unwrap();
        for q in questions {
            quiz.add_question(q).unwrap();
        }
        quiz
    }

    fn question(id: &str, kind: QuestionKind, answer: RawAnswer, points: u32) -> Question {
        Question::new(QuestionId::new(id), kind, "?", None, &answer, points).unwrap()
    }

    fn submission(pairs: Vec<(&str, RawAnswer)>) -> Submission {
        pairs
            .into_iter()
            .map(|(id, answer)| (QuestionId::new(id), answer))
            .collect()
    }

    #[test]
    fn partial_quiz_rounds_and_fails_threshold() {
        let quiz = quiz(
            70,
            vec![
                question("a", QuestionKind::Single, RawAnswer::Number(1), 10),
                question("b", QuestionKind::Single, RawAnswer::Number(2), 20),
            ],
        );
        let answers = submission(vec![("a", RawAnswer::Number(0)), ("b", RawAnswer::Number(2))]);
        let scored = QuizScorer::default().evaluate(&quiz, &answers);
        assert_eq!(scored.earned, 20);
        assert_eq!(scored.possible, 30);
        assert_eq!(scored.score, 67);
        assert!(!scored.passed);
    }

    #[test]
    fn true_false_full_marks_pass() {
        let quiz = quiz(
            50,
            vec![question("t", QuestionKind::TrueFalse, "true".into(), 10)],
        );
        let result = QuizScorer::default().score_quiz(
            &quiz,
            &UserId::new("u1"),
            submission(vec![("t", "true".into())]),
            fixed_now(),
        );
        assert_eq!(result.score(), 100);
        assert!(result.passed());
        assert_eq!(result.quiz_id(), &QuizId::new("quiz"));
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let quiz = quiz(0, Vec::new());
        let scored = QuizScorer::default().evaluate(&quiz, &Submission::new());
        assert_eq!(scored.score, 0);
        assert!(scored.passed);
    }

    #[test]
    fn multiple_choice_is_order_free_without_partial_credit() {
        let q = question("m", QuestionKind::Multiple, RawAnswer::list(["0", "2"]), 10);
        let scorer = QuizScorer::default();
        assert!(scorer.is_correct(&q, Some(&RawAnswer::list(["2", "0"]))));
        assert!(!scorer.is_correct(&q, Some(&RawAnswer::list(["0"]))));
        assert!(!scorer.is_correct(&q, Some(&RawAnswer::list(["0", "1", "2"]))));
    }

    #[test]
    fn ordered_kinds_require_exact_order() {
        for kind in [
            QuestionKind::Sequence,
            QuestionKind::DragDrop,
            QuestionKind::HotspotSequence,
        ] {
            let q = question("s", kind, RawAnswer::list(["a", "b", "c"]), 5);
            let scorer = QuizScorer::default();
            assert!(scorer.is_correct(&q, Some(&"a,b,c".into())));
            assert!(!scorer.is_correct(&q, Some(&RawAnswer::list(["b", "a", "c"]))));
        }
    }

    #[test]
    fn categories_need_every_item_placed() {
        let q = question(
            "c",
            QuestionKind::DragDropCategories,
            RawAnswer::mapping([("apple", "fruit"), ("carrot", "vegetable")]),
            5,
        );
        let scorer = QuizScorer::default();
        assert!(scorer.is_correct(
            &q,
            Some(&RawAnswer::mapping([("carrot", "vegetable"), ("apple", "fruit")]))
        ));
        assert!(!scorer.is_correct(&q, Some(&RawAnswer::mapping([("apple", "fruit")]))));
        assert!(!scorer.is_correct(
            &q,
            Some(&RawAnswer::mapping([("apple", "vegetable"), ("carrot", "vegetable")]))
        ));
    }

    #[test]
    fn hotspot_kinds_compare_region_ids() {
        let scorer = QuizScorer::default();
        let single = question("h", QuestionKind::Hotspot, "engine".into(), 5);
        assert!(scorer.is_correct(&single, Some(&" engine ".into())));
        assert!(!scorer.is_correct(&single, Some(&"wheel".into())));

        let multiple = question(
            "hm",
            QuestionKind::HotspotMultiple,
            RawAnswer::list(["door", "roof"]),
            5,
        );
        assert!(scorer.is_correct(&multiple, Some(&"roof,door".into())));
    }

    #[test]
    fn fill_blank_respects_policy() {
        let q = question("f", QuestionKind::FillBlank, "Paris".into(), 5);
        let exact = QuizScorer::default();
        let relaxed = QuizScorer::new(ScoringPolicy {
            fill_blank: TextMatch::Normalized,
        });
        assert!(exact.is_correct(&q, Some(&"Paris".into())));
        assert!(!exact.is_correct(&q, Some(&" paris".into())));
        assert!(relaxed.is_correct(&q, Some(&" paris ".into())));
        assert!(!relaxed.is_correct(&q, Some(&"London".into())));
    }

    #[test]
    fn missing_or_malformed_answers_are_incorrect() {
        let q = question("s", QuestionKind::Single, RawAnswer::Number(3), 10);
        let scorer = QuizScorer::default();
        assert!(!scorer.is_correct(&q, None));
        assert!(!scorer.is_correct(&q, Some(&"three".into())));
        assert!(!scorer.is_correct(&q, Some(&RawAnswer::Flag(true))));
    }

    #[test]
    fn scoring_is_deterministic() {
        let quiz = quiz(
            50,
            vec![
                question("a", QuestionKind::Single, RawAnswer::Number(1), 10),
                question("b", QuestionKind::FillBlank, "x".into(), 10),
            ],
        );
        let answers = submission(vec![("a", RawAnswer::Number(1)), ("b", "y".into())]);
        let scorer = QuizScorer::default();
        assert_eq!(scorer.evaluate(&quiz, &answers), scorer.evaluate(&quiz, &answers));
    }

    #[test]
    fn text_match_parses_config_values() {
        assert_eq!("Exact".parse::<TextMatch>().unwrap(), TextMatch::Exact);
        assert_eq!(
            "normalized".parse::<TextMatch>().unwrap(),
            TextMatch::Normalized
        );
        assert!("fuzzy".parse::<TextMatch>().is_err());
    }
}

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::quiz::QuestionKind;

//
// ─── RAW (PERSISTED) SHAPES ────────────────────────────────────────────────────
//

/// Scalar element of a stored answer list: an option index or a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Number(i64),
    Text(String),
}

impl RawScalar {
    fn token(&self) -> String {
        match self {
            RawScalar::Number(n) => n.to_string(),
            RawScalar::Text(s) => s.trim().to_owned(),
        }
    }
}

/// Loosely shaped answer as it is stored or submitted.
///
/// The meaning depends on the owning question's [`QuestionKind`]; use
/// [`AnswerValue::coerce`] to obtain the typed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Flag(bool),
    Number(i64),
    Text(String),
    List(Vec<RawScalar>),
    Mapping(BTreeMap<String, String>),
}

impl RawAnswer {
    /// Convenience constructor for list answers made of tokens.
    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(
            items
                .into_iter()
                .map(|item| RawScalar::Text(item.into()))
                .collect(),
        )
    }

    /// Convenience constructor for category mappings (item → category).
    #[must_use]
    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for RawAnswer {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for RawAnswer {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for RawAnswer {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Answers submitted for one quiz attempt, keyed by question.
pub type Submission = BTreeMap<QuestionId, RawAnswer>;

//
// ─── TYPED ANSWER ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} answer must be {expected}")]
pub struct AnswerShapeError {
    pub kind: QuestionKind,
    pub expected: &'static str,
}

/// Answer in the shape dictated by a question kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    /// `single`: index of the chosen option.
    Index(u32),
    /// `multiple`, `hotspot-multiple`: order-independent choice set.
    Selection(BTreeSet<String>),
    /// `truefalse`, `fillblank`, `hotspot`: a single token.
    Text(String),
    /// `sequence`, `dragdrop`, `hotspot-sequence`: order matters.
    Ordered(Vec<String>),
    /// `dragdrop-categories`: item → category.
    Categories(BTreeMap<String, String>),
}

impl AnswerValue {
    /// Interpret a raw answer according to `kind`.
    ///
    /// Comma-separated text is accepted for list kinds, numbers are accepted
    /// wherever a token is expected, and booleans for true/false.
    ///
    /// # Errors
    ///
    /// Returns `AnswerShapeError` when `raw` cannot be read as the kind's shape.
    pub fn coerce(kind: QuestionKind, raw: &RawAnswer) -> Result<Self, AnswerShapeError> {
        let mismatch = || AnswerShapeError {
            kind,
            expected: kind.expected_shape(),
        };

        match kind {
            QuestionKind::Single => match raw {
                RawAnswer::Number(n) => u32::try_from(*n).map(Self::Index).map_err(|_| mismatch()),
                RawAnswer::Text(s) => {
                    s.trim().parse::<u32>().map(Self::Index).map_err(|_| mismatch())
                }
                _ => Err(mismatch()),
            },
            QuestionKind::Multiple | QuestionKind::HotspotMultiple => {
                tokens(raw).map(|t| Self::Selection(t.into_iter().collect())).ok_or_else(mismatch)
            }
            QuestionKind::TrueFalse => match raw {
                RawAnswer::Flag(b) => Ok(Self::Text(b.to_string())),
                RawAnswer::Text(s) => Ok(Self::Text(s.clone())),
                _ => Err(mismatch()),
            },
            QuestionKind::FillBlank | QuestionKind::Hotspot => match raw {
                RawAnswer::Text(s) => Ok(Self::Text(s.clone())),
                RawAnswer::Number(n) => Ok(Self::Text(n.to_string())),
                _ => Err(mismatch()),
            },
            QuestionKind::Sequence | QuestionKind::DragDrop | QuestionKind::HotspotSequence => {
                tokens(raw).map(Self::Ordered).ok_or_else(mismatch)
            }
            QuestionKind::DragDropCategories => match raw {
                RawAnswer::Mapping(map) => Ok(Self::Categories(
                    map.iter()
                        .map(|(item, category)| {
                            (item.trim().to_owned(), category.trim().to_owned())
                        })
                        .collect(),
                )),
                _ => Err(mismatch()),
            },
        }
    }

    /// Persisted form of this answer.
    #[must_use]
    pub fn to_raw(&self) -> RawAnswer {
        match self {
            AnswerValue::Index(i) => RawAnswer::Number(i64::from(*i)),
            AnswerValue::Selection(set) => RawAnswer::list(set.iter().cloned()),
            AnswerValue::Text(s) => RawAnswer::Text(s.clone()),
            AnswerValue::Ordered(items) => RawAnswer::list(items.iter().cloned()),
            AnswerValue::Categories(map) => RawAnswer::Mapping(map.clone()),
        }
    }
}

fn tokens(raw: &RawAnswer) -> Option<Vec<String>> {
    match raw {
        RawAnswer::List(items) => Some(items.iter().map(RawScalar::token).collect()),
        RawAnswer::Text(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect(),
        ),
        RawAnswer::Number(n) => Some(vec![n.to_string()]),
        RawAnswer::Flag(_) | RawAnswer::Mapping(_) => None,
    }
}

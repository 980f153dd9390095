use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Word, WordListId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestResultError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("a test result must reference at least one word list")]
    NoLists,

    #[error("attempt count ({attempts}) does not match total ({total})")]
    AttemptCountMismatch { attempts: usize, total: u32 },

    #[error("score ({score}) does not match correct attempts ({correct})")]
    ScoreMismatch { score: u32, correct: u32 },
}

/// A word queued for one test session, tagged with the list it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWord {
    pub text: String,
    pub source_list_id: WordListId,
}

impl SessionWord {
    #[must_use]
    pub fn from_word(word: &Word, source_list_id: WordListId) -> Self {
        Self {
            text: word.text.clone(),
            source_list_id,
        }
    }
}

/// One graded answer. Field names match the stored JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub word: String,
    pub user_answer: String,
    pub correct: bool,
}

/// Opaque payload stored alongside a score.
///
/// Serializes as a JSON array of attempts, or as `{}` when minimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultDetails {
    Detailed(Vec<AttemptRecord>),
    Minimal {},
}

impl ResultDetails {
    #[must_use]
    pub fn minimal() -> Self {
        Self::Minimal {}
    }

    #[must_use]
    pub fn attempts(&self) -> Option<&[AttemptRecord]> {
        match self {
            Self::Detailed(attempts) => Some(attempts),
            Self::Minimal {} => None,
        }
    }
}

/// Final record of a finished test session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    list_ids: Vec<WordListId>,
    score: u32,
    total: u32,
    details: ResultDetails,
    completed_at: DateTime<Utc>,
}

impl TestResult {
    /// Build a result. List ids are sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError::NoLists` without list ids,
    /// `TestResultError::ScoreExceedsTotal` when `score > total`, and the
    /// mismatch variants when detailed attempts disagree with the counts.
    pub fn new(
        list_ids: impl IntoIterator<Item = WordListId>,
        score: u32,
        total: u32,
        details: ResultDetails,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, TestResultError> {
        let mut list_ids: Vec<_> = list_ids.into_iter().collect();
        list_ids.sort_unstable();
        list_ids.dedup();
        if list_ids.is_empty() {
            return Err(TestResultError::NoLists);
        }
        if score > total {
            return Err(TestResultError::ScoreExceedsTotal { score, total });
        }
        if let Some(attempts) = details.attempts() {
            if u32::try_from(attempts.len()).ok() != Some(total) {
                return Err(TestResultError::AttemptCountMismatch {
                    attempts: attempts.len(),
                    total,
                });
            }
            let correct = attempts.iter().filter(|a| a.correct).count();
            let correct = u32::try_from(correct).unwrap_or(u32::MAX);
            if correct != score {
                return Err(TestResultError::ScoreMismatch { score, correct });
            }
        }

        Ok(Self {
            list_ids,
            score,
            total,
            details,
            completed_at,
        })
    }

    #[must_use]
    pub fn list_ids(&self) -> &[WordListId] {
        &self.list_ids
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn details(&self) -> &ResultDetails {
        &self.details
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

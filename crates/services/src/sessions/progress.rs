use spell_core::grading::Grade;
use spell_core::model::{AttemptRecord, SessionWord};

/// Top-level lifecycle of a test session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    NotStarted,
    InProgress,
    Finished,
}

/// Feedback shown while the dwell timer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { expected: String },
}

impl Feedback {
    pub(crate) fn for_grade(grade: Grade, expected: &str) -> Self {
        match grade {
            Grade::Correct => Self::Correct,
            Grade::Incorrect => Self::Incorrect {
                expected: expected.to_owned(),
            },
        }
    }

    /// Phrase spoken to the learner.
    #[must_use]
    pub fn phrase(&self) -> String {
        match self {
            Self::Correct => "Correct!".to_owned(),
            Self::Incorrect { expected } => format!("Incorrect. The word was {expected}."),
        }
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Mutable state of one session run.
///
/// `position` indexes the word being asked. While ready for input
/// `attempts.len() == position`; while feedback is pending the current word
/// has already been graded so `attempts.len() == position + 1`.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionState {
    pub queue: Vec<SessionWord>,
    pub position: usize,
    pub score: u32,
    pub attempts: Vec<AttemptRecord>,
    pub phase: Phase,
    pub feedback: Option<Feedback>,
}

impl SessionState {
    pub fn begin(queue: Vec<SessionWord>) -> Self {
        Self {
            queue,
            phase: Phase::InProgress,
            ..Self::default()
        }
    }

    pub fn current_word(&self) -> Option<&SessionWord> {
        match self.phase {
            Phase::InProgress => self.queue.get(self.position),
            _ => None,
        }
    }

    pub fn is_feedback_pending(&self) -> bool {
        self.feedback.is_some()
    }

    pub fn is_last_word(&self) -> bool {
        self.position + 1 >= self.queue.len()
    }

    pub fn progress(&self) -> SessionProgress {
        let total = self.queue.len();
        let answered = self.attempts.len();
        SessionProgress {
            phase: self.phase,
            position: self.position,
            total,
            answered,
            remaining: total.saturating_sub(answered),
            score: self.score,
            feedback_pending: self.is_feedback_pending(),
        }
    }
}

/// Snapshot of a session, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: Phase,
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub score: u32,
    pub feedback_pending: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spell_core::model::WordListId;

    #[test]
    fn feedback_phrases() {
        assert_eq!(Feedback::Correct.phrase(), "Correct!");
        let wrong = Feedback::for_grade(Grade::Incorrect, "dog");
        assert_eq!(wrong.phrase(), "Incorrect. The word was dog.");
        assert!(!wrong.is_correct());
    }

    #[test]
    fn fresh_state_reports_progress() {
        let queue = vec![
            SessionWord {
                text: "cat".into(),
                source_list_id: WordListId::new(1),
            },
            SessionWord {
                text: "dog".into(),
                source_list_id: WordListId::new(1),
            },
        ];
        let state = SessionState::begin(queue);
        assert_eq!(state.current_word().unwrap().text, "cat");
        assert!(!state.is_last_word());

        let progress = state.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.remaining, 2);
        assert!(!progress.is_complete());
    }
}

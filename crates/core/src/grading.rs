//! Answer grading for dictation.
//!
//! Exact match only: both sides are trimmed and compared case-insensitively.
//! There is no partial credit and no edit-distance tolerance.

/// Outcome of grading one typed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Correct,
    Incorrect,
}

impl Grade {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Normalized form used for comparison.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Grade `raw` against `expected`.
///
/// Returns `None` when the trimmed answer is empty; blank input is not an attempt.
#[must_use]
pub fn grade(expected: &str, raw: &str) -> Option<Grade> {
    let answer = raw.trim();
    if answer.is_empty() {
        return None;
    }
    if answer.to_lowercase() == normalize(expected) {
        Some(Grade::Correct)
    } else {
        Some(Grade::Incorrect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        assert_eq!(grade("apple", " Apple "), Some(Grade::Correct));
        assert_eq!(grade("Apple", "APPLE"), Some(Grade::Correct));
    }

    #[test]
    fn misspelling_is_incorrect() {
        assert_eq!(grade("apple", "appel"), Some(Grade::Incorrect));
        assert_eq!(grade("apple", "app le"), Some(Grade::Incorrect));
    }

    #[test]
    fn blank_answer_is_not_graded() {
        assert_eq!(grade("apple", "   "), None);
        assert_eq!(grade("apple", ""), None);
    }
}

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::WordListId;
use crate::model::word::Word;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordListError {
    #[error("word list name cannot be empty")]
    EmptyName,

    #[error("word list must contain at least one word")]
    NoWords,

    #[error("word at position {index} is blank")]
    BlankWord { index: usize },
}

/// Split caregiver input on commas, trimming each entry and dropping empties.
///
/// `"cat, dog,,  bird "` becomes `["cat", "dog", "bird"]`.
#[must_use]
pub fn parse_words(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Validated name and words for a list that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListDraft {
    name: String,
    words: Vec<Word>,
}

impl WordListDraft {
    /// # Errors
    ///
    /// Returns `WordListError::EmptyName` for a blank name,
    /// `WordListError::NoWords` if no words are given, and
    /// `WordListError::BlankWord` if any word is blank.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, words: &[S]) -> Result<Self, WordListError> {
        Ok(Self {
            name: validate_name(name.into())?,
            words: fresh_words(words)?,
        })
    }

    /// Parse comma-separated caregiver input.
    ///
    /// # Errors
    ///
    /// See [`WordListDraft::new`].
    pub fn parse(name: impl Into<String>, input: &str) -> Result<Self, WordListError> {
        let words = parse_words(input);
        Self::new(name, words.as_slice())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

//
// ─── WORD LIST ─────────────────────────────────────────────────────────────────
//

/// A caregiver-curated, ordered list of spelling words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    id: WordListId,
    name: String,
    words: Vec<Word>,
    is_active: bool,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl WordList {
    /// Creates a new, inactive list with every word marked not mastered.
    ///
    /// # Errors
    ///
    /// Same validation as [`WordListDraft::new`].
    pub fn new<S: AsRef<str>>(
        id: WordListId,
        name: impl Into<String>,
        words: &[S],
        created_at: DateTime<Utc>,
    ) -> Result<Self, WordListError> {
        Ok(Self::from_draft(id, WordListDraft::new(name, words)?, created_at))
    }

    #[must_use]
    pub fn from_draft(id: WordListId, draft: WordListDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            words: draft.words,
            is_active: false,
            created_at,
            deleted_at: None,
        }
    }

    /// Rehydrate a list from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `WordListError` if the stored name or words are invalid.
    pub fn from_persisted(
        id: WordListId,
        name: String,
        words: Vec<Word>,
        is_active: bool,
        created_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Result<Self, WordListError> {
        let name = validate_name(name)?;
        if words.is_empty() {
            return Err(WordListError::NoWords);
        }
        if let Some(index) = words.iter().position(|w| w.text.trim().is_empty()) {
            return Err(WordListError::BlankWord { index });
        }
        Ok(Self {
            id,
            name,
            words,
            is_active,
            created_at,
            deleted_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> WordListId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Active and not soft-deleted.
    #[must_use]
    pub fn is_available_for_session(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    /// Replace name and words. The draft's words are unmastered, so mastery resets.
    pub fn replace_contents(&mut self, draft: WordListDraft) {
        self.name = draft.name;
        self.words = draft.words;
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Soft delete. The first deletion timestamp wins.
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(at);
        }
    }
}

fn validate_name(name: String) -> Result<String, WordListError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WordListError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

fn fresh_words<S: AsRef<str>>(words: &[S]) -> Result<Vec<Word>, WordListError> {
    if words.is_empty() {
        return Err(WordListError::NoWords);
    }
    words
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let word = Word::new(raw.as_ref());
            if word.text.is_empty() {
                Err(WordListError::BlankWord { index })
            } else {
                Ok(word)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn parse_words_trims_and_drops_empties() {
        assert_eq!(parse_words("cat, dog,,  bird "), vec!["cat", "dog", "bird"]);
        assert!(parse_words(" , ,").is_empty());
    }

    #[test]
    fn draft_parses_comma_separated_input() {
        let draft = WordListDraft::parse("Week 2", "ship, shop ,").unwrap();
        assert_eq!(draft.words().len(), 2);
        assert_eq!(draft.words()[1].text, "shop");

        let err = WordListDraft::parse("Week 2", " , ").unwrap_err();
        assert_eq!(err, WordListError::NoWords);
    }

    #[test]
    fn new_list_is_inactive_and_unmastered() {
        let list = WordList::new(WordListId::new(1), "  Week 1 ", &["cat", " dog "], fixed_now())
            .unwrap();
        assert_eq!(list.name(), "Week 1");
        assert!(!list.is_active());
        assert_eq!(list.words()[1].text, "dog");
        assert!(list.words().iter().all(|w| !w.mastered));
    }

    #[test]
    fn rejects_empty_name_and_words() {
        let err = WordList::new(WordListId::new(1), " ", &["cat"], fixed_now()).unwrap_err();
        assert_eq!(err, WordListError::EmptyName);

        let none: [&str; 0] = [];
        let err = WordList::new(WordListId::new(1), "A", &none, fixed_now()).unwrap_err();
        assert_eq!(err, WordListError::NoWords);

        let err = WordList::new(WordListId::new(1), "A", &["cat", "  "], fixed_now()).unwrap_err();
        assert_eq!(err, WordListError::BlankWord { index: 1 });
    }

    #[test]
    fn replace_contents_resets_mastery() {
        let mut words = vec![Word::new("cat")];
        words[0].mastered = true;
        let mut list = WordList::from_persisted(
            WordListId::new(2),
            "Old".into(),
            words,
            true,
            fixed_now(),
            None,
        )
        .unwrap();

        list.replace_contents(WordListDraft::new("New", &["cat", "dog"]).unwrap());
        assert_eq!(list.name(), "New");
        assert_eq!(list.words().len(), 2);
        assert!(list.words().iter().all(|w| !w.mastered));
        assert!(list.is_active());
    }

    #[test]
    fn deleted_lists_are_not_available() {
        let mut list = WordList::new(WordListId::new(3), "L", &["a"], fixed_now()).unwrap();
        list.set_active(true);
        assert!(list.is_available_for_session());

        list.mark_deleted(fixed_now());
        assert!(list.is_deleted());
        assert!(!list.is_available_for_session());
    }
}

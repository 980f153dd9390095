use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use spell_core::model::{SessionWord, WordList, WordListId};

use crate::error::SessionError;

/// A shuffled queue ready to be quizzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub queue: Vec<SessionWord>,
    /// Distinct source lists, in first-seen order.
    pub list_ids: Vec<WordListId>,
}

/// Pools words from active lists and shuffles them into a session queue.
///
/// Seeded planners produce the same sequence of queues on every run.
#[derive(Debug, Clone)]
pub struct SessionPlanner {
    rng: StdRng,
}

impl Default for SessionPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Concatenate every word of every usable list, then shuffle.
    ///
    /// Inactive or soft-deleted lists are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveList` when the pooled queue is empty.
    pub fn plan(&mut self, lists: &[WordList]) -> Result<SessionPlan, SessionError> {
        let mut queue = Vec::new();
        let mut list_ids = Vec::new();
        for list in lists.iter().filter(|l| l.is_available_for_session()) {
            if list.words().is_empty() {
                continue;
            }
            list_ids.push(list.id());
            queue.extend(
                list.words()
                    .iter()
                    .map(|word| SessionWord::from_word(word, list.id())),
            );
        }

        if queue.is_empty() {
            return Err(SessionError::NoActiveList);
        }

        // Fisher-Yates: uniform over all permutations.
        queue.as_mut_slice().shuffle(&mut self.rng);
        tracing::debug!(words = queue.len(), lists = list_ids.len(), "planned session queue");

        Ok(SessionPlan { queue, list_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spell_core::time::fixed_now;

    fn active_list(id: u64, words: &[&str]) -> WordList {
        let mut list = WordList::new(WordListId::new(id), format!("List {id}"), words, fixed_now())
            .unwrap();
        list.set_active(true);
        list
    }

    fn texts(plan: &SessionPlan) -> Vec<String> {
        plan.queue.iter().map(|w| w.text.clone()).collect()
    }

    #[test]
    fn plan_is_a_permutation_of_all_words() {
        let lists = vec![
            active_list(1, &["cat", "dog", "cat"]),
            active_list(2, &["ship", "shop"]),
        ];
        let plan = SessionPlanner::with_seed(7).plan(&lists).unwrap();

        let mut got = texts(&plan);
        got.sort();
        assert_eq!(got, vec!["cat", "cat", "dog", "ship", "shop"]);
        assert_eq!(plan.list_ids, vec![WordListId::new(1), WordListId::new(2)]);
    }

    #[test]
    fn words_keep_their_source_list() {
        let lists = vec![active_list(1, &["cat"]), active_list(2, &["ship"])];
        let plan = SessionPlanner::with_seed(1).plan(&lists).unwrap();
        for word in &plan.queue {
            let expected = if word.text == "cat" { 1 } else { 2 };
            assert_eq!(word.source_list_id, WordListId::new(expected));
        }
    }

    #[test]
    fn same_seed_gives_same_queue() {
        let lists = vec![active_list(1, &["a", "b", "c", "d", "e", "f", "g", "h"])];
        let first = SessionPlanner::with_seed(42).plan(&lists).unwrap();
        let second = SessionPlanner::with_seed(42).plan(&lists).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_word_is_unchanged() {
        let lists = vec![active_list(1, &["only"])];
        let plan = SessionPlanner::new().plan(&lists).unwrap();
        assert_eq!(texts(&plan), vec!["only"]);
    }

    #[test]
    fn empty_or_inactive_pool_is_an_error() {
        let err = SessionPlanner::new().plan(&[]).unwrap_err();
        assert!(matches!(err, SessionError::NoActiveList));

        let mut inactive = active_list(1, &["cat"]);
        inactive.set_active(false);
        let err = SessionPlanner::new().plan(&[inactive]).unwrap_err();
        assert!(matches!(err, SessionError::NoActiveList));
    }
}

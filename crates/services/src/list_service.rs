use std::sync::Arc;

use spell_core::model::{WordList, WordListDraft, WordListId};
use storage::repository::{StorageError, TestResultRepository, TestResultRow, WordListRepository};

use crate::Clock;
use crate::error::ListServiceError;

/// Caregiver-facing word list management.
#[derive(Clone)]
pub struct ListService {
    clock: Clock,
    lists: Arc<dyn WordListRepository>,
    results: Arc<dyn TestResultRepository>,
}

impl ListService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lists: Arc<dyn WordListRepository>,
        results: Arc<dyn TestResultRepository>,
    ) -> Self {
        Self {
            clock,
            lists,
            results,
        }
    }

    /// Create an inactive list from comma-separated words.
    ///
    /// # Errors
    ///
    /// Returns `ListServiceError::WordList` for an empty name or no words.
    /// Returns `ListServiceError::Storage` if persistence fails.
    pub async fn create_list(
        &self,
        name: &str,
        words: &str,
    ) -> Result<WordListId, ListServiceError> {
        let draft = WordListDraft::parse(name, words)?;
        let id = self.lists.insert_new_list(&draft, self.clock.now()).await?;
        tracing::info!(list_id = %id, words = draft.words().len(), "word list created");
        Ok(id)
    }

    /// Replace a list's name and words. Every word starts unmastered again.
    ///
    /// # Errors
    ///
    /// Returns `ListServiceError::WordList` if validation fails.
    /// Returns `ListServiceError::Storage` if the list is gone or persistence fails.
    pub async fn update_list(
        &self,
        id: WordListId,
        name: &str,
        words: &str,
    ) -> Result<WordList, ListServiceError> {
        let draft = WordListDraft::parse(name, words)?;
        let list = self.lists.update_list(id, &draft).await?;
        tracing::info!(list_id = %id, "word list updated");
        Ok(list)
    }

    /// # Errors
    ///
    /// Returns `ListServiceError::Storage` if the list is gone or persistence fails.
    pub async fn set_active(
        &self,
        id: WordListId,
        active: bool,
    ) -> Result<WordList, ListServiceError> {
        let list = self.lists.set_active(id, active).await?;
        tracing::info!(list_id = %id, active, "word list activation changed");
        Ok(list)
    }

    /// Soft delete a list. Its past results stay readable.
    ///
    /// # Errors
    ///
    /// Returns `ListServiceError::Storage` if the list is missing or persistence fails.
    pub async fn delete_list(&self, id: WordListId) -> Result<(), ListServiceError> {
        self.lists.soft_delete(id, self.clock.now()).await?;
        tracing::info!(list_id = %id, "word list deleted");
        Ok(())
    }

    /// Fetch a live list by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) for missing or deleted lists.
    pub async fn get_list(&self, id: WordListId) -> Result<WordList, ListServiceError> {
        let list = self
            .lists
            .get_list(id)
            .await?
            .filter(|list| !list.is_deleted())
            .ok_or(StorageError::NotFound)?;
        Ok(list)
    }

    /// All non-deleted lists, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ListServiceError::Storage` if repository access fails.
    pub async fn list_lists(&self) -> Result<Vec<WordList>, ListServiceError> {
        Ok(self.lists.list_lists().await?)
    }

    /// # Errors
    ///
    /// Returns `ListServiceError::Storage` if repository access fails.
    pub async fn get_active_lists(&self) -> Result<Vec<WordList>, ListServiceError> {
        Ok(self.lists.get_active_lists().await?)
    }

    /// Recent results for sessions that included `id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ListServiceError::Storage` if repository access fails.
    pub async fn results_for_list(
        &self,
        id: WordListId,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, ListServiceError> {
        Ok(self.results.list_results_for_list(id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use spell_core::model::{ResultDetails, TestResult, WordListError};
    use spell_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service_at(clock: Clock) -> (ListService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let service = ListService::new(clock, Arc::new(repo.clone()), Arc::new(repo.clone()));
        (service, repo)
    }

    #[tokio::test]
    async fn create_parses_words_and_starts_inactive() {
        let (service, _) = service_at(fixed_clock());
        let id = service.create_list("Week 1", "cat, dog,, hen ").await.unwrap();

        let list = service.get_list(id).await.unwrap();
        let words: Vec<_> = list.words().iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, vec!["cat", "dog", "hen"]);
        assert!(!list.is_active());
        assert_eq!(list.created_at(), fixed_now());
        assert!(service.get_active_lists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_blank_input() {
        let (service, _) = service_at(fixed_clock());
        let err = service.create_list("  ", "cat").await.unwrap_err();
        assert!(matches!(err, ListServiceError::WordList(WordListError::EmptyName)));

        let err = service.create_list("Week 1", " , ").await.unwrap_err();
        assert!(matches!(err, ListServiceError::WordList(WordListError::NoWords)));
    }

    #[tokio::test]
    async fn activation_and_deletion_shape_the_active_set() {
        let (earlier, repo) = service_at(fixed_clock());
        let older = earlier.create_list("Older", "cat").await.unwrap();

        let mut clock = fixed_clock();
        clock.advance(Duration::minutes(1));
        let service = ListService::new(clock, Arc::new(repo.clone()), Arc::new(repo));
        let newer = service.create_list("Newer", "dog").await.unwrap();

        service.set_active(older, true).await.unwrap();
        service.set_active(newer, true).await.unwrap();
        let active: Vec<_> = service
            .get_active_lists()
            .await
            .unwrap()
            .iter()
            .map(WordList::id)
            .collect();
        assert_eq!(active, vec![newer, older]);

        service.delete_list(newer).await.unwrap();
        let active = service.get_active_lists().await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(matches!(
            service.get_list(newer).await,
            Err(ListServiceError::Storage(StorageError::NotFound))
        ));
        assert!(service.set_active(newer, false).await.is_err());
    }

    #[tokio::test]
    async fn results_are_listed_per_list() {
        let (service, repo) = service_at(fixed_clock());
        let id = service.create_list("Week 1", "cat, dog").await.unwrap();
        let result = TestResult::new([id], 1, 2, ResultDetails::minimal(), fixed_now()).unwrap();
        repo.append_result(&result).await.unwrap();

        let rows = service.results_for_list(id, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].result, result);
    }
}

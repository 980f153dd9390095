use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spell_core::model::{TestResult, TestResultId, WordList, WordListDraft, WordListId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored test result together with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResultRow {
    pub id: TestResultId,
    pub result: TestResult,
}

impl TestResultRow {
    #[must_use]
    pub fn new(id: TestResultId, result: TestResult) -> Self {
        Self { id, result }
    }
}

/// Repository contract for caregiver word lists.
///
/// Deleted lists are soft-deleted: they stay in storage with `deleted_at` set
/// and are hidden from every listing.
#[async_trait]
pub trait WordListRepository: Send + Sync {
    /// Insert a new, inactive list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be stored.
    async fn insert_new_list(
        &self,
        draft: &WordListDraft,
        created_at: DateTime<Utc>,
    ) -> Result<WordListId, StorageError>;

    /// Fetch a list by id, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn get_list(&self, id: WordListId) -> Result<Option<WordList>, StorageError>;

    /// All non-deleted lists, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_lists(&self) -> Result<Vec<WordList>, StorageError>;

    /// Active, non-deleted lists, newest first. An empty result is valid.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn get_active_lists(&self) -> Result<Vec<WordList>, StorageError>;

    /// Replace a list's name and words, resetting mastery.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the list is missing or deleted.
    async fn update_list(
        &self,
        id: WordListId,
        draft: &WordListDraft,
    ) -> Result<WordList, StorageError>;

    /// Toggle whether a list takes part in the next session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the list is missing or deleted.
    async fn set_active(&self, id: WordListId, active: bool) -> Result<WordList, StorageError>;

    /// Soft delete a list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the list is missing.
    async fn soft_delete(&self, id: WordListId, at: DateTime<Utc>) -> Result<(), StorageError>;
}

/// Repository contract for finished test results.
#[async_trait]
pub trait TestResultRepository: Send + Sync {
    /// Store a result and link it to every list it touched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &TestResult) -> Result<TestResultId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_result(&self, id: TestResultId) -> Result<TestResult, StorageError>;

    /// Results that touched `list_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_results_for_list(
        &self,
        list_id: WordListId,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, StorageError>;
}

fn newest_first(lists: &mut [WordList]) {
    lists.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
}

#[derive(Default)]
struct MemoryState {
    lists: BTreeMap<WordListId, WordList>,
    results: Vec<TestResultRow>,
    next_list_id: u64,
    next_result_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut MemoryState) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        f(&mut guard)
    }

    fn live_list_mut(
        state: &mut MemoryState,
        id: WordListId,
    ) -> Result<&mut WordList, StorageError> {
        match state.lists.get_mut(&id) {
            Some(list) if !list.is_deleted() => Ok(list),
            _ => Err(StorageError::NotFound),
        }
    }
}

#[async_trait]
impl WordListRepository for InMemoryRepository {
    async fn insert_new_list(
        &self,
        draft: &WordListDraft,
        created_at: DateTime<Utc>,
    ) -> Result<WordListId, StorageError> {
        self.with_state(|state| {
            state.next_list_id += 1;
            let id = WordListId::new(state.next_list_id);
            state
                .lists
                .insert(id, WordList::from_draft(id, draft.clone(), created_at));
            Ok(id)
        })
    }

    async fn get_list(&self, id: WordListId) -> Result<Option<WordList>, StorageError> {
        self.with_state(|state| Ok(state.lists.get(&id).cloned()))
    }

    async fn list_lists(&self) -> Result<Vec<WordList>, StorageError> {
        self.with_state(|state| {
            let mut lists: Vec<_> = state
                .lists
                .values()
                .filter(|l| !l.is_deleted())
                .cloned()
                .collect();
            newest_first(&mut lists);
            Ok(lists)
        })
    }

    async fn get_active_lists(&self) -> Result<Vec<WordList>, StorageError> {
        self.with_state(|state| {
            let mut lists: Vec<_> = state
                .lists
                .values()
                .filter(|l| l.is_available_for_session())
                .cloned()
                .collect();
            newest_first(&mut lists);
            Ok(lists)
        })
    }

    async fn update_list(
        &self,
        id: WordListId,
        draft: &WordListDraft,
    ) -> Result<WordList, StorageError> {
        self.with_state(|state| {
            let list = Self::live_list_mut(state, id)?;
            list.replace_contents(draft.clone());
            Ok(list.clone())
        })
    }

    async fn set_active(&self, id: WordListId, active: bool) -> Result<WordList, StorageError> {
        self.with_state(|state| {
            let list = Self::live_list_mut(state, id)?;
            list.set_active(active);
            Ok(list.clone())
        })
    }

    async fn soft_delete(&self, id: WordListId, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.with_state(|state| {
            let list = state.lists.get_mut(&id).ok_or(StorageError::NotFound)?;
            list.mark_deleted(at);
            Ok(())
        })
    }
}

#[async_trait]
impl TestResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &TestResult) -> Result<TestResultId, StorageError> {
        self.with_state(|state| {
            state.next_result_id += 1;
            let id = TestResultId::new(state.next_result_id);
            state.results.push(TestResultRow::new(id, result.clone()));
            Ok(id)
        })
    }

    async fn get_result(&self, id: TestResultId) -> Result<TestResult, StorageError> {
        self.with_state(|state| {
            state
                .results
                .iter()
                .find(|row| row.id == id)
                .map(|row| row.result.clone())
                .ok_or(StorageError::NotFound)
        })
    }

    async fn list_results_for_list(
        &self,
        list_id: WordListId,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, StorageError> {
        self.with_state(|state| {
            let mut rows: Vec<_> = state
                .results
                .iter()
                .filter(|row| row.result.list_ids().contains(&list_id))
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                b.result
                    .completed_at()
                    .cmp(&a.result.completed_at())
                    .then_with(|| b.id.cmp(&a.id))
            });
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(rows)
        })
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lists: Arc<dyn WordListRepository>,
    pub results: Arc<dyn TestResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let lists: Arc<dyn WordListRepository> = Arc::new(repo.clone());
        let results: Arc<dyn TestResultRepository> = Arc::new(repo);
        Self { lists, results }
    }
}

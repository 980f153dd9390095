//! Shared error types for the services crate.

use thiserror::Error;

use spell_core::model::{TestResultError, WordListError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the test session controller and loader.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// No active list, or the active lists hold no words.
    #[error("no active word list found")]
    NoActiveList,
    #[error("session is not in progress")]
    NotInProgress,
    #[error("session already in progress")]
    AlreadyInProgress,
    #[error(transparent)]
    Result(#[from] TestResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure to record a finished session. Logged, never shown to the learner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("no async runtime available to record the result")]
    NoRuntime,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ListService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ListServiceError {
    #[error(transparent)]
    WordList(#[from] WordListError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

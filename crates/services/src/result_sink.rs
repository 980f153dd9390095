use std::sync::Arc;

use async_trait::async_trait;
use spell_core::model::{TestResult, TestResultId};
use storage::repository::TestResultRepository;

use crate::error::PersistenceError;

/// Durable destination for finished session scores.
///
/// Sessions call this without awaiting the outcome; failures are logged only.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// # Errors
    ///
    /// Returns `PersistenceError` when the result could not be stored.
    async fn record_result(&self, result: &TestResult) -> Result<TestResultId, PersistenceError>;
}

/// Writes results through a `TestResultRepository`.
#[derive(Clone)]
pub struct StorageResultSink {
    results: Arc<dyn TestResultRepository>,
}

impl StorageResultSink {
    #[must_use]
    pub fn new(results: Arc<dyn TestResultRepository>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl ResultSink for StorageResultSink {
    async fn record_result(&self, result: &TestResult) -> Result<TestResultId, PersistenceError> {
        let id = self.results.append_result(result).await?;
        tracing::info!(
            result_id = %id,
            score = result.score(),
            total = result.total(),
            "test result saved"
        );
        Ok(id)
    }
}

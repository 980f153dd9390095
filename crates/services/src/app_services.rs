use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::list_service::ListService;
use crate::result_sink::{ResultSink, StorageResultSink};
use crate::sessions::{SessionConfig, SessionLoader};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    lists: Arc<ListService>,
    sessions: Arc<SessionLoader>,
    results: Arc<dyn ResultSink>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: SessionConfig,
        seed: Option<u64>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, config, seed))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, config: SessionConfig) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, config, None)
    }

    fn from_storage(
        storage: &Storage,
        clock: Clock,
        config: SessionConfig,
        seed: Option<u64>,
    ) -> Self {
        let lists = Arc::new(ListService::new(
            clock,
            Arc::clone(&storage.lists),
            Arc::clone(&storage.results),
        ));
        let mut loader = SessionLoader::new(clock, Arc::clone(&storage.lists)).with_config(config);
        if let Some(seed) = seed {
            loader = loader.with_seed(seed);
        }
        let results: Arc<dyn ResultSink> =
            Arc::new(StorageResultSink::new(Arc::clone(&storage.results)));

        Self {
            lists,
            sessions: Arc::new(loader),
            results,
        }
    }

    #[must_use]
    pub fn lists(&self) -> Arc<ListService> {
        Arc::clone(&self.lists)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionLoader> {
        Arc::clone(&self.sessions)
    }

    /// Sink that writes finished sessions to the same storage.
    #[must_use]
    pub fn result_sink(&self) -> Arc<dyn ResultSink> {
        Arc::clone(&self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::SessionDeps;
    use crate::speech::SilentSpeech;
    use crate::timer::ManualScheduler;
    use crate::SessionError;
    use spell_core::time::fixed_clock;

    #[tokio::test]
    async fn in_memory_services_share_storage() {
        let services = AppServices::in_memory(fixed_clock(), SessionConfig::default());
        let deps = SessionDeps {
            speech: Arc::new(SilentSpeech),
            scheduler: Arc::new(ManualScheduler::new()),
            sink: services.result_sink(),
        };

        let err = services.sessions().load(deps.clone()).await.unwrap_err();
        assert!(matches!(err, SessionError::NoActiveList));

        let lists = services.lists();
        let id = lists.create_list("Week 1", "cat, dog").await.unwrap();
        lists.set_active(id, true).await.unwrap();

        let controller = services.sessions().load(deps).await.unwrap();
        assert_eq!(controller.progress().total, 2);
    }
}

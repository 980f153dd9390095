use std::sync::Arc;

use storage::repository::WordListRepository;

use super::config::SessionConfig;
use super::controller::{SessionDeps, TestSessionController};
use super::plan::SessionPlanner;
use crate::Clock;
use crate::error::SessionError;

/// Loads the active lists and prepares a session over them.
#[derive(Clone)]
pub struct SessionLoader {
    clock: Clock,
    lists: Arc<dyn WordListRepository>,
    config: SessionConfig,
    seed: Option<u64>,
}

impl SessionLoader {
    #[must_use]
    pub fn new(clock: Clock, lists: Arc<dyn WordListRepository>) -> Self {
        Self {
            clock,
            lists,
            config: SessionConfig::default(),
            seed: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the shuffle so every load produces the same sequence of queues.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fetch active lists, newest first, and prepare a not-yet-started session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveList` when there is nothing to practise,
    /// or `SessionError::Storage` when the lists cannot be read.
    pub async fn load(&self, deps: SessionDeps) -> Result<TestSessionController, SessionError> {
        let lists = self.lists.get_active_lists().await?;
        tracing::debug!(lists = lists.len(), "loaded active word lists");
        let planner = self
            .seed
            .map_or_else(SessionPlanner::new, SessionPlanner::with_seed);
        TestSessionController::prepare(lists, self.config.clone(), self.clock, planner, deps)
    }
}

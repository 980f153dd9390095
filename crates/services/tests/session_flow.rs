use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use services::speech::RecordingSpeech;
use services::{
    Clock, DwellOutcome, ListService, ManualScheduler, PersistenceError, Phase, ResultSink,
    SessionConfig, SessionDeps, SessionError, SessionLoader, SessionPlanner, StorageResultSink,
    SubmitOutcome, TokioScheduler,
};
use spell_core::model::{TestResult, TestResultId, WordListId};
use spell_core::time::fixed_now;
use storage::repository::{InMemoryRepository, StorageError, TestResultRepository};

struct Fixture {
    repo: InMemoryRepository,
    lists: ListService,
    speech: Arc<RecordingSpeech>,
    scheduler: ManualScheduler,
}

impl Fixture {
    fn new() -> Self {
        let repo = InMemoryRepository::new();
        let lists = ListService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        Self {
            repo,
            lists,
            speech: Arc::new(RecordingSpeech::new()),
            scheduler: ManualScheduler::new(),
        }
    }

    async fn active_list(&self, name: &str, words: &str) -> WordListId {
        let id = self.lists.create_list(name, words).await.unwrap();
        self.lists.set_active(id, true).await.unwrap();
        id
    }

    fn loader(&self) -> SessionLoader {
        SessionLoader::new(Clock::fixed(fixed_now()), Arc::new(self.repo.clone())).with_seed(11)
    }

    fn deps(&self, sink: Arc<dyn ResultSink>) -> SessionDeps {
        SessionDeps {
            speech: self.speech.clone(),
            scheduler: Arc::new(self.scheduler.clone()),
            sink,
        }
    }

    fn storage_sink(&self) -> Arc<dyn ResultSink> {
        Arc::new(StorageResultSink::new(Arc::new(self.repo.clone())))
    }
}

struct FailingSink {
    calls: Mutex<u32>,
}

#[async_trait]
impl ResultSink for FailingSink {
    async fn record_result(&self, _result: &TestResult) -> Result<TestResultId, PersistenceError> {
        *self.calls.lock().unwrap() += 1;
        Err(StorageError::Connection("backend offline".into()).into())
    }
}

#[tokio::test]
async fn cat_and_dog_end_to_end() {
    let fx = Fixture::new();
    let list_id = fx.active_list("Pets", "cat, dog").await;
    let active = fx.lists.get_active_lists().await.unwrap();
    let seeded: Vec<String> = SessionPlanner::with_seed(11)
        .plan(&active)
        .unwrap()
        .queue
        .into_iter()
        .map(|w| w.text)
        .collect();
    let mut session = fx.loader().load(fx.deps(fx.storage_sink())).await.unwrap();
    assert_eq!(session.queue(), seeded);

    // Same seed, same order, on every load.
    let again = fx.loader().load(fx.deps(fx.storage_sink())).await.unwrap();
    assert_eq!(again.queue(), session.queue());
    drop(again);

    session.start().unwrap();
    let first = seeded[0].clone();
    assert_eq!(session.current_word(), Some(first.as_str()));
    assert_eq!(fx.speech.last_spoken(), Some(first.clone()));

    let SubmitOutcome::Graded(attempt) = session.submit_answer(&first.to_uppercase()).unwrap()
    else {
        panic!("first answer should be graded");
    };
    assert!(attempt.correct);
    assert_eq!(session.score(), 1);

    let token = fx.scheduler.fire_next().unwrap();
    assert_eq!(
        session.on_dwell_elapsed(token).unwrap(),
        DwellOutcome::Advanced { position: 1 }
    );

    assert_eq!(session.current_word(), Some(seeded[1].as_str()));
    let SubmitOutcome::Graded(attempt) = session.submit_answer("hippo").unwrap() else {
        panic!("second answer should be graded");
    };
    assert!(!attempt.correct);
    assert_eq!(session.score(), 1);

    let token = fx.scheduler.fire_next().unwrap();
    let DwellOutcome::Finished(result) = session.on_dwell_elapsed(token).unwrap() else {
        panic!("session should finish after the last word");
    };
    assert_eq!(session.phase(), Phase::Finished);
    assert_eq!((result.score(), result.total()), (1, 2));

    session.take_pending_save().unwrap().await.unwrap();
    let rows = fx.repo.list_results_for_list(list_id, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].result, result);
}

#[tokio::test]
async fn no_active_lists_means_no_session() {
    let fx = Fixture::new();
    fx.lists.create_list("Inactive", "cat").await.unwrap();

    let err = fx.loader().load(fx.deps(fx.storage_sink())).await.unwrap_err();
    assert!(matches!(err, SessionError::NoActiveList));
    assert!(fx.speech.spoken().is_empty());
}

#[tokio::test]
async fn multi_list_result_names_every_source_list() {
    let fx = Fixture::new();
    let a = fx.active_list("A", "cat").await;
    let b = fx.active_list("B", "dog, hen").await;
    let mut session = fx.loader().load(fx.deps(fx.storage_sink())).await.unwrap();
    session.start().unwrap();

    let result = loop {
        let word = session.current_word().unwrap().to_owned();
        session.submit_answer(&word).unwrap();
        if let DwellOutcome::Finished(result) = session
            .on_dwell_elapsed(fx.scheduler.fire_next().unwrap())
            .unwrap()
        {
            break result;
        }
    };
    assert_eq!(result.list_ids(), &[a, b]);
    assert_eq!(result.score(), 3);

    session.take_pending_save().unwrap().await.unwrap();
    assert_eq!(fx.repo.list_results_for_list(a, 10).await.unwrap().len(), 1);
    assert_eq!(fx.repo.list_results_for_list(b, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn persistence_failure_is_swallowed() {
    let fx = Fixture::new();
    fx.active_list("Pets", "cat").await;
    let sink = Arc::new(FailingSink {
        calls: Mutex::new(0),
    });
    let mut session = fx.loader().load(fx.deps(sink.clone())).await.unwrap();

    session.start().unwrap();
    session.submit_answer("cat").unwrap();
    let outcome = session
        .on_dwell_elapsed(fx.scheduler.fire_next().unwrap())
        .unwrap();
    assert!(matches!(outcome, DwellOutcome::Finished(_)));

    session.take_pending_save().unwrap().await.unwrap();
    assert_eq!(*sink.calls.lock().unwrap(), 1);
    assert_eq!(session.phase(), Phase::Finished);
    assert_eq!(session.progress().score, 1);
}

#[tokio::test]
async fn stale_timer_after_restart_does_not_advance() {
    let fx = Fixture::new();
    fx.active_list("Pets", "cat, dog, hen").await;
    let mut session = fx.loader().load(fx.deps(fx.storage_sink())).await.unwrap();
    session.start().unwrap();
    session.submit_answer("zebra").unwrap();

    // Simulate a timer that already fired before restart could cancel it.
    let late = fx.scheduler.fire_next().unwrap();
    session.restart().unwrap();

    assert_eq!(session.on_dwell_elapsed(late).unwrap(), DwellOutcome::Stale);
    let progress = session.progress();
    assert_eq!(progress.position, 0);
    assert_eq!(progress.answered, 0);
    assert_eq!(progress.score, 0);
    assert!(!progress.feedback_pending);
}

#[tokio::test(start_paused = true)]
async fn real_timers_drive_the_session() {
    let fx = Fixture::new();
    fx.active_list("Pets", "cat, dog").await;
    let (scheduler, mut dwell_rx) = TokioScheduler::new();
    let deps = SessionDeps {
        speech: fx.speech.clone(),
        scheduler: Arc::new(scheduler),
        sink: fx.storage_sink(),
    };
    let loader = fx
        .loader()
        .with_config(SessionConfig::default().with_dwell(Duration::from_millis(2500)));
    let mut session = loader.load(deps).await.unwrap();
    session.start().unwrap();

    for _ in 0..2 {
        let word = session.current_word().unwrap().to_owned();
        session.submit_answer(&word).unwrap();
        let token = dwell_rx.recv().await.unwrap();
        session.on_dwell_elapsed(token).unwrap();
    }
    assert_eq!(session.phase(), Phase::Finished);
    assert_eq!(session.last_result().map(TestResult::score), Some(2));
}

#[tokio::test]
async fn speech_outage_does_not_block_grading() {
    let fx = Fixture::new();
    fx.active_list("Pets", "cat").await;
    fx.speech.set_unavailable(true);
    let mut session = fx.loader().load(fx.deps(fx.storage_sink())).await.unwrap();

    session.start().unwrap();
    assert!(session.speech_degraded());
    assert!(session.replay_current_word());
    assert!(fx.speech.spoken().is_empty());

    session.submit_answer("cat").unwrap();
    let outcome = session
        .on_dwell_elapsed(fx.scheduler.fire_next().unwrap())
        .unwrap();
    assert!(matches!(outcome, DwellOutcome::Finished(_)));
}

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use spell_core::grading;
use spell_core::model::{
    AttemptRecord, ResultDetails, SessionWord, TestResult, WordList, WordListId,
};

use super::config::{ResultDetailsMode, SessionConfig};
use super::plan::SessionPlanner;
use super::progress::{Feedback, Phase, SessionProgress, SessionState};
use crate::Clock;
use crate::error::{PersistenceError, SessionError};
use crate::result_sink::ResultSink;
use crate::speech::{SpeechOutput, Voice};
use crate::timer::{DwellScheduler, DwellToken, TimerHandle};

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Why a submission did not count as an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// The answer was empty after trimming.
    BlankAnswer,
    /// Feedback for the previous answer is still showing.
    FeedbackPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Graded(AttemptRecord),
    Ignored(IgnoredReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DwellOutcome {
    /// The token belongs to a cancelled or superseded dwell.
    Stale,
    /// Moved on to the word at `position`.
    Advanced { position: usize },
    Finished(TestResult),
}

/// Collaborators a session talks to.
#[derive(Clone)]
pub struct SessionDeps {
    pub speech: Arc<dyn SpeechOutput>,
    pub scheduler: Arc<dyn DwellScheduler>,
    pub sink: Arc<dyn ResultSink>,
}

struct PendingDwell {
    token: DwellToken,
    handle: Box<dyn TimerHandle>,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one spelling test from a shuffled queue to a recorded score.
///
/// The controller is not `Sync`; every call happens on the driver's event
/// loop. Dwell timers report back through [`DwellToken`]s handed to
/// [`TestSessionController::on_dwell_elapsed`].
pub struct TestSessionController {
    config: SessionConfig,
    clock: Clock,
    planner: SessionPlanner,
    lists: Vec<WordList>,
    state: SessionState,
    deps: SessionDeps,
    generation: u64,
    pending: Option<PendingDwell>,
    pending_save: Option<JoinHandle<()>>,
    last_result: Option<TestResult>,
    speech_degraded: bool,
}

impl TestSessionController {
    /// Pool and shuffle the words of `lists` into a ready, not yet started session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveList` when no usable list contributes a word.
    pub fn prepare(
        lists: Vec<WordList>,
        config: SessionConfig,
        clock: Clock,
        mut planner: SessionPlanner,
        deps: SessionDeps,
    ) -> Result<Self, SessionError> {
        let plan = planner.plan(&lists)?;
        tracing::debug!(
            words = plan.queue.len(),
            lists = plan.list_ids.len(),
            "session prepared"
        );
        Ok(Self {
            config,
            clock,
            planner,
            lists,
            state: SessionState {
                queue: plan.queue,
                ..SessionState::default()
            },
            deps,
            generation: 0,
            pending: None,
            pending_save: None,
            last_result: None,
            speech_degraded: false,
        })
    }

    /// Begin asking words.
    ///
    /// From `Finished` (or after teardown) the queue is reshuffled first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyInProgress` if a run is active, or
    /// `SessionError::NoActiveList` if reshuffling found no words.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state.phase == Phase::InProgress {
            return Err(SessionError::AlreadyInProgress);
        }
        let queue = if self.state.phase == Phase::NotStarted && !self.state.queue.is_empty() {
            std::mem::take(&mut self.state.queue)
        } else {
            self.planner.plan(&self.lists)?.queue
        };
        self.begin(queue);
        Ok(())
    }

    /// Abandon whatever is in flight and start over with a fresh shuffle.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveList` if reshuffling found no words.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.cancel_in_flight();
        let plan = self.planner.plan(&self.lists)?;
        tracing::info!("session restarted");
        self.begin(plan.queue);
        Ok(())
    }

    /// Grade a typed answer against the current word.
    ///
    /// Blank answers and answers given while feedback is pending are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside an active run.
    pub fn submit_answer(&mut self, raw: &str) -> Result<SubmitOutcome, SessionError> {
        if self.state.phase != Phase::InProgress {
            return Err(SessionError::NotInProgress);
        }
        if self.state.is_feedback_pending() {
            return Ok(SubmitOutcome::Ignored(IgnoredReason::FeedbackPending));
        }
        let Some(word) = self.state.current_word().cloned() else {
            return Err(SessionError::NotInProgress);
        };
        let Some(grade) = grading::grade(&word.text, raw) else {
            return Ok(SubmitOutcome::Ignored(IgnoredReason::BlankAnswer));
        };

        let record = AttemptRecord {
            word: word.text.clone(),
            user_answer: raw.trim().to_owned(),
            correct: grade.is_correct(),
        };
        self.state.attempts.push(record.clone());
        if grade.is_correct() {
            self.state.score += 1;
        }
        let feedback = Feedback::for_grade(grade, &word.text);
        tracing::debug!(
            position = self.state.position,
            correct = record.correct,
            score = self.state.score,
            "answer graded"
        );
        self.say(&feedback.phrase());
        self.state.feedback = Some(feedback);

        let token = DwellToken {
            generation: self.generation,
            position: self.state.position,
        };
        let handle = self.deps.scheduler.schedule(self.config.dwell(), token);
        self.pending = Some(PendingDwell { token, handle });

        Ok(SubmitOutcome::Graded(record))
    }

    /// Handle an elapsed dwell timer: advance, or finish after the last word.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Result` if the final result fails validation.
    pub fn on_dwell_elapsed(&mut self, token: DwellToken) -> Result<DwellOutcome, SessionError> {
        let matches = self.pending.as_ref().is_some_and(|p| p.token == token);
        if !matches || self.state.phase != Phase::InProgress {
            tracing::debug!(?token, "ignoring stale dwell");
            return Ok(DwellOutcome::Stale);
        }
        self.pending = None;
        self.state.feedback = None;

        if self.state.is_last_word() {
            let result = self.finish()?;
            return Ok(DwellOutcome::Finished(result));
        }

        self.state.position += 1;
        self.speak_current_word();
        Ok(DwellOutcome::Advanced {
            position: self.state.position,
        })
    }

    /// Speak the current word again. Returns whether anything was spoken.
    pub fn replay_current_word(&mut self) -> bool {
        if self.state.is_feedback_pending() && !self.config.replay_during_feedback() {
            return false;
        }
        let Some(text) = self.state.current_word().map(|w| w.text.clone()) else {
            return false;
        };
        self.say(&text);
        true
    }

    /// Advance the speech engine to its next voice for the rest of the process.
    pub fn cycle_voice(&mut self) -> Option<Voice> {
        let voice = self.deps.speech.cycle_voice();
        if let Some(voice) = &voice {
            tracing::info!(voice = %voice.name, "voice changed");
        }
        voice
    }

    /// Cancel timers and speech and drop the current run.
    ///
    /// A later `start` reshuffles. A result already handed to the sink is
    /// still allowed to complete.
    pub fn teardown(&mut self) {
        self.cancel_in_flight();
        self.state = SessionState::default();
        tracing::debug!("session torn down");
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        self.state.progress()
    }

    #[must_use]
    pub fn current_word(&self) -> Option<&str> {
        self.state.current_word().map(|w| w.text.as_str())
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.state.feedback.as_ref()
    }

    #[must_use]
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.state.attempts
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.state.score
    }

    /// Words of the current run, in asking order.
    #[must_use]
    pub fn queue(&self) -> Vec<&str> {
        self.state.queue.iter().map(|w| w.text.as_str()).collect()
    }

    #[must_use]
    pub fn lists(&self) -> &[WordList] {
        &self.lists
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Result of the most recently finished run.
    #[must_use]
    pub fn last_result(&self) -> Option<&TestResult> {
        self.last_result.as_ref()
    }

    /// Whether speech has failed at least once this session.
    #[must_use]
    pub fn speech_degraded(&self) -> bool {
        self.speech_degraded
    }

    /// Background save started by the last finish, if any. Await it to
    /// observe completion; the session does not.
    pub fn take_pending_save(&mut self) -> Option<JoinHandle<()>> {
        self.pending_save.take()
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn begin(&mut self, queue: Vec<SessionWord>) {
        self.generation += 1;
        self.state = SessionState::begin(queue);
        tracing::info!(
            generation = self.generation,
            words = self.state.queue.len(),
            "session started"
        );
        self.speak_current_word();
    }

    fn finish(&mut self) -> Result<TestResult, SessionError> {
        self.state.phase = Phase::Finished;
        let details = match self.config.details() {
            ResultDetailsMode::Detailed => ResultDetails::Detailed(self.state.attempts.clone()),
            ResultDetailsMode::Minimal => ResultDetails::minimal(),
        };
        let total = u32::try_from(self.state.queue.len()).unwrap_or(u32::MAX);
        let result = TestResult::new(
            self.touched_list_ids(),
            self.state.score,
            total,
            details,
            self.clock.now(),
        )?;
        tracing::info!(score = result.score(), total = result.total(), "session finished");

        self.persist(result.clone());
        self.last_result = Some(result.clone());
        Ok(result)
    }

    fn touched_list_ids(&self) -> Vec<WordListId> {
        let mut ids: Vec<_> = self.state.queue.iter().map(|w| w.source_list_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn persist(&mut self, result: TestResult) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(error = %PersistenceError::NoRuntime, "test result not saved");
            return;
        };
        let sink = Arc::clone(&self.deps.sink);
        self.pending_save = Some(runtime.spawn(async move {
            if let Err(err) = sink.record_result(&result).await {
                tracing::warn!(error = %err, "test result not saved");
            }
        }));
    }

    fn speak_current_word(&mut self) {
        if let Some(text) = self.state.current_word().map(|w| w.text.clone()) {
            self.say(&text);
        }
    }

    fn say(&mut self, text: &str) {
        self.deps.speech.cancel();
        if let Err(err) = self.deps.speech.speak(text, self.config.speech()) {
            if self.speech_degraded {
                tracing::debug!(error = %err, "speech failed");
            } else {
                tracing::warn!(error = %err, "speech failed; continuing text-only");
                self.speech_degraded = true;
            }
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.cancel();
        }
        self.deps.speech.cancel();
        self.generation += 1;
    }
}

impl Drop for TestSessionController {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.cancel();
        }
        self.deps.speech.cancel();
    }
}

impl fmt::Debug for TestSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSessionController")
            .field("phase", &self.state.phase)
            .field("queue_len", &self.state.queue.len())
            .field("position", &self.state.position)
            .field("score", &self.state.score)
            .field("generation", &self.generation)
            .field("feedback_pending", &self.state.is_feedback_pending())
            .field("speech_degraded", &self.speech_degraded)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

//! Cancellable delayed actions for the post-answer dwell.
//!
//! A scheduler never calls back into a session. It delivers the
//! [`DwellToken`] it was given once the delay elapses; whoever drives the event
//! loop hands that token to the session, which ignores tokens it no longer
//! expects.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one scheduled dwell: which session run and which word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DwellToken {
    pub generation: u64,
    pub position: usize,
}

/// Handle to a scheduled dwell. Cancelling twice is harmless.
pub trait TimerHandle: Send {
    fn cancel(&self);
}

pub trait DwellScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, token: DwellToken) -> Box<dyn TimerHandle>;
}

//
// ─── TOKIO ─────────────────────────────────────────────────────────────────────
//

/// Sleeps on the tokio runtime and sends the token on a channel when done.
///
/// Scheduling outside a runtime logs a warning and returns a handle whose
/// timer never fires.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<DwellToken>,
}

impl TokioScheduler {
    /// Returns the scheduler and the receiver the event loop should poll.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DwellToken>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

struct TokioTimer {
    task: JoinHandle<()>,
}

impl TimerHandle for TokioTimer {
    fn cancel(&self) {
        self.task.abort();
    }
}

struct InertTimer;

impl TimerHandle for InertTimer {
    fn cancel(&self) {}
}

impl DwellScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, token: DwellToken) -> Box<dyn TimerHandle> {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(?token, "no tokio runtime; dwell timer dropped");
            return Box::new(InertTimer);
        };
        let tx = self.tx.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the event loop has shut down.
            let _ = tx.send(token);
        });
        Box::new(TokioTimer { task })
    }
}

//
// ─── MANUAL ────────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
struct ManualTimer {
    token: DwellToken,
    delay: Duration,
    cancelled: Arc<AtomicBool>,
}

struct ManualHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle for ManualHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Timers that only fire when told to. Useful for tests and step-through drivers.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<VecDeque<ManualTimer>>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest timer that has not been cancelled.
    #[must_use]
    pub fn fire_next(&self) -> Option<DwellToken> {
        let mut timers = self.timers.lock().ok()?;
        while let Some(timer) = timers.pop_front() {
            if !timer.cancelled.load(Ordering::SeqCst) {
                return Some(timer.token);
            }
        }
        None
    }

    /// Number of scheduled timers not yet fired or cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.lock().map_or(0, |timers| {
            timers
                .iter()
                .filter(|t| !t.cancelled.load(Ordering::SeqCst))
                .count()
        })
    }

    /// Delay requested by the most recently scheduled timer.
    #[must_use]
    pub fn last_delay(&self) -> Option<Duration> {
        self.timers.lock().ok()?.back().map(|t| t.delay)
    }
}

impl DwellScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, token: DwellToken) -> Box<dyn TimerHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        if let Ok(mut timers) = self.timers.lock() {
            timers.push_back(ManualTimer {
                token,
                delay,
                cancelled: Arc::clone(&cancelled),
            });
        }
        Box::new(ManualHandle { cancelled })
    }
}

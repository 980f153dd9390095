mod config;
mod controller;
mod plan;
mod progress;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use config::{MAX_DWELL, ResultDetailsMode, SessionConfig, SessionConfigError};
pub use controller::{
    DwellOutcome, IgnoredReason, SessionDeps, SubmitOutcome, TestSessionController,
};
pub use plan::{SessionPlan, SessionPlanner};
pub use progress::{Feedback, Phase, SessionProgress};
pub use workflow::SessionLoader;

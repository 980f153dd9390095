#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod list_service;
pub mod result_sink;
pub mod sessions;
pub mod speech;
pub mod timer;

pub use spell_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ListServiceError, PersistenceError, SessionError};
pub use list_service::ListService;
pub use result_sink::{ResultSink, StorageResultSink};
pub use sessions::{
    DwellOutcome, Feedback, IgnoredReason, Phase, ResultDetailsMode, SessionConfig,
    SessionDeps, SessionLoader, SessionPlanner, SessionProgress, SubmitOutcome,
    TestSessionController,
};
pub use speech::{CommandSpeech, SilentSpeech, SpeechError, SpeechOptions, SpeechOutput};
pub use timer::{DwellScheduler, DwellToken, ManualScheduler, TokioScheduler};

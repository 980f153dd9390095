//! Speech output for dictation prompts and feedback.
//!
//! The platform speech capability is process-wide and plays one utterance at a
//! time. Callers cancel before speaking; see [`SpeechOutput`].

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use thiserror::Error;

mod command;
mod voices;

pub use command::{CommandSpeech, SpeechProgram, parse_espeak_voices, parse_say_voices};
pub use voices::{Voice, VoiceCatalog};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpeechError {
    /// No speech engine on this machine. Sessions continue text-only.
    #[error("speech output unavailable: {0}")]
    Unavailable(String),
    #[error("speech output failed: {0}")]
    Failed(String),
}

/// Prosody for one utterance. Rate and pitch are relative to the engine default (1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechOptions {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            rate: 0.8,
            pitch: 1.1,
            volume: 1.0,
        }
    }
}

/// Speech output adapter.
///
/// `speak` starts an utterance and returns without waiting for it to end.
/// Implementations hold at most one in-flight utterance; `cancel` stops it and
/// any late completion is ignored.
pub trait SpeechOutput: Send + Sync {
    /// # Errors
    ///
    /// Returns `SpeechError::Unavailable` when there is no engine, or
    /// `SpeechError::Failed` when the engine rejected the utterance.
    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), SpeechError>;

    fn cancel(&self);

    /// Switch to the next available voice and return it.
    fn cycle_voice(&self) -> Option<Voice>;

    fn current_voice(&self) -> Option<Voice>;
}

/// Text-only fallback. Speaks nothing and never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeech;

impl SpeechOutput for SilentSpeech {
    fn speak(&self, _text: &str, _options: &SpeechOptions) -> Result<(), SpeechError> {
        Ok(())
    }

    fn cancel(&self) {}

    fn cycle_voice(&self) -> Option<Voice> {
        None
    }

    fn current_voice(&self) -> Option<Voice> {
        None
    }
}

/// Records utterances in memory. Useful for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
    unavailable: AtomicBool,
    voices: Mutex<VoiceCatalog>,
}

impl RecordingSpeech {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_voices(self, voices: impl IntoIterator<Item = Voice>) -> Self {
        Self {
            voices: Mutex::new(VoiceCatalog::new(voices)),
            ..self
        }
    }

    /// Make every subsequent `speak` fail with `SpeechError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Everything spoken so far, oldest first.
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|g| g.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn last_spoken(&self) -> Option<String> {
        self.spoken().pop()
    }

    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl SpeechOutput for RecordingSpeech {
    fn speak(&self, text: &str, _options: &SpeechOptions) -> Result<(), SpeechError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SpeechError::Unavailable("recording speech disabled".into()));
        }
        self.spoken
            .lock()
            .map_err(|e| SpeechError::Failed(e.to_string()))?
            .push(text.to_owned());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn cycle_voice(&self) -> Option<Voice> {
        self.voices.lock().ok()?.cycle().cloned()
    }

    fn current_voice(&self) -> Option<Voice> {
        self.voices.lock().ok()?.current().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_speech_captures_and_degrades() {
        let speech = RecordingSpeech::new();
        speech.speak("cat", &SpeechOptions::default()).unwrap();
        speech.cancel();
        assert_eq!(speech.spoken(), vec!["cat"]);
        assert_eq!(speech.cancel_count(), 1);

        speech.set_unavailable(true);
        let err = speech.speak("dog", &SpeechOptions::default()).unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable(_)));
        assert_eq!(speech.last_spoken().as_deref(), Some("cat"));
    }

    #[test]
    fn recording_speech_cycles_configured_voices() {
        let speech =
            RecordingSpeech::new().with_voices([Voice::new("Alex", "en-US"), Voice::new("Fred", "en-US")]);
        assert_eq!(speech.current_voice().unwrap().name, "Alex");
        assert_eq!(speech.cycle_voice().unwrap().name, "Fred");
        assert!(SilentSpeech.cycle_voice().is_none());
    }
}

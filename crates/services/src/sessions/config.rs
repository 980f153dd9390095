use std::time::Duration;

use thiserror::Error;

use crate::speech::SpeechOptions;

/// Longest dwell accepted by [`SessionConfig::validate`].
pub const MAX_DWELL: Duration = Duration::from_secs(60);

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionConfigError {
    #[error("dwell must be between 1ms and {max:?}, got {got:?}")]
    InvalidDwell { got: Duration, max: Duration },
    #[error("speech rate must be in (0, 10], got {0}")]
    InvalidRate(f32),
    #[error("speech pitch must be in [0, 2], got {0}")]
    InvalidPitch(f32),
    #[error("speech volume must be in [0, 1], got {0}")]
    InvalidVolume(f32),
}

/// What the result sink receives as the details payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultDetailsMode {
    /// Score and total only; details stored as `{}`.
    Minimal,
    /// Full attempt list.
    #[default]
    Detailed,
}

impl ResultDetailsMode {
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// Tunables for one test session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    dwell: Duration,
    details: ResultDetailsMode,
    replay_during_feedback: bool,
    speech: SpeechOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dwell: Duration::from_millis(2000),
            details: ResultDetailsMode::default(),
            replay_during_feedback: false,
            speech: SpeechOptions::default(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: ResultDetailsMode) -> Self {
        self.details = details;
        self
    }

    /// Allow "hear the word again" while correct/incorrect feedback is playing.
    #[must_use]
    pub fn with_replay_during_feedback(mut self, allowed: bool) -> Self {
        self.replay_during_feedback = allowed;
        self
    }

    #[must_use]
    pub fn with_speech(mut self, speech: SpeechOptions) -> Self {
        self.speech = speech;
        self
    }

    #[must_use]
    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    #[must_use]
    pub fn details(&self) -> ResultDetailsMode {
        self.details
    }

    #[must_use]
    pub fn replay_during_feedback(&self) -> bool {
        self.replay_during_feedback
    }

    #[must_use]
    pub fn speech(&self) -> &SpeechOptions {
        &self.speech
    }

    /// # Errors
    ///
    /// Returns `SessionConfigError` naming the first out-of-range value.
    pub fn validate(self) -> Result<Self, SessionConfigError> {
        if self.dwell.is_zero() || self.dwell > MAX_DWELL {
            return Err(SessionConfigError::InvalidDwell {
                got: self.dwell,
                max: MAX_DWELL,
            });
        }
        let SpeechOptions {
            rate,
            pitch,
            volume,
        } = self.speech;
        if !(rate > 0.0 && rate <= 10.0) {
            return Err(SessionConfigError::InvalidRate(rate));
        }
        if !(0.0..=2.0).contains(&pitch) {
            return Err(SessionConfigError::InvalidPitch(pitch));
        }
        if !(0.0..=1.0).contains(&volume) {
            return Err(SessionConfigError::InvalidVolume(volume));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_behavior() {
        let config = SessionConfig::default().validate().unwrap();
        assert_eq!(config.dwell(), Duration::from_millis(2000));
        assert_eq!(config.details(), ResultDetailsMode::Detailed);
        assert!(!config.replay_during_feedback());
        assert!((config.speech().rate - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_zero_and_huge_dwell() {
        let err = SessionConfig::default()
            .with_dwell(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, SessionConfigError::InvalidDwell { .. }));

        assert!(
            SessionConfig::default()
                .with_dwell(Duration::from_secs(61))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn rejects_out_of_range_speech() {
        let speech = SpeechOptions {
            volume: 1.5,
            ..SpeechOptions::default()
        };
        let err = SessionConfig::default()
            .with_speech(speech)
            .validate()
            .unwrap_err();
        assert_eq!(err, SessionConfigError::InvalidVolume(1.5));
    }

    #[test]
    fn details_mode_parses_names() {
        assert_eq!(
            ResultDetailsMode::from_name(" Minimal "),
            Some(ResultDetailsMode::Minimal)
        );
        assert_eq!(ResultDetailsMode::from_name("full"), None);
    }
}

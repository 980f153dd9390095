use std::io;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use super::{SpeechError, SpeechOptions, SpeechOutput, Voice, VoiceCatalog};

/// Words per minute both engines treat as "normal" speed.
const BASE_WPM: f32 = 175.0;

/// The platform text-to-speech command to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechProgram {
    /// macOS `say`.
    Say,
    /// `espeak` / `espeak-ng` on Linux and Windows.
    Espeak,
}

impl SpeechProgram {
    #[must_use]
    pub fn for_platform() -> Self {
        if cfg!(target_os = "macos") {
            Self::Say
        } else {
            Self::Espeak
        }
    }

    fn binary(self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::Espeak => "espeak",
        }
    }

    fn args(self, text: &str, options: &SpeechOptions, voice: Option<&Voice>) -> Vec<String> {
        let wpm = (BASE_WPM * options.rate).round().max(1.0);
        let mut args = Vec::new();
        match self {
            Self::Say => {
                args.push("-r".to_owned());
                args.push(format!("{wpm}"));
                if let Some(voice) = voice {
                    args.push("-v".to_owned());
                    args.push(voice.name.clone());
                }
            }
            Self::Espeak => {
                let pitch = (50.0 * options.pitch).round().clamp(0.0, 99.0);
                let amplitude = (100.0 * options.volume).round().clamp(0.0, 200.0);
                args.extend([
                    "-s".to_owned(),
                    format!("{wpm}"),
                    "-p".to_owned(),
                    format!("{pitch}"),
                    "-a".to_owned(),
                    format!("{amplitude}"),
                ]);
                if let Some(voice) = voice {
                    args.push("-v".to_owned());
                    args.push(voice.name.clone());
                }
            }
        }
        args.push(text.to_owned());
        args
    }

    fn voice_listing_args(self) -> &'static [&'static str] {
        match self {
            Self::Say => &["-v", "?"],
            Self::Espeak => &["--voices=en"],
        }
    }
}

/// Speaks through a child process; one child at a time.
#[derive(Debug)]
pub struct CommandSpeech {
    program: SpeechProgram,
    voices: Mutex<VoiceCatalog>,
    child: Mutex<Option<Child>>,
}

impl CommandSpeech {
    #[must_use]
    pub fn new(program: SpeechProgram) -> Self {
        Self {
            program,
            voices: Mutex::new(VoiceCatalog::default()),
            child: Mutex::new(None),
        }
    }

    /// Build for the current platform and enumerate its voices.
    ///
    /// A missing engine is not an error here; `speak` reports it.
    #[must_use]
    pub fn detect() -> Self {
        let speech = Self::new(SpeechProgram::for_platform());
        match speech.load_voices() {
            Ok(count) => tracing::debug!(count, program = ?speech.program, "loaded voices"),
            Err(err) => tracing::debug!(error = %err, "voice enumeration failed"),
        }
        speech
    }

    /// Query the engine for voices and replace the catalog.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if the listing command cannot run.
    pub fn load_voices(&self) -> Result<usize, SpeechError> {
        let output = Command::new(self.program.binary())
            .args(self.program.voice_listing_args())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(spawn_error)?;
        let listing = String::from_utf8_lossy(&output.stdout);
        let voices = match self.program {
            SpeechProgram::Say => parse_say_voices(&listing),
            SpeechProgram::Espeak => parse_espeak_voices(&listing),
        };
        let catalog = VoiceCatalog::new(voices);
        let count = catalog.voices().len();
        *self
            .voices
            .lock()
            .map_err(|e| SpeechError::Failed(e.to_string()))? = catalog;
        Ok(count)
    }

    fn stop_child(&self) {
        let Ok(mut guard) = self.child.lock() else {
            return;
        };
        if let Some(mut child) = guard.take() {
            // Already-exited children make kill fail; that is fine.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn spawn_error(err: io::Error) -> SpeechError {
    if err.kind() == io::ErrorKind::NotFound {
        SpeechError::Unavailable(err.to_string())
    } else {
        SpeechError::Failed(err.to_string())
    }
}

impl SpeechOutput for CommandSpeech {
    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), SpeechError> {
        self.stop_child();
        let voice = self.current_voice();
        let child = Command::new(self.program.binary())
            .args(self.program.args(text, options, voice.as_ref()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;
        *self
            .child
            .lock()
            .map_err(|e| SpeechError::Failed(e.to_string()))? = Some(child);
        Ok(())
    }

    fn cancel(&self) {
        self.stop_child();
    }

    fn cycle_voice(&self) -> Option<Voice> {
        self.voices.lock().ok()?.cycle().cloned()
    }

    fn current_voice(&self) -> Option<Voice> {
        self.voices.lock().ok()?.current().cloned()
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.stop_child();
    }
}

/// Parse `say -v ?` output: `Name   en_US    # sample sentence`.
///
/// Names may contain spaces, so the locale is the last token before `#`.
#[must_use]
pub fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, lang) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || lang.is_empty() {
                return None;
            }
            Some(Voice::new(name, lang))
        })
        .collect()
}

/// Parse `espeak --voices` output, skipping the header row.
///
/// Columns: `Pty Language Age/Gender VoiceName File Other-Languages`. The
/// language column is used as the voice name because `espeak -v` accepts it.
#[must_use]
pub fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let lang = cols.next()?;
            Some(Voice::new(lang, lang))
        })
        .collect()
}

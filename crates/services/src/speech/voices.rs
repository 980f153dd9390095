/// A platform voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP-47-ish tag as reported by the platform, e.g. `en-US` or `en_GB`.
    pub lang: String,
}

impl Voice {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    #[must_use]
    pub fn is_english(&self) -> bool {
        self.lang.to_ascii_lowercase().starts_with("en")
    }
}

/// Name fragments tried in order when picking the default voice.
const PREFERRED: [&str; 4] = ["Google US English", "Zira", "Samantha", "Female"];

/// English voices available for dictation, with a current selection.
///
/// The selection lives only as long as the catalog; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    selected: Option<usize>,
}

impl VoiceCatalog {
    /// Keep English voices and select the preferred default.
    #[must_use]
    pub fn new(voices: impl IntoIterator<Item = Voice>) -> Self {
        let voices: Vec<Voice> = voices.into_iter().filter(Voice::is_english).collect();
        let selected = PREFERRED
            .iter()
            .find_map(|fragment| voices.iter().position(|v| v.name.contains(fragment)))
            .or(if voices.is_empty() { None } else { Some(0) });
        Self { voices, selected }
    }

    #[must_use]
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    #[must_use]
    pub fn current(&self) -> Option<&Voice> {
        self.selected.and_then(|i| self.voices.get(i))
    }

    /// Advance to the next voice, wrapping around. `None` when there are no voices.
    pub fn cycle(&mut self) -> Option<&Voice> {
        if self.voices.is_empty() {
            return None;
        }
        let next = self.selected.map_or(0, |i| (i + 1) % self.voices.len());
        self.selected = Some(next);
        self.voices.get(next)
    }
}

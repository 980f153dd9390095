use serde::{Deserialize, Serialize};

/// A single spelling word as stored on a list.
///
/// `mastered` is owned by list management; a test session only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    #[serde(default)]
    pub mastered: bool,
}

impl Word {
    /// A fresh, not-yet-mastered word. The text is trimmed.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self {
            text: text.trim().to_owned(),
            mastered: false,
        }
    }
}

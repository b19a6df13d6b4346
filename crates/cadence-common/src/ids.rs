//! Identifier types for clips and scheduled work.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Case-insensitive identifier for an audio clip.
///
/// The original spelling is kept for display; equality and hashing use the
/// lowercase form, so `"Click"` and `"click"` name the same clip.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ClipId {
    name: Arc<str>,
    key: Arc<str>,
}

impl ClipId {
    /// Creates a clip identifier.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let name: Arc<str> = Arc::from(name);
        let folded = name.to_lowercase();
        // Already folded names share one allocation.
        let key = if folded.as_str() == &*name {
            Arc::clone(&name)
        } else {
            Arc::from(folded)
        };
        Self { name, key }
    }

    /// Returns the identifier as it was first spelled.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Returns the folded key used for comparisons.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Checks whether the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for ClipId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ClipId {}

impl Hash for ClipId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClipId({:?})", self.name)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for ClipId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClipId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<ClipId> for String {
    fn from(value: ClipId) -> Self {
        value.name.to_string()
    }
}

/// Which clip table an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipKind {
    /// Music tracks played on the deck pair.
    Music,
    /// Sound effects played on pooled or exclusive voices.
    Sfx,
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Music => f.write_str("music"),
            Self::Sfx => f.write_str("sfx"),
        }
    }
}

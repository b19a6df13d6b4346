//! Clip registry.
//!
//! Static identifier-to-clip table built once at startup. Lookups are
//! case-insensitive exact matches and never mutate the table.

use ahash::AHashMap;
use cadence_common::{AudioError, AudioResult, ClipId, ClipKind};
use tracing::debug;

use crate::clip::ClipHandle;

/// Identifier-to-clip table for one kind of clip.
#[derive(Debug, Clone)]
pub struct ClipRegistry {
    kind: ClipKind,
    clips: AHashMap<ClipId, ClipHandle>,
}

impl ClipRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(kind: ClipKind) -> Self {
        Self {
            kind,
            clips: AHashMap::new(),
        }
    }

    /// Create a registry from entries.
    #[must_use]
    pub fn from_entries<I, K>(kind: ClipKind, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<ClipHandle>)>,
        K: Into<ClipId>,
    {
        let mut registry = Self::new(kind);
        registry.register(entries);
        registry
    }

    /// Add entries. Later duplicates overwrite earlier ones; entries without
    /// a clip are skipped.
    pub fn register<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Option<ClipHandle>)>,
        K: Into<ClipId>,
    {
        for (id, clip) in entries {
            let id = id.into();
            let Some(clip) = clip else {
                debug!("Skipping {} entry '{}' without a clip", self.kind, id);
                continue;
            };
            if id.is_empty() {
                continue;
            }
            self.clips.insert(id, clip);
        }
        debug!("{} registry holds {} clips", self.kind, self.clips.len());
    }

    /// Replace the whole table.
    pub fn rebuild<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Option<ClipHandle>)>,
        K: Into<ClipId>,
    {
        self.clips.clear();
        self.register(entries);
    }

    /// Resolve an identifier.
    pub fn lookup(&self, id: &ClipId) -> AudioResult<&ClipHandle> {
        self.clips.get(id).ok_or_else(|| AudioError::ClipNotFound {
            kind: self.kind,
            id: id.clone(),
        })
    }

    /// Check whether an identifier resolves.
    #[must_use]
    pub fn contains(&self, id: &ClipId) -> bool {
        self.clips.contains_key(id)
    }

    /// Which kind of clip this registry holds.
    #[must_use]
    pub const fn kind(&self) -> ClipKind {
        self.kind
    }

    /// Number of registered clips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Iterate over registered identifiers.
    pub fn ids(&self) -> impl Iterator<Item = &ClipId> {
        self.clips.keys()
    }
}

//! Error types for Cadence.

use std::path::PathBuf;

use thiserror::Error;

use crate::ids::{ClipId, ClipKind};

/// Top-level error type for audio operations.
///
/// The first three variants are the conditions the playback core reports;
/// they are always recovered locally (logged and counted) and never abort the
/// caller. The remaining variants come from device and asset plumbing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// No clip is registered under the identifier.
    #[error("{kind} clip not found: '{id}'")]
    ClipNotFound {
        /// Which registry was searched.
        kind: ClipKind,
        /// The identifier that failed to resolve.
        id: ClipId,
    },

    /// No free or creatable voice was left in the pool.
    #[error("No free pooled voices available (max: {capacity})")]
    PoolExhausted {
        /// Pool capacity at the time of the request.
        capacity: usize,
    },

    /// A playlist was started without any track identifiers.
    #[error("Playlist has no tracks")]
    EmptyPlaylist,

    /// Failed to initialize the audio device.
    #[error("Failed to initialize audio device: {0}")]
    DeviceInitFailed(String),

    /// Failed to load an audio file.
    #[error("Failed to load audio file '{path}': {message}")]
    LoadFailed {
        /// Path to the file that failed to load.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to decode audio data.
    #[error("Failed to decode audio: {0}")]
    DecodeFailed(String),
}

impl AudioError {
    /// Returns true for conditions the playback core recovers from by
    /// dropping the request.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ClipNotFound { .. } | Self::PoolExhausted { .. } | Self::EmptyPlaylist
        )
    }
}

/// Result type alias for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_not_found_display() {
        let err = AudioError::ClipNotFound {
            kind: ClipKind::Music,
            id: ClipId::new("Theme"),
        };
        let text = err.to_string();
        assert!(text.contains("music"));
        assert!(text.contains("Theme"));
    }

    #[test]
    fn test_pool_exhausted_display() {
        let err = AudioError::PoolExhausted { capacity: 8 };
        assert!(err.to_string().contains('8'));
    }

    #[test]
    fn test_recoverable_split() {
        assert!(AudioError::EmptyPlaylist.is_recoverable());
        assert!(AudioError::PoolExhausted { capacity: 1 }.is_recoverable());
        assert!(!AudioError::DecodeFailed("bad header".into()).is_recoverable());
    }
}

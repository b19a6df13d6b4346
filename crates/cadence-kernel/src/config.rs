//! Audio manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::volume::Bus;

/// Default maximum number of pooled sound-effect voices.
pub const DEFAULT_MAX_POOL_VOICES: usize = 16;

/// Default crossfade / fade-out duration in seconds.
pub const DEFAULT_FADE_SECS: f32 = 1.0;

/// Wait used by the playlist when a track cannot be resolved.
pub const DEFAULT_PLAYLIST_FALLBACK_SECS: f32 = 1.0;

/// Mixer parameter names for the three volume buses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusNames {
    /// Master bus parameter.
    pub master: String,
    /// Music bus parameter.
    pub music: String,
    /// Sound-effect bus parameter.
    pub sfx: String,
}

impl Default for BusNames {
    fn default() -> Self {
        Self {
            master: "MasterVolume".to_string(),
            music: "MusicVolume".to_string(),
            sfx: "SFXVolume".to_string(),
        }
    }
}

impl BusNames {
    /// Parameter name for `bus`.
    #[must_use]
    pub fn for_bus(&self, bus: Bus) -> &str {
        match bus {
            Bus::Master => &self.master,
            Bus::Music => &self.music,
            Bus::Sfx => &self.sfx,
        }
    }
}

/// Audio manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Upper bound on free + busy pooled voices.
    pub max_pool_voices: usize,
    /// Fade duration used when a call does not supply one (seconds).
    pub default_fade_secs: f32,
    /// Playlist wait when a track id does not resolve (seconds).
    pub playlist_fallback_secs: f32,
    /// Mixer bus parameter names.
    pub buses: BusNames,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_pool_voices: DEFAULT_MAX_POOL_VOICES,
            default_fade_secs: DEFAULT_FADE_SECS,
            playlist_fallback_secs: DEFAULT_PLAYLIST_FALLBACK_SECS,
            buses: BusNames::default(),
        }
    }
}

impl AudioConfig {
    /// Create config with a pool capacity.
    #[must_use]
    pub fn with_max_pool_voices(mut self, max: usize) -> Self {
        self.max_pool_voices = max;
        self
    }

    /// Create config with a default fade duration.
    #[must_use]
    pub fn with_default_fade(mut self, fade: Duration) -> Self {
        self.default_fade_secs = fade.as_secs_f32();
        self
    }

    /// Create config with a playlist fallback wait.
    #[must_use]
    pub fn with_playlist_fallback(mut self, wait: Duration) -> Self {
        self.playlist_fallback_secs = wait.as_secs_f32();
        self
    }

    /// Create config with custom bus parameter names.
    #[must_use]
    pub fn with_buses(mut self, buses: BusNames) -> Self {
        self.buses = buses;
        self
    }

    /// Default fade as a duration. Negative or NaN values collapse to zero.
    #[must_use]
    pub fn default_fade(&self) -> Duration {
        secs_to_duration(self.default_fade_secs)
    }

    /// Playlist fallback wait as a duration.
    #[must_use]
    pub fn playlist_fallback(&self) -> Duration {
        secs_to_duration(self.playlist_fallback_secs)
    }
}

fn secs_to_duration(secs: f32) -> Duration {
    if secs > 0.0 {
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_config_default() {
        let config = AudioConfig::default();
        assert_eq!(config.max_pool_voices, DEFAULT_MAX_POOL_VOICES);
        assert_eq!(config.default_fade(), Duration::from_secs(1));
        assert_eq!(config.playlist_fallback(), Duration::from_secs(1));
        assert_eq!(config.buses.master, "MasterVolume");
    }

    #[test]
    fn test_audio_config_builder() {
        let config = AudioConfig::default()
            .with_max_pool_voices(4)
            .with_default_fade(Duration::from_millis(250));

        assert_eq!(config.max_pool_voices, 4);
        assert_eq!(config.default_fade(), Duration::from_millis(250));
    }

    #[test]
    fn test_negative_fade_is_zero() {
        let config = AudioConfig {
            default_fade_secs: -2.0,
            ..AudioConfig::default()
        };
        assert_eq!(config.default_fade(), Duration::ZERO);
    }
}

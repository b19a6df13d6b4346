//! Player configuration.
//!
//! Holds the audio kernel settings plus everything the player binary needs:
//! initial bus volumes, tick rate, asset directories and an optional startup
//! playlist. Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use cadence_kernel::AudioConfig;

/// Configuration file name.
const CONFIG_FILE: &str = "cadence.toml";

/// Player configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Volumes ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Scheduling ===
    /// Ticks per second
    pub tick_rate: u32,
    /// Stop after this many seconds (None = run until playback ends)
    pub max_runtime_secs: Option<f32>,

    // === Assets ===
    /// Directory scanned for music clips
    pub music_dir: PathBuf,
    /// Directory scanned for sound-effect clips
    pub sfx_dir: PathBuf,

    // === Playlist ===
    /// Track identifiers played at startup
    pub startup_playlist: Vec<String>,
    /// Wrap the startup playlist around
    pub loop_playlist: bool,
    /// Crossfade between playlist tracks in seconds (None = kernel default)
    pub playlist_fade_secs: Option<f32>,

    // === Audio Kernel ===
    /// Pool size, fades and bus names
    pub audio: AudioConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            music_volume: 0.7,
            sfx_volume: 1.0,

            tick_rate: 60,
            max_runtime_secs: None,

            music_dir: PathBuf::from("assets/music"),
            sfx_dir: PathBuf::from("assets/sfx"),

            startup_playlist: Vec::new(),
            loop_playlist: true,
            playlist_fade_secs: None,

            audio: AudioConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to the default file location.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(Self::config_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE),
            |dir| dir.join("cadence").join(CONFIG_FILE),
        )
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Volumes
        self.master_volume = clamp_unit(self.master_volume);
        self.music_volume = clamp_unit(self.music_volume);
        self.sfx_volume = clamp_unit(self.sfx_volume);

        // Scheduling
        self.tick_rate = self.tick_rate.clamp(10, 1000);
        self.max_runtime_secs = self.max_runtime_secs.filter(|secs| *secs > 0.0);

        // Kernel
        self.audio.max_pool_voices = self.audio.max_pool_voices.clamp(1, 256);
        if self.audio.default_fade_secs.is_nan() || self.audio.default_fade_secs < 0.0 {
            self.audio.default_fade_secs = cadence_kernel::DEFAULT_FADE_SECS;
        }
    }

    /// Runtime limit as a duration.
    #[must_use]
    pub fn max_runtime(&self) -> Option<Duration> {
        self.max_runtime_secs
            .and_then(|secs| Duration::try_from_secs_f32(secs).ok())
    }

    /// Playlist crossfade as a duration.
    #[must_use]
    pub fn playlist_fade(&self) -> Option<Duration> {
        self.playlist_fade_secs
            .and_then(|secs| Duration::try_from_secs_f32(secs).ok())
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.audio.max_pool_voices, 16);
        assert!(config.loop_playlist);
        assert!(config.startup_playlist.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.tick_rate = 1;
        config.master_volume = 2.0;
        config.sfx_volume = f32::NAN;
        config.max_runtime_secs = Some(-5.0);
        config.audio.max_pool_voices = 0;

        config.validate();

        assert_eq!(config.tick_rate, 10);
        assert!((config.master_volume - 1.0).abs() < f32::EPSILON);
        assert!(config.sfx_volume.abs() < f32::EPSILON);
        assert_eq!(config.max_runtime_secs, None);
        assert_eq!(config.audio.max_pool_voices, 1);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("cadence.toml");

        let mut config = EngineConfig::default();
        config.tick_rate = 120;
        config.startup_playlist = vec!["Intro".to_string(), "Loop".to_string()];
        config.audio.max_pool_voices = 8;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.tick_rate, 120);
        assert_eq!(loaded.startup_playlist, vec!["Intro", "Loop"]);
        assert_eq!(loaded.audio.max_pool_voices, 8);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/cadence.toml");
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_config_load_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("cadence.toml");
        fs::write(&path, "tick_rate = \"fast\"").expect("write");
        assert_eq!(EngineConfig::load_from(&path).tick_rate, 60);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            "music_volume = 0.25\n[audio]\ndefault_fade_secs = 2.5\n[audio.buses]\nsfx = \"Foley\"\n",
        )
        .expect("valid toml");
        assert!((config.music_volume - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.audio.default_fade(), Duration::from_millis(2_500));
        assert_eq!(config.audio.buses.sfx, "Foley");
        assert_eq!(config.audio.buses.music, "MusicVolume");
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_runtime_and_fade_durations() {
        let mut config = EngineConfig::default();
        assert_eq!(config.max_runtime(), None);
        config.max_runtime_secs = Some(1.5);
        config.playlist_fade_secs = Some(0.5);
        assert_eq!(config.max_runtime(), Some(Duration::from_millis(1_500)));
        assert_eq!(config.playlist_fade(), Some(Duration::from_millis(500)));
    }
}

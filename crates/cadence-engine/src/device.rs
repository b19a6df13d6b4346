//! Rodio output backend.
//!
//! Each kernel voice maps to one rodio [`Sink`]. Voice volume and pitch go to
//! the sink directly. Bus levels live in a shared [`BusGains`] table that the
//! mixer writes and every playing source polls, so a bus change reaches
//! voices that are already playing.
//!
//! ```text
//!  AudioManager ──▶ RodioVoice ──▶ Sink ◀── SamplesBuffer ─ amplify(bus gain)
//!       │                                                      ▲
//!       └──────────▶ RodioMixer ──▶ BusGains (dB) ─────────────┘
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cadence_common::{AudioError, AudioResult};
use cadence_kernel::{
    clamp_pitch, clamp_volume, db_to_linear, AudioBackend, BusNames, ClipHandle, MixerBus, Voice,
    VoiceRole, VoiceState,
};
use glam::Vec3;
use parking_lot::RwLock;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info};

/// How often a playing source re-reads its bus gain.
const GAIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Bus levels in decibels, shared between the mixer and playing sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusGains {
    /// Master bus level.
    pub master_db: f32,
    /// Music bus level.
    pub music_db: f32,
    /// Effects bus level.
    pub sfx_db: f32,
}

impl Default for BusGains {
    fn default() -> Self {
        Self {
            master_db: 0.0,
            music_db: 0.0,
            sfx_db: 0.0,
        }
    }
}

impl BusGains {
    /// Linear gain applied to a voice of `role`.
    #[must_use]
    pub fn linear_for(&self, role: VoiceRole) -> f32 {
        let bus_db = if role.is_music() { self.music_db } else { self.sfx_db };
        db_to_linear(self.master_db) * db_to_linear(bus_db)
    }
}

type SharedGains = Arc<RwLock<BusGains>>;

/// Mixer that maps the configured parameter names onto [`BusGains`].
#[derive(Debug, Clone)]
pub struct RodioMixer {
    names: BusNames,
    gains: SharedGains,
}

impl RodioMixer {
    fn slot<'a>(&self, gains: &'a mut BusGains, name: &str) -> Option<&'a mut f32> {
        if name == self.names.master {
            Some(&mut gains.master_db)
        } else if name == self.names.music {
            Some(&mut gains.music_db)
        } else if name == self.names.sfx {
            Some(&mut gains.sfx_db)
        } else {
            None
        }
    }

    /// Current levels.
    #[must_use]
    pub fn gains(&self) -> BusGains {
        *self.gains.read()
    }
}

impl MixerBus for RodioMixer {
    fn set_parameter(&mut self, name: &str, value_db: f32) -> bool {
        let mut gains = self.gains.write();
        match self.slot(&mut gains, name) {
            Some(slot) => {
                *slot = value_db;
                true
            },
            None => false,
        }
    }

    fn parameter(&self, name: &str) -> Option<f32> {
        let mut gains = *self.gains.read();
        self.slot(&mut gains, name).map(|db| *db)
    }
}

/// A kernel voice backed by a rodio sink.
pub struct RodioVoice {
    role: VoiceRole,
    state: VoiceState,
    sink: Sink,
    gains: SharedGains,
}

impl fmt::Debug for RodioVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RodioVoice")
            .field("role", &self.role)
            .field("clip", &self.state.clip.as_ref().map(ClipHandle::id))
            .field("volume", &self.state.volume)
            .finish_non_exhaustive()
    }
}

impl Voice for RodioVoice {
    fn state(&self) -> &VoiceState {
        &self.state
    }

    fn assign(&mut self, clip: Option<ClipHandle>) {
        self.state.clip = clip;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.volume = clamp_volume(volume);
        self.sink.set_volume(self.state.volume);
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.state.pitch = clamp_pitch(pitch);
        self.sink.set_speed(self.state.pitch);
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.looping = looping;
    }

    fn set_position(&mut self, position: Option<Vec3>) {
        self.state.position = position;
    }

    fn play(&mut self) {
        let Some(clip) = &self.state.clip else {
            return;
        };
        let Some(pcm) = clip.pcm().filter(|p| p.channels > 0 && p.sample_rate > 0) else {
            debug!("Clip '{}' has no playable samples", clip.id());
            return;
        };

        let samples = SamplesBuffer::new(pcm.channels, pcm.sample_rate, pcm.samples.to_vec());
        let source: Box<dyn Source<Item = f32> + Send> = if self.state.looping {
            Box::new(samples.repeat_infinite())
        } else {
            Box::new(samples)
        };

        let role = self.role;
        let gains = Arc::clone(&self.gains);
        let initial = gains.read().linear_for(role);
        let source = source
            .amplify(initial)
            .periodic_access(GAIN_POLL_INTERVAL, move |src| {
                src.set_factor(gains.read().linear_for(role));
            });

        self.sink.clear();
        self.sink.append(source);
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.clear();
    }

    fn is_playing(&self) -> bool {
        !self.sink.empty() && !self.sink.is_paused()
    }
}

/// Backend that plays through the default output device.
pub struct RodioBackend {
    // Dropping the stream silences every sink.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    mixer: RodioMixer,
}

impl fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RodioBackend")
            .field("gains", &self.mixer.gains())
            .finish_non_exhaustive()
    }
}

impl RodioBackend {
    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// [`AudioError::DeviceInitFailed`] if no device can be opened.
    pub fn new(names: BusNames) -> AudioResult<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::DeviceInitFailed(e.to_string()))?;
        info!("Audio device initialized successfully");
        Ok(Self {
            _stream: stream,
            handle,
            mixer: RodioMixer {
                names,
                gains: Arc::default(),
            },
        })
    }

    /// Current bus levels.
    #[must_use]
    pub fn gains(&self) -> BusGains {
        self.mixer.gains()
    }
}

impl AudioBackend for RodioBackend {
    type Voice = RodioVoice;

    fn create_voice(&mut self, role: VoiceRole) -> AudioResult<RodioVoice> {
        let sink =
            Sink::try_new(&self.handle).map_err(|e| AudioError::DeviceInitFailed(e.to_string()))?;
        debug!("Created {:?} sink", role);
        Ok(RodioVoice {
            role,
            state: VoiceState::default(),
            sink,
            gains: Arc::clone(&self.mixer.gains),
        })
    }

    fn mixer(&mut self) -> Option<&mut dyn MixerBus> {
        Some(&mut self.mixer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_kernel::linear_to_db;

    fn mixer() -> RodioMixer {
        RodioMixer {
            names: BusNames::default(),
            gains: Arc::default(),
        }
    }

    #[test]
    fn test_mixer_maps_configured_names() {
        let mut mixer = mixer();
        assert!(mixer.set_parameter("MusicVolume", -6.0));
        assert!(mixer.set_parameter("SFXVolume", -12.0));
        assert!(!mixer.set_parameter("Ambience", -3.0));

        assert_eq!(mixer.parameter("MusicVolume"), Some(-6.0));
        assert_eq!(mixer.parameter("Ambience"), None);
        assert!((mixer.gains().sfx_db + 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_custom_names() {
        let mut mixer = RodioMixer {
            names: BusNames {
                master: "Main".to_string(),
                music: "Score".to_string(),
                sfx: "Foley".to_string(),
            },
            gains: Arc::default(),
        };
        assert!(mixer.set_parameter("Score", -1.0));
        assert!(!mixer.set_parameter("MusicVolume", -1.0));
    }

    #[test]
    fn test_gain_combines_master_and_bus() {
        let gains = BusGains {
            master_db: linear_to_db(0.5),
            music_db: linear_to_db(0.5),
            sfx_db: 0.0,
        };
        assert!((gains.linear_for(VoiceRole::MusicDeck(0)) - 0.25).abs() < 1e-4);
        assert!((gains.linear_for(VoiceRole::Pooled) - 0.5).abs() < 1e-4);
        assert!((gains.linear_for(VoiceRole::Exclusive) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_shared_gains_visible_to_voices() {
        let mut mixer = mixer();
        let voice_view = Arc::clone(&mixer.gains);
        mixer.set_parameter("MasterVolume", linear_to_db(0.0));
        assert!(voice_view.read().linear_for(VoiceRole::Pooled) < 1e-3);
    }
}

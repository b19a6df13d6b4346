//! Voice and backend abstractions.
//!
//! A voice is one playback unit holding a single clip. The kernel never talks
//! to an audio device directly; it asks an [`AudioBackend`] for voices and for
//! an optional mixer, and drives them through the [`Voice`] trait.

use std::time::Duration;

use cadence_common::{AudioResult, ClipId};
use glam::Vec3;

use crate::clip::ClipHandle;

/// Lowest pitch a voice accepts.
pub const MIN_PITCH: f32 = 0.5;

/// Highest pitch a voice accepts.
pub const MAX_PITCH: f32 = 2.0;

/// Clamp a pitch multiplier to the supported range.
#[must_use]
pub fn clamp_pitch(pitch: f32) -> f32 {
    if pitch.is_nan() {
        return 1.0;
    }
    pitch.clamp(MIN_PITCH, MAX_PITCH)
}

/// Clamp a volume to `[0, 1]`.
#[must_use]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

/// What a voice is used for. Backends route roles to mixing buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceRole {
    /// Pooled, non-exclusive sound effect.
    Pooled,
    /// The single pre-empting sound-effect voice.
    Exclusive,
    /// One of the two music decks.
    MusicDeck(u8),
}

impl VoiceRole {
    /// Whether this voice plays music.
    #[must_use]
    pub const fn is_music(self) -> bool {
        matches!(self, Self::MusicDeck(_))
    }
}

/// Settings shared by every voice implementation.
#[derive(Debug, Clone)]
pub struct VoiceState {
    /// Assigned clip.
    pub clip: Option<ClipHandle>,
    /// Voice volume (0.0-1.0), before bus gain.
    pub volume: f32,
    /// Pitch multiplier.
    pub pitch: f32,
    /// Whether the clip repeats.
    pub looping: bool,
    /// World position for positional effects; `None` plays unpositioned.
    pub position: Option<Vec3>,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            clip: None,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            position: None,
        }
    }
}

/// A playback unit.
///
/// Setters take effect immediately on a playing voice. `play` restarts the
/// assigned clip from the beginning.
pub trait Voice {
    /// Current settings.
    fn state(&self) -> &VoiceState;

    /// Assign (or clear) the clip. Does not start playback.
    fn assign(&mut self, clip: Option<ClipHandle>);

    /// Set the voice volume (clamped to `[0, 1]`).
    fn set_volume(&mut self, volume: f32);

    /// Set the pitch multiplier (clamped to `[0.5, 2.0]`).
    fn set_pitch(&mut self, pitch: f32);

    /// Set whether the clip loops.
    fn set_looping(&mut self, looping: bool);

    /// Set or clear the world position.
    fn set_position(&mut self, position: Option<Vec3>);

    /// Start the assigned clip from the beginning.
    fn play(&mut self);

    /// Stop playback. The clip stays assigned.
    fn stop(&mut self);

    /// Whether audio is still being produced.
    fn is_playing(&self) -> bool;

    /// Assigned clip.
    fn clip(&self) -> Option<&ClipHandle> {
        self.state().clip.as_ref()
    }

    /// Identifier of the assigned clip.
    fn clip_id(&self) -> Option<&ClipId> {
        self.clip().map(ClipHandle::id)
    }

    /// Current volume.
    fn volume(&self) -> f32 {
        self.state().volume
    }

    /// Current pitch.
    fn pitch(&self) -> f32 {
        self.state().pitch
    }

    /// Whether the voice is playing `clip`.
    fn is_playing_clip(&self, clip: &ClipHandle) -> bool {
        self.is_playing() && self.clip().is_some_and(|c| c.same_clip(clip))
    }
}

/// A mixer exposing named float parameters (bus levels in dB).
pub trait MixerBus {
    /// Set a parameter. Returns false if the mixer has no such parameter.
    fn set_parameter(&mut self, name: &str, value_db: f32) -> bool;

    /// Read a parameter back.
    fn parameter(&self, name: &str) -> Option<f32>;
}

/// Source of voices and, optionally, a mixer.
pub trait AudioBackend {
    /// Voice type produced by this backend.
    type Voice: Voice;

    /// Create a voice for the given role.
    fn create_voice(&mut self, role: VoiceRole) -> AudioResult<Self::Voice>;

    /// The mixer, if the backend has one.
    fn mixer(&mut self) -> Option<&mut dyn MixerBus> {
        None
    }

    /// Called at the start of every tick with the unscaled delta.
    fn advance(&mut self, _dt: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_pitch() {
        assert!((clamp_pitch(0.1) - MIN_PITCH).abs() < f32::EPSILON);
        assert!((clamp_pitch(3.0) - MAX_PITCH).abs() < f32::EPSILON);
        assert!((clamp_pitch(1.25) - 1.25).abs() < f32::EPSILON);
        assert!((clamp_pitch(f32::NAN) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_clamp_volume() {
        assert!(clamp_volume(-0.5).abs() < f32::EPSILON);
        assert!((clamp_volume(1.5) - 1.0).abs() < f32::EPSILON);
        assert!(clamp_volume(f32::NAN).abs() < f32::EPSILON);
    }

    #[test]
    fn test_voice_role_is_music() {
        assert!(VoiceRole::MusicDeck(1).is_music());
        assert!(!VoiceRole::Exclusive.is_music());
    }
}

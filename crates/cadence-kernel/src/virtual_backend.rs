//! Headless backend.
//!
//! Voices advance against a shared virtual timeline instead of a device, so
//! a clip "finishes" once enough ticks have elapsed. Used by the tests and as
//! the fallback when no output device is available.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use cadence_common::AudioResult;
use glam::Vec3;
use tracing::debug;

use crate::clip::ClipHandle;
use crate::config::BusNames;
use crate::voice::{clamp_pitch, clamp_volume, AudioBackend, MixerBus, Voice, VoiceRole, VoiceState};

/// Monotonic virtual time shared by a backend and its voices.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimeline(Arc<AtomicU64>);

impl VirtualTimeline {
    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        Duration::from_nanos(self.0.load(Ordering::Relaxed))
    }

    /// Move time forward.
    pub fn advance(&self, dt: Duration) {
        let nanos = u64::try_from(dt.as_nanos()).unwrap_or(u64::MAX);
        self.0.fetch_add(nanos, Ordering::Relaxed);
    }
}

/// A voice that plays against a [`VirtualTimeline`].
#[derive(Debug)]
pub struct VirtualVoice {
    role: VoiceRole,
    state: VoiceState,
    timeline: VirtualTimeline,
    started_at: Option<Duration>,
    play_count: u32,
}

impl VirtualVoice {
    /// Create a stopped voice.
    #[must_use]
    pub fn new(role: VoiceRole, timeline: VirtualTimeline) -> Self {
        Self {
            role,
            state: VoiceState::default(),
            timeline,
            started_at: None,
            play_count: 0,
        }
    }

    /// Role this voice was created for.
    #[must_use]
    pub const fn role(&self) -> VoiceRole {
        self.role
    }

    /// How many times `play` started a clip on this voice.
    #[must_use]
    pub const fn play_count(&self) -> u32 {
        self.play_count
    }

    /// Time since the current clip started, scaled by pitch.
    #[must_use]
    pub fn playhead(&self) -> Option<Duration> {
        self.started_at
            .map(|start| self.timeline.now().saturating_sub(start).mul_f32(self.state.pitch))
    }
}

impl Voice for VirtualVoice {
    fn state(&self) -> &VoiceState {
        &self.state
    }

    fn assign(&mut self, clip: Option<ClipHandle>) {
        self.started_at = None;
        self.state.clip = clip;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.volume = clamp_volume(volume);
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.state.pitch = clamp_pitch(pitch);
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.looping = looping;
    }

    fn set_position(&mut self, position: Option<Vec3>) {
        self.state.position = position;
    }

    fn play(&mut self) {
        if self.state.clip.is_none() {
            return;
        }
        self.started_at = Some(self.timeline.now());
        self.play_count += 1;
    }

    fn stop(&mut self) {
        self.started_at = None;
    }

    fn is_playing(&self) -> bool {
        let (Some(clip), Some(playhead)) = (&self.state.clip, self.playhead()) else {
            return false;
        };
        self.state.looping || playhead < clip.duration()
    }
}

/// Mixer that stores the parameters it was created with.
#[derive(Debug, Clone, Default)]
pub struct VirtualMixer {
    parameters: AHashMap<String, f32>,
}

impl VirtualMixer {
    /// Create a mixer exposing the given parameters at 0 dB.
    #[must_use]
    pub fn with_parameters<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            parameters: names.into_iter().map(|n| (n.to_string(), 0.0)).collect(),
        }
    }

    /// Create a mixer exposing the three configured buses.
    #[must_use]
    pub fn for_buses(buses: &BusNames) -> Self {
        Self::with_parameters([buses.master.as_str(), buses.music.as_str(), buses.sfx.as_str()])
    }
}

impl MixerBus for VirtualMixer {
    fn set_parameter(&mut self, name: &str, value_db: f32) -> bool {
        match self.parameters.get_mut(name) {
            Some(value) => {
                *value = value_db;
                true
            },
            None => false,
        }
    }

    fn parameter(&self, name: &str) -> Option<f32> {
        self.parameters.get(name).copied()
    }
}

/// Backend producing [`VirtualVoice`]s.
#[derive(Debug, Default)]
pub struct VirtualBackend {
    timeline: VirtualTimeline,
    mixer: Option<VirtualMixer>,
    voices_created: usize,
}

impl VirtualBackend {
    /// Create a backend without a mixer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a mixer.
    #[must_use]
    pub fn with_mixer(mut self, mixer: VirtualMixer) -> Self {
        self.mixer = Some(mixer);
        self
    }

    /// Shared timeline.
    #[must_use]
    pub fn timeline(&self) -> &VirtualTimeline {
        &self.timeline
    }

    /// The mixer, for inspection.
    #[must_use]
    pub fn virtual_mixer(&self) -> Option<&VirtualMixer> {
        self.mixer.as_ref()
    }

    /// Total voices handed out.
    #[must_use]
    pub const fn voices_created(&self) -> usize {
        self.voices_created
    }
}

impl AudioBackend for VirtualBackend {
    type Voice = VirtualVoice;

    fn create_voice(&mut self, role: VoiceRole) -> AudioResult<VirtualVoice> {
        self.voices_created += 1;
        debug!("Virtual backend created {:?} voice #{}", role, self.voices_created);
        Ok(VirtualVoice::new(role, self.timeline.clone()))
    }

    fn mixer(&mut self) -> Option<&mut dyn MixerBus> {
        self.mixer.as_mut().map(|m| m as &mut dyn MixerBus)
    }

    fn advance(&mut self, dt: Duration) {
        self.timeline.advance(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(secs: u64) -> ClipHandle {
        ClipHandle::silent("tone", Duration::from_secs(secs))
    }

    #[test]
    fn test_voice_finishes_after_duration() {
        let timeline = VirtualTimeline::default();
        let mut voice = VirtualVoice::new(VoiceRole::Pooled, timeline.clone());
        voice.assign(Some(clip(2)));
        voice.play();
        assert!(voice.is_playing());

        timeline.advance(Duration::from_millis(1_999));
        assert!(voice.is_playing());

        timeline.advance(Duration::from_millis(1));
        assert!(!voice.is_playing());
    }

    #[test]
    fn test_looping_voice_never_finishes() {
        let timeline = VirtualTimeline::default();
        let mut voice = VirtualVoice::new(VoiceRole::MusicDeck(0), timeline.clone());
        voice.assign(Some(clip(1)));
        voice.set_looping(true);
        voice.play();
        timeline.advance(Duration::from_secs(60));
        assert!(voice.is_playing());
    }

    #[test]
    fn test_pitch_shortens_playback() {
        let timeline = VirtualTimeline::default();
        let mut voice = VirtualVoice::new(VoiceRole::Pooled, timeline.clone());
        voice.assign(Some(clip(2)));
        voice.set_pitch(2.0);
        voice.play();
        timeline.advance(Duration::from_secs(1));
        assert!(!voice.is_playing());
    }

    #[test]
    fn test_play_without_clip_is_ignored() {
        let mut voice = VirtualVoice::new(VoiceRole::Exclusive, VirtualTimeline::default());
        voice.play();
        assert!(!voice.is_playing());
        assert_eq!(voice.play_count(), 0);
    }

    #[test]
    fn test_mixer_rejects_unknown_parameter() {
        let mut mixer = VirtualMixer::for_buses(&BusNames::default());
        assert!(mixer.set_parameter("MusicVolume", -6.0));
        assert!(!mixer.set_parameter("Reverb", -6.0));
        assert_eq!(mixer.parameter("MusicVolume"), Some(-6.0));
        assert_eq!(mixer.parameter("Reverb"), None);
    }
}

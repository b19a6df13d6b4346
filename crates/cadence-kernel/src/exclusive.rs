//! Pre-empting sound-effect voice.

use glam::Vec3;
use tracing::trace;

use crate::clip::ClipHandle;
use crate::voice::Voice;

/// A single voice where each new effect cuts off the previous one.
#[derive(Debug)]
pub struct ExclusiveVoice<V> {
    voice: V,
    preemptions: u64,
}

impl<V: Voice> ExclusiveVoice<V> {
    /// Wrap a dedicated voice.
    #[must_use]
    pub fn new(voice: V) -> Self {
        Self {
            voice,
            preemptions: 0,
        }
    }

    /// Stop whatever is playing and start `clip`.
    pub fn play(&mut self, clip: ClipHandle, volume: f32, pitch: f32, position: Option<Vec3>) {
        if self.voice.is_playing() {
            self.preemptions += 1;
            trace!("Exclusive voice pre-empted {:?}", self.voice.clip_id());
        }
        self.voice.stop();
        self.voice.assign(Some(clip));
        self.voice.set_looping(false);
        self.voice.set_volume(volume);
        self.voice.set_pitch(pitch);
        self.voice.set_position(position);
        self.voice.play();
    }

    /// Stop playback.
    pub fn stop(&mut self) {
        self.voice.stop();
    }

    /// The wrapped voice.
    #[must_use]
    pub fn voice(&self) -> &V {
        &self.voice
    }

    /// How many playing effects were cut off by newer ones.
    #[must_use]
    pub const fn preemptions(&self) -> u64 {
        self.preemptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_backend::{VirtualTimeline, VirtualVoice};
    use crate::voice::VoiceRole;
    use cadence_common::ClipId;
    use std::time::Duration;

    fn clip(name: &str) -> ClipHandle {
        ClipHandle::silent(name, Duration::from_secs(2))
    }

    #[test]
    fn test_newest_request_wins() {
        let timeline = VirtualTimeline::default();
        let mut exclusive = ExclusiveVoice::new(VirtualVoice::new(VoiceRole::Exclusive, timeline.clone()));

        exclusive.play(clip("click"), 1.0, 1.0, None);
        timeline.advance(Duration::from_millis(500));
        exclusive.play(clip("confirm"), 0.5, 1.0, None);

        let voice = exclusive.voice();
        assert_eq!(voice.clip_id(), Some(&ClipId::new("confirm")));
        assert!(voice.is_playing());
        assert!((voice.volume() - 0.5).abs() < f32::EPSILON);
        assert_eq!(exclusive.preemptions(), 1);
    }

    #[test]
    fn test_replay_restarts_from_beginning() {
        let timeline = VirtualTimeline::default();
        let mut exclusive = ExclusiveVoice::new(VirtualVoice::new(VoiceRole::Exclusive, timeline.clone()));

        exclusive.play(clip("click"), 1.0, 1.0, None);
        timeline.advance(Duration::from_millis(1_500));
        exclusive.play(clip("click"), 1.0, 1.0, None);
        timeline.advance(Duration::from_millis(1_500));

        assert!(exclusive.voice().is_playing());
        assert_eq!(exclusive.voice().play_count(), 2);
    }

    #[test]
    fn test_finished_voice_is_not_counted_as_preempted() {
        let timeline = VirtualTimeline::default();
        let mut exclusive = ExclusiveVoice::new(VirtualVoice::new(VoiceRole::Exclusive, timeline.clone()));

        exclusive.play(clip("click"), 1.0, 1.0, None);
        timeline.advance(Duration::from_secs(3));
        exclusive.play(clip("click"), 1.0, 1.0, None);
        assert_eq!(exclusive.preemptions(), 0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut exclusive =
            ExclusiveVoice::new(VirtualVoice::new(VoiceRole::Exclusive, VirtualTimeline::default()));
        exclusive.play(clip("click"), 1.0, 9.0, Some(Vec3::ONE));
        assert!((exclusive.voice().pitch() - 2.0).abs() < f32::EPSILON);
        assert_eq!(exclusive.voice().state().position, Some(Vec3::ONE));
    }
}

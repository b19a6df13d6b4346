//! Playlist sequencing.
//!
//! A playlist walks an ordered list of music tracks. Each track is handed to
//! the [`MusicEngine`] with the playlist's crossfade, then the sequencer waits
//! until the crossfade into the next track should begin:
//!
//! ```text
//! wait = max(0, track duration - crossfade)     (fallback wait if unresolved)
//! ```
//!
//! Past the last track the index wraps to 0 when looping; otherwise the run
//! ends and the current track keeps playing.

use std::time::Duration;

use cadence_common::{AudioError, AudioResult, ClipId};
use tracing::{debug, info};

use crate::diagnostics::AudioDiagnostics;
use crate::music::{MusicEngine, MusicRequest};
use crate::registry::ClipRegistry;
use crate::scheduler::{Step, TaskHandle, TaskSlot, TimedTask};
use crate::voice::Voice;

/// What a playlist plays and where it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistState {
    tracks: Vec<ClipId>,
    index: usize,
    looping: bool,
    crossfade: Duration,
}

impl PlaylistState {
    /// Track identifiers in order.
    #[must_use]
    pub fn tracks(&self) -> &[ClipId] {
        &self.tracks
    }

    /// Index of the current track.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Identifier of the current track.
    #[must_use]
    pub fn current(&self) -> Option<&ClipId> {
        self.tracks.get(self.index)
    }

    /// Whether the playlist wraps around.
    #[must_use]
    pub const fn looping(&self) -> bool {
        self.looping
    }

    /// Crossfade used between tracks.
    #[must_use]
    pub const fn crossfade(&self) -> Duration {
        self.crossfade
    }
}

/// Everything a playlist step touches.
pub struct PlaylistContext<'a, V> {
    /// Music clips.
    pub registry: &'a ClipRegistry,
    /// Deck engine that plays each track.
    pub music: &'a mut MusicEngine<V>,
    /// Where unresolved tracks are reported.
    pub diagnostics: &'a mut AudioDiagnostics,
    /// Wait used when a track does not resolve.
    pub fallback_wait: Duration,
}

/// A running playlist: its state plus the time left on the current track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRun {
    state: PlaylistState,
    remaining: Duration,
}

impl PlaylistRun {
    /// Playlist contents and position.
    #[must_use]
    pub const fn state(&self) -> &PlaylistState {
        &self.state
    }

    /// Time until the next track starts.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    fn play_current<V: Voice>(&mut self, ctx: &mut PlaylistContext<'_, V>) {
        let Some(id) = self.state.current() else {
            self.remaining = ctx.fallback_wait;
            return;
        };

        let request = MusicRequest::default()
            .with_fade(self.state.crossfade)
            .with_looping(true);
        if let Err(err) = ctx.music.play(ctx.registry, id, request) {
            ctx.diagnostics.report(err);
        }

        self.remaining = match ctx.registry.lookup(id) {
            Ok(clip) => clip.duration().saturating_sub(self.state.crossfade),
            Err(_) => ctx.fallback_wait,
        };
        debug!(
            "Playlist track {} '{}', next in {:?}",
            self.state.index, id, self.remaining
        );
    }
}

impl<V: Voice> TimedTask<PlaylistContext<'_, V>> for PlaylistRun {
    fn start(&mut self, ctx: &mut PlaylistContext<'_, V>) -> Step {
        self.play_current(ctx);
        Step::Pending
    }

    fn step(&mut self, ctx: &mut PlaylistContext<'_, V>, dt: Duration) -> Step {
        self.remaining = self.remaining.saturating_sub(dt);
        if !self.remaining.is_zero() {
            return Step::Pending;
        }

        let next = self.state.index + 1;
        if next < self.state.tracks.len() {
            self.state.index = next;
        } else if self.state.looping {
            self.state.index = 0;
        } else {
            info!("Playlist finished");
            return Step::Complete;
        }
        self.play_current(ctx);
        Step::Pending
    }
}

/// Owns the single playlist task.
#[derive(Debug)]
pub struct PlaylistSequencer {
    task: TaskSlot<PlaylistRun>,
}

impl Default for PlaylistSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaylistSequencer {
    /// Create an idle sequencer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            task: TaskSlot::new("playlist"),
        }
    }

    /// Replace the running playlist and start at the first track.
    ///
    /// An empty track list is rejected before anything is cancelled, so a
    /// playlist already running keeps going.
    pub fn start<V: Voice>(
        &mut self,
        tracks: Vec<ClipId>,
        looping: bool,
        crossfade: Duration,
        ctx: &mut PlaylistContext<'_, V>,
    ) -> AudioResult<Option<TaskHandle>> {
        if tracks.is_empty() {
            return Err(AudioError::EmptyPlaylist);
        }
        info!(
            "Starting playlist of {} tracks (loop: {}, crossfade: {:?})",
            tracks.len(),
            looping,
            crossfade
        );
        let run = PlaylistRun {
            state: PlaylistState {
                tracks,
                index: 0,
                looping,
                crossfade,
            },
            remaining: Duration::ZERO,
        };
        Ok(self.task.schedule(run, ctx))
    }

    /// Cancel the running playlist. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        let stopped = self.task.cancel();
        if stopped {
            info!("Playlist stopped");
        }
        stopped
    }

    /// Step the running playlist.
    pub fn advance<V: Voice>(&mut self, ctx: &mut PlaylistContext<'_, V>, dt: Duration) {
        self.task.advance(ctx, dt);
    }

    /// The running playlist.
    #[must_use]
    pub fn current(&self) -> Option<&PlaylistRun> {
        self.task.get()
    }

    /// Whether a playlist is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.task.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipHandle;
    use crate::virtual_backend::{VirtualTimeline, VirtualVoice};
    use crate::voice::VoiceRole;
    use cadence_common::ClipKind;

    const SECOND: Duration = Duration::from_secs(1);

    struct Rig {
        registry: ClipRegistry,
        music: MusicEngine<VirtualVoice>,
        diagnostics: AudioDiagnostics,
        timeline: VirtualTimeline,
        sequencer: PlaylistSequencer,
    }

    impl Rig {
        fn new() -> Self {
            let timeline = VirtualTimeline::default();
            let registry = ClipRegistry::from_entries(
                ClipKind::Music,
                [
                    ("A", Some(ClipHandle::silent("A", Duration::from_secs(5)))),
                    ("B", Some(ClipHandle::silent("B", Duration::from_secs(3)))),
                ],
            );
            Self {
                registry,
                music: MusicEngine::new(
                    VirtualVoice::new(VoiceRole::MusicDeck(0), timeline.clone()),
                    VirtualVoice::new(VoiceRole::MusicDeck(1), timeline.clone()),
                    SECOND,
                ),
                diagnostics: AudioDiagnostics::default(),
                timeline,
                sequencer: PlaylistSequencer::new(),
            }
        }

        fn start(&mut self, tracks: &[&str], looping: bool) -> AudioResult<Option<TaskHandle>> {
            let tracks = tracks.iter().map(|t| ClipId::new(t)).collect();
            let mut ctx = PlaylistContext {
                registry: &self.registry,
                music: &mut self.music,
                diagnostics: &mut self.diagnostics,
                fallback_wait: SECOND,
            };
            self.sequencer.start(tracks, looping, SECOND, &mut ctx)
        }

        fn tick(&mut self) {
            self.timeline.advance(SECOND);
            self.music.advance(SECOND);
            let mut ctx = PlaylistContext {
                registry: &self.registry,
                music: &mut self.music,
                diagnostics: &mut self.diagnostics,
                fallback_wait: SECOND,
            };
            self.sequencer.advance(&mut ctx, SECOND);
        }

        fn index(&self) -> Option<usize> {
            self.sequencer.current().map(|run| run.state().index())
        }
    }

    #[test]
    fn test_waits_duration_minus_crossfade_then_wraps() {
        let mut rig = Rig::new();
        rig.start(&["A", "B"], true).expect("non-empty");
        assert_eq!(rig.index(), Some(0));
        assert_eq!(rig.sequencer.current().map(PlaylistRun::remaining), Some(Duration::from_secs(4)));

        for _ in 0..3 {
            rig.tick();
            assert_eq!(rig.index(), Some(0));
        }
        rig.tick();
        assert_eq!(rig.index(), Some(1));
        assert_eq!(rig.music.decks().idle().clip_id(), Some(&ClipId::new("B")));

        rig.tick();
        assert_eq!(rig.index(), Some(1));
        assert_eq!(rig.music.current_clip(), Some(&ClipId::new("B")));
        rig.tick();
        assert_eq!(rig.index(), Some(0));
        assert_eq!(rig.music.decks().idle().clip_id(), Some(&ClipId::new("A")));
    }

    #[test]
    fn test_non_looping_playlist_terminates() {
        let mut rig = Rig::new();
        rig.start(&["B"], false).expect("non-empty");
        // Tracks loop even when the playlist does not.
        assert!(rig.music.decks().idle().state().looping);
        rig.tick();
        assert!(rig.sequencer.is_running());
        rig.tick();
        assert!(!rig.sequencer.is_running());
        assert_eq!(rig.music.current_clip(), Some(&ClipId::new("B")));
    }

    #[test]
    fn test_unresolved_track_uses_fallback_wait() {
        let mut rig = Rig::new();
        rig.start(&["missing", "B"], true).expect("non-empty");
        assert_eq!(rig.diagnostics.clip_not_found, 1);
        assert_eq!(rig.sequencer.current().map(PlaylistRun::remaining), Some(SECOND));
        rig.tick();
        assert_eq!(rig.index(), Some(1));
    }

    #[test]
    fn test_empty_playlist_leaves_running_one() {
        let mut rig = Rig::new();
        rig.start(&["A", "B"], true).expect("non-empty");
        rig.tick();

        assert_eq!(rig.start(&[], true), Err(AudioError::EmptyPlaylist));
        assert!(rig.sequencer.is_running());
        assert_eq!(rig.sequencer.current().map(PlaylistRun::remaining), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_restart_replaces_playlist() {
        let mut rig = Rig::new();
        rig.start(&["A", "B"], true).expect("non-empty");
        rig.tick();
        rig.start(&["B"], false).expect("non-empty");

        let run = rig.sequencer.current().expect("running");
        assert_eq!(run.state().tracks(), &[ClipId::new("B")]);
        assert_eq!(run.remaining(), Duration::from_secs(2));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut rig = Rig::new();
        rig.start(&["A"], true).expect("non-empty");
        assert!(rig.sequencer.stop());
        assert!(!rig.sequencer.stop());
        rig.tick();
        assert!(!rig.sequencer.is_running());
    }
}

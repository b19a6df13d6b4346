//! Music decks and timed transitions.
//!
//! Music plays on two fixed voices. The *active* deck is the one listeners
//! hear; the *idle* deck is where the next track fades in. A crossfade ramps
//! both and swaps the roles when it completes. A fade-out ramps the active deck
//! to silence without swapping.
//!
//! ```text
//!   play_music(B)                      crossfade complete
//!  active: A 1.0 ─────▶ 0.0 (stop)      active: B 1.0
//!  idle:   B 0.0 ─────▶ 1.0       ──▶   idle:   A (stopped, volume 1.0)
//! ```
//!
//! Only one transition exists at a time. Starting a crossfade or a fade-out
//! drops whichever transition was running, mid-ramp if need be; the new one
//! takes over from the volumes it finds.

use std::time::Duration;

use cadence_common::{AudioResult, ClipId};
use tracing::{debug, info};

use crate::registry::ClipRegistry;
use crate::scheduler::{lerp, progress, Step, TaskHandle, TaskSlot, TimedTask};
use crate::voice::{clamp_pitch, Voice};

/// The two music voices and which one is active.
#[derive(Debug)]
pub struct DeckPair<V> {
    decks: [V; 2],
    active: usize,
}

impl<V: Voice> DeckPair<V> {
    /// Pair two voices; `first` starts as the active deck.
    #[must_use]
    pub fn new(mut first: V, mut second: V) -> Self {
        first.set_volume(1.0);
        second.set_volume(1.0);
        Self {
            decks: [first, second],
            active: 0,
        }
    }

    /// The audible deck.
    #[must_use]
    pub fn active(&self) -> &V {
        &self.decks[self.active]
    }

    /// The fade-in target.
    #[must_use]
    pub fn idle(&self) -> &V {
        &self.decks[1 - self.active]
    }

    /// Mutable audible deck.
    pub fn active_mut(&mut self) -> &mut V {
        &mut self.decks[self.active]
    }

    /// Mutable fade-in target.
    pub fn idle_mut(&mut self) -> &mut V {
        &mut self.decks[1 - self.active]
    }

    /// Index of the active deck (0 or 1).
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    /// Exchange the active and idle roles.
    pub fn swap(&mut self) {
        self.active = 1 - self.active;
    }
}

/// Crossfade from the active deck to the idle deck.
///
/// Both decks ramp from the volumes they have when the crossfade starts, so
/// a deck that was already partway in (or out) continues from there.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossfade {
    duration: Duration,
    elapsed: Duration,
    start_volume: f32,
    idle_start: f32,
}

impl Crossfade {
    /// Create a crossfade lasting `duration`.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            start_volume: 1.0,
            idle_start: 0.0,
        }
    }

    fn apply<V: Voice>(&self, decks: &mut DeckPair<V>) -> Step {
        let k = progress(self.elapsed, self.duration);
        decks.active_mut().set_volume(lerp(self.start_volume, 0.0, k));
        decks.idle_mut().set_volume(lerp(self.idle_start, 1.0, k));

        if self.elapsed < self.duration {
            return Step::Pending;
        }

        let outgoing = decks.active_mut();
        outgoing.stop();
        outgoing.set_volume(1.0);
        decks.swap();
        debug!("Crossfade finished; deck {} is active", decks.active_index());
        Step::Complete
    }
}

impl<V: Voice> TimedTask<DeckPair<V>> for Crossfade {
    fn start(&mut self, decks: &mut DeckPair<V>) -> Step {
        self.start_volume = decks.active().volume();
        self.idle_start = decks.idle().volume();
        self.apply(decks)
    }

    fn step(&mut self, decks: &mut DeckPair<V>, dt: Duration) -> Step {
        self.elapsed += dt;
        self.apply(decks)
    }
}

/// Fade the active deck to silence.
///
/// If a crossfade was cut short the idle deck may still be audible; it is
/// ramped down alongside the active deck so nothing is left hanging.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeOut {
    duration: Duration,
    elapsed: Duration,
    active_start: f32,
    idle_start: Option<f32>,
}

impl FadeOut {
    /// Create a fade-out lasting `duration`.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            active_start: 1.0,
            idle_start: None,
        }
    }

    fn apply<V: Voice>(&self, decks: &mut DeckPair<V>) -> Step {
        let k = progress(self.elapsed, self.duration);
        decks.active_mut().set_volume(lerp(self.active_start, 0.0, k));
        if let Some(idle_start) = self.idle_start {
            decks.idle_mut().set_volume(lerp(idle_start, 0.0, k));
        }

        if self.elapsed < self.duration {
            return Step::Pending;
        }

        let active = decks.active_mut();
        active.stop();
        active.set_volume(1.0);
        if self.idle_start.is_some() {
            let idle = decks.idle_mut();
            idle.stop();
            idle.set_volume(1.0);
        }
        debug!("Music fade-out finished");
        Step::Complete
    }
}

impl<V: Voice> TimedTask<DeckPair<V>> for FadeOut {
    fn start(&mut self, decks: &mut DeckPair<V>) -> Step {
        self.active_start = decks.active().volume();
        self.idle_start = decks.idle().is_playing().then(|| decks.idle().volume());
        self.apply(decks)
    }

    fn step(&mut self, decks: &mut DeckPair<V>, dt: Duration) -> Step {
        self.elapsed += dt;
        self.apply(decks)
    }
}

/// The one transition the music engine may be running.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Active deck out, idle deck in, then swap.
    Crossfade(Crossfade),
    /// Active deck out, no swap.
    FadeOut(FadeOut),
}

impl Transition {
    /// Total length of the transition.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        match self {
            Self::Crossfade(c) => c.duration,
            Self::FadeOut(f) => f.duration,
        }
    }

    /// Time already covered.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Crossfade(c) => c.elapsed,
            Self::FadeOut(f) => f.elapsed,
        }
    }
}

impl<V: Voice> TimedTask<DeckPair<V>> for Transition {
    fn start(&mut self, decks: &mut DeckPair<V>) -> Step {
        match self {
            Self::Crossfade(c) => c.start(decks),
            Self::FadeOut(f) => f.start(decks),
        }
    }

    fn step(&mut self, decks: &mut DeckPair<V>, dt: Duration) -> Step {
        match self {
            Self::Crossfade(c) => c.step(decks, dt),
            Self::FadeOut(f) => f.step(decks, dt),
        }
    }
}

/// Parameters of a music request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicRequest {
    /// Crossfade length; `None` uses the engine default.
    pub fade: Option<Duration>,
    /// Whether the track loops.
    pub looping: bool,
    /// Pitch multiplier.
    pub pitch: f32,
}

impl Default for MusicRequest {
    fn default() -> Self {
        Self {
            fade: None,
            looping: true,
            pitch: 1.0,
        }
    }
}

impl MusicRequest {
    /// Set the crossfade length.
    #[must_use]
    pub const fn with_fade(mut self, fade: Duration) -> Self {
        self.fade = Some(fade);
        self
    }

    /// Set whether the track loops.
    #[must_use]
    pub const fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Set the pitch multiplier.
    #[must_use]
    pub const fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }
}

/// What a successful `play` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicChange {
    /// The track is already the audible one, or a running crossfade is
    /// already bringing it in; nothing changed.
    AlreadyPlaying,
    /// A crossfade is running toward the track.
    Crossfading(TaskHandle),
    /// The crossfade had zero length and completed at once.
    Switched,
}

/// Two-deck music player with cancellable transitions.
#[derive(Debug)]
pub struct MusicEngine<V> {
    decks: DeckPair<V>,
    transition: TaskSlot<Transition>,
    default_fade: Duration,
}

impl<V: Voice> MusicEngine<V> {
    /// Create an engine over two deck voices.
    #[must_use]
    pub fn new(first: V, second: V, default_fade: Duration) -> Self {
        Self {
            decks: DeckPair::new(first, second),
            transition: TaskSlot::new("music-transition"),
            default_fade,
        }
    }

    /// Resolve `id` and crossfade to it.
    ///
    /// A request for the clip a transition is taking away (the outgoing side
    /// of a crossfade, or a fade-out) cancels that transition and fades the
    /// clip back up from its current volume without restarting it.
    pub fn play(
        &mut self,
        registry: &ClipRegistry,
        id: &ClipId,
        request: MusicRequest,
    ) -> AudioResult<MusicChange> {
        let clip = registry.lookup(id)?;
        let on_active = self.decks.active().is_playing_clip(clip);
        let on_idle = self.decks.idle().is_playing_clip(clip);

        match self.transition.get() {
            None if on_active => {
                debug!("Music '{}' already playing", id);
                return Ok(MusicChange::AlreadyPlaying);
            },
            Some(Transition::Crossfade(_)) if on_idle => {
                debug!("Music '{}' already fading in", id);
                return Ok(MusicChange::AlreadyPlaying);
            },
            _ => {},
        }

        if on_active {
            // Outgoing deck becomes the fade-in target again.
            self.decks.swap();
        }

        let resume = on_active || on_idle;
        let incoming = self.decks.idle_mut();
        incoming.set_looping(request.looping);
        incoming.set_pitch(clamp_pitch(request.pitch));
        if resume {
            debug!("Resuming music '{}' at volume {:.2}", id, incoming.volume());
        } else {
            incoming.stop();
            incoming.assign(Some(clip.clone()));
            incoming.set_position(None);
            incoming.set_volume(0.0);
            incoming.play();
        }

        let fade = request.fade.unwrap_or(self.default_fade);
        info!("Crossfading to music '{}' over {:?}", clip.id(), fade);
        let change = self
            .transition
            .schedule(Transition::Crossfade(Crossfade::new(fade)), &mut self.decks)
            .map_or(MusicChange::Switched, MusicChange::Crossfading);
        Ok(change)
    }

    /// Fade the active deck out. `None` uses the engine default.
    pub fn stop(&mut self, fade: Option<Duration>) -> Option<TaskHandle> {
        let fade = fade.unwrap_or(self.default_fade);
        info!("Stopping music over {:?}", fade);
        self.transition
            .schedule(Transition::FadeOut(FadeOut::new(fade)), &mut self.decks)
    }

    /// Step the running transition.
    pub fn advance(&mut self, dt: Duration) {
        self.transition.advance(&mut self.decks, dt);
    }

    /// Clip on the active deck, if it is playing.
    #[must_use]
    pub fn current_clip(&self) -> Option<&ClipId> {
        let active = self.decks.active();
        if active.is_playing() {
            active.clip_id()
        } else {
            None
        }
    }

    /// Whether a crossfade or fade-out is running.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    /// The running transition.
    #[must_use]
    pub fn transition(&self) -> Option<&Transition> {
        self.transition.get()
    }

    /// Read access to the decks.
    #[must_use]
    pub const fn decks(&self) -> &DeckPair<V> {
        &self.decks
    }

    /// Fade used when a request does not supply one.
    #[must_use]
    pub const fn default_fade(&self) -> Duration {
        self.default_fade
    }
}

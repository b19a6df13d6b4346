//! Audio manager.
//!
//! Composition root for playback: owns the clip registries, the effect pool,
//! the exclusive voice, the music decks, the playlist and the command queue,
//! and drives all of them from one `advance` call per tick.
//!
//! ## Tick order
//!
//! 1. Drain queued [`AudioCommand`]s
//! 2. Advance the backend clock
//! 3. Step the music transition
//! 4. Step the playlist
//! 5. Reclaim finished pooled voices
//!
//! ## Reporting
//!
//! Every fallible operation has a `try_*` form returning [`AudioResult`]. The
//! plain forms report failures to [`AudioDiagnostics`] (which logs a warning)
//! and carry on.

use std::fmt;
use std::time::Duration;

use cadence_common::{AudioResult, ClipId, ClipKind};
use glam::Vec3;
use tracing::{debug, info};

use crate::clip::ClipHandle;
use crate::command::{AudioCommand, AudioCommandSender, CommandQueue};
use crate::config::AudioConfig;
use crate::diagnostics::AudioDiagnostics;
use crate::exclusive::ExclusiveVoice;
use crate::music::{MusicChange, MusicEngine, MusicRequest};
use crate::playlist::{PlaylistContext, PlaylistRun, PlaylistSequencer};
use crate::pool::{PoolStats, SourcePool};
use crate::registry::ClipRegistry;
use crate::scheduler::{AudioClock, TaskHandle};
use crate::volume::{apply_bus, linear_to_db, Bus, VolumeSettings};
use crate::voice::{clamp_pitch, clamp_volume, AudioBackend, Voice, VoiceRole};

/// How a sound effect should be played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SfxRequest {
    /// Use the pre-empting voice instead of the pool.
    pub exclusive: bool,
    /// Voice volume (0.0-1.0).
    pub volume: f32,
    /// Pitch multiplier.
    pub pitch: f32,
    /// World position; `None` plays unpositioned.
    pub position: Option<Vec3>,
}

impl Default for SfxRequest {
    fn default() -> Self {
        Self {
            exclusive: false,
            volume: 1.0,
            pitch: 1.0,
            position: None,
        }
    }
}

impl SfxRequest {
    /// Request for the exclusive voice.
    #[must_use]
    pub fn exclusive() -> Self {
        Self {
            exclusive: true,
            ..Self::default()
        }
    }

    /// Set whether the exclusive voice is used.
    #[must_use]
    pub const fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Set the volume.
    #[must_use]
    pub const fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Set the pitch.
    #[must_use]
    pub const fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Play at a world position.
    #[must_use]
    pub const fn at(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }
}

/// Playback scheduler over an [`AudioBackend`].
pub struct AudioManager<B: AudioBackend> {
    backend: B,
    config: AudioConfig,
    music_clips: ClipRegistry,
    sfx_clips: ClipRegistry,
    pool: SourcePool<B::Voice>,
    exclusive: ExclusiveVoice<B::Voice>,
    music: MusicEngine<B::Voice>,
    playlist: PlaylistSequencer,
    volumes: VolumeSettings,
    diagnostics: AudioDiagnostics,
    clock: AudioClock,
    commands: CommandQueue,
}

impl<B: AudioBackend> fmt::Debug for AudioManager<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioManager")
            .field("music_clips", &self.music_clips.len())
            .field("sfx_clips", &self.sfx_clips.len())
            .field("pool", &self.pool.stats())
            .field("volumes", &self.volumes)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<B: AudioBackend> AudioManager<B> {
    /// Create a manager, allocating the exclusive voice and both music decks.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot create the dedicated voices.
    pub fn new(mut backend: B, config: AudioConfig) -> AudioResult<Self> {
        let exclusive = backend.create_voice(VoiceRole::Exclusive)?;
        let deck_a = backend.create_voice(VoiceRole::MusicDeck(0))?;
        let deck_b = backend.create_voice(VoiceRole::MusicDeck(1))?;

        info!(
            "Audio manager ready (pool max: {}, default fade: {:?})",
            config.max_pool_voices,
            config.default_fade()
        );

        let mut manager = Self {
            pool: SourcePool::new(config.max_pool_voices),
            exclusive: ExclusiveVoice::new(exclusive),
            music: MusicEngine::new(deck_a, deck_b, config.default_fade()),
            playlist: PlaylistSequencer::new(),
            music_clips: ClipRegistry::new(ClipKind::Music),
            sfx_clips: ClipRegistry::new(ClipKind::Sfx),
            volumes: VolumeSettings::default(),
            diagnostics: AudioDiagnostics::default(),
            clock: AudioClock::default(),
            commands: CommandQueue::default(),
            backend,
            config,
        };
        manager.apply_volumes();
        Ok(manager)
    }

    /// Replace the music table.
    pub fn register_music<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Option<ClipHandle>)>,
        K: Into<ClipId>,
    {
        self.music_clips.rebuild(entries);
    }

    /// Replace the sound-effect table.
    pub fn register_sfx<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Option<ClipHandle>)>,
        K: Into<ClipId>,
    {
        self.sfx_clips.rebuild(entries);
    }

    // ------------------------------------------------------------------
    // Music
    // ------------------------------------------------------------------

    /// Crossfade to a looping track with the default fade.
    pub fn play_music(&mut self, id: impl Into<ClipId>) {
        self.play_music_with(id, MusicRequest::default());
    }

    /// Crossfade to a track.
    pub fn play_music_with(&mut self, id: impl Into<ClipId>, request: MusicRequest) {
        if let Err(err) = self.try_play_music(id, request) {
            self.diagnostics.report(err);
        }
    }

    /// Crossfade to a track.
    ///
    /// # Errors
    ///
    /// `AudioError::ClipNotFound` if the track is not registered; nothing
    /// changes in that case.
    pub fn try_play_music(
        &mut self,
        id: impl Into<ClipId>,
        request: MusicRequest,
    ) -> AudioResult<MusicChange> {
        self.music.play(&self.music_clips, &id.into(), request)
    }

    /// Fade the music out. `None` uses the default fade.
    pub fn stop_music(&mut self, fade: Option<Duration>) {
        self.music.stop(fade);
    }

    /// Clip on the audible deck, if it is playing.
    #[must_use]
    pub fn current_music(&self) -> Option<&ClipId> {
        self.music.current_clip()
    }

    /// Whether a crossfade or fade-out is running.
    #[must_use]
    pub const fn is_music_transitioning(&self) -> bool {
        self.music.is_transitioning()
    }

    // ------------------------------------------------------------------
    // Sound effects
    // ------------------------------------------------------------------

    /// Play a pooled effect at full volume.
    pub fn play_sfx(&mut self, id: impl Into<ClipId>) {
        self.play_sfx_with(id, SfxRequest::default());
    }

    /// Play a pooled effect at a world position.
    pub fn play_sfx_at(&mut self, id: impl Into<ClipId>, position: Vec3) {
        self.play_sfx_with(id, SfxRequest::default().at(position));
    }

    /// Play an effect on the exclusive voice, cutting off the previous one.
    pub fn play_sfx_persistent(&mut self, id: impl Into<ClipId>) {
        self.play_sfx_with(id, SfxRequest::exclusive());
    }

    /// Play an effect.
    pub fn play_sfx_with(&mut self, id: impl Into<ClipId>, request: SfxRequest) {
        if let Err(err) = self.try_play_sfx(id, request) {
            self.diagnostics.report(err);
        }
    }

    /// Play an effect.
    ///
    /// # Errors
    ///
    /// `AudioError::ClipNotFound` for an unregistered effect,
    /// `AudioError::PoolExhausted` when the pool is at capacity, or the
    /// backend's error when a new pooled voice cannot be created.
    pub fn try_play_sfx(&mut self, id: impl Into<ClipId>, request: SfxRequest) -> AudioResult<()> {
        let clip = self.sfx_clips.lookup(&id.into())?.clone();
        let volume = clamp_volume(request.volume);
        let pitch = clamp_pitch(request.pitch);

        if request.exclusive {
            self.exclusive.play(clip, volume, pitch, request.position);
            return Ok(());
        }

        let backend = &mut self.backend;
        let voice = self.pool.acquire(|| backend.create_voice(VoiceRole::Pooled))?;

        debug!("Playing effect '{}'", clip.id());
        voice.assign(Some(clip));
        voice.set_looping(false);
        voice.set_volume(volume);
        voice.set_pitch(pitch);
        voice.set_position(request.position);
        voice.play();
        Ok(())
    }

    /// Stop every effect, pooled and exclusive.
    pub fn stop_all_sfx(&mut self) {
        self.pool.stop_all();
        self.exclusive.stop();
    }

    /// Pool occupancy.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Change the pool capacity.
    pub fn set_pool_capacity(&mut self, max: usize) {
        self.config.max_pool_voices = max;
        self.pool.set_max_capacity(max);
    }

    // ------------------------------------------------------------------
    // Playlist
    // ------------------------------------------------------------------

    /// Start a playlist. A `fade` of `None` or zero uses the default.
    pub fn start_playlist<I, K>(&mut self, tracks: I, looping: bool, fade: Option<Duration>)
    where
        I: IntoIterator<Item = K>,
        K: Into<ClipId>,
    {
        if let Err(err) = self.try_start_playlist(tracks, looping, fade) {
            self.diagnostics.report(err);
        }
    }

    /// Start a playlist.
    ///
    /// # Errors
    ///
    /// `AudioError::EmptyPlaylist` when `tracks` is empty. A playlist that
    /// is already running is left alone in that case.
    pub fn try_start_playlist<I, K>(
        &mut self,
        tracks: I,
        looping: bool,
        fade: Option<Duration>,
    ) -> AudioResult<Option<TaskHandle>>
    where
        I: IntoIterator<Item = K>,
        K: Into<ClipId>,
    {
        let tracks = tracks.into_iter().map(Into::into).collect();
        let crossfade = fade
            .filter(|f| !f.is_zero())
            .unwrap_or_else(|| self.config.default_fade());
        let mut ctx = PlaylistContext {
            registry: &self.music_clips,
            music: &mut self.music,
            diagnostics: &mut self.diagnostics,
            fallback_wait: self.config.playlist_fallback(),
        };
        self.playlist.start(tracks, looping, crossfade, &mut ctx)
    }

    /// Cancel the playlist. The current track keeps playing.
    pub fn stop_playlist(&mut self) -> bool {
        self.playlist.stop()
    }

    /// The running playlist.
    #[must_use]
    pub fn playlist(&self) -> Option<&PlaylistRun> {
        self.playlist.current()
    }

    // ------------------------------------------------------------------
    // Volume
    // ------------------------------------------------------------------

    /// Set the master bus level.
    pub fn set_master_volume(&mut self, linear: f32) {
        self.set_volume(Bus::Master, linear);
    }

    /// Set the music bus level.
    pub fn set_music_volume(&mut self, linear: f32) {
        self.set_volume(Bus::Music, linear);
    }

    /// Set the effects bus level.
    pub fn set_sfx_volume(&mut self, linear: f32) {
        self.set_volume(Bus::Sfx, linear);
    }

    /// Set a bus level and write it to the mixer.
    pub fn set_volume(&mut self, bus: Bus, linear: f32) {
        let linear = self.volumes.set(bus, linear);
        let name = self.config.buses.for_bus(bus);
        apply_bus(self.backend.mixer(), name, linear_to_db(linear));
    }

    /// Last level set per bus.
    #[must_use]
    pub const fn volumes(&self) -> &VolumeSettings {
        &self.volumes
    }

    fn apply_volumes(&mut self) {
        for bus in [Bus::Master, Bus::Music, Bus::Sfx] {
            self.set_volume(bus, self.volumes.get(bus));
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether a music track is registered under `id`.
    #[must_use]
    pub fn has_music(&self, id: impl Into<ClipId>) -> bool {
        self.music_clips.contains(&id.into())
    }

    /// Whether an effect is registered under `id`.
    #[must_use]
    pub fn has_sfx(&self, id: impl Into<ClipId>) -> bool {
        self.sfx_clips.contains(&id.into())
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Run one tick with the unscaled time since the previous one.
    pub fn advance(&mut self, dt: Duration) {
        for command in self.commands.drain() {
            self.apply(command);
        }
        self.diagnostics.record_overflow(self.commands.dropped());

        self.backend.advance(dt);
        self.clock.tick(dt);

        self.music.advance(dt);

        let mut ctx = PlaylistContext {
            registry: &self.music_clips,
            music: &mut self.music,
            diagnostics: &mut self.diagnostics,
            fallback_wait: self.config.playlist_fallback(),
        };
        self.playlist.advance(&mut ctx, dt);

        self.pool.reconcile();
    }

    /// Run a command immediately.
    pub fn apply(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::PlayMusic { id, request } => self.play_music_with(id, request),
            AudioCommand::StopMusic { fade } => self.stop_music(fade),
            AudioCommand::PlaySfx { id, request } => self.play_sfx_with(id, request),
            AudioCommand::StopAllSfx => self.stop_all_sfx(),
            AudioCommand::StartPlaylist {
                tracks,
                looping,
                fade,
            } => self.start_playlist(tracks, looping, fade),
            AudioCommand::StopPlaylist => {
                self.stop_playlist();
            },
            AudioCommand::SetVolume { bus, linear } => self.set_volume(bus, linear),
        }
    }

    /// A handle for submitting commands from other threads.
    #[must_use]
    pub fn command_sender(&self) -> AudioCommandSender {
        self.commands.sender()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Reported conditions.
    #[must_use]
    pub const fn diagnostics(&self) -> &AudioDiagnostics {
        &self.diagnostics
    }

    /// Accumulated tick time.
    #[must_use]
    pub const fn clock(&self) -> &AudioClock {
        &self.clock
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// The music decks.
    #[must_use]
    pub const fn music(&self) -> &MusicEngine<B::Voice> {
        &self.music
    }

    /// The exclusive effect voice.
    #[must_use]
    pub const fn exclusive_voice(&self) -> &ExclusiveVoice<B::Voice> {
        &self.exclusive
    }

    /// Busy pooled voices.
    pub fn pooled_voices(&self) -> impl Iterator<Item = &B::Voice> {
        self.pool.busy()
    }

    /// Registered music.
    #[must_use]
    pub const fn music_clips(&self) -> &ClipRegistry {
        &self.music_clips
    }

    /// Registered effects.
    #[must_use]
    pub const fn sfx_clips(&self) -> &ClipRegistry {
        &self.sfx_clips
    }

    /// The backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

//! Player lifecycle.
//!
//! Opens the output device (falling back to headless playback), loads the
//! clip library, applies the configured volumes, starts the startup playlist
//! and ticks the audio manager until playback ends or the runtime limit hits.

use std::time::Duration;

use anyhow::Result;
use cadence_kernel::{AudioBackend, AudioManager, VirtualBackend, VirtualMixer};
use tracing::{debug, info, warn};

use crate::assets::ClipLibrary;
use crate::config::EngineConfig;
use crate::device::RodioBackend;
use crate::timing::TickTiming;

/// How often the loop logs a status line.
const STATUS_INTERVAL: Duration = Duration::from_secs(10);

/// Run the player with the default output device.
pub fn run(config: &EngineConfig) -> Result<()> {
    match RodioBackend::new(config.audio.buses.clone()) {
        Ok(backend) => run_with(backend, config),
        Err(e) => {
            warn!("{e}. Continuing without audio output.");
            let backend = VirtualBackend::new().with_mixer(VirtualMixer::for_buses(&config.audio.buses));
            run_with(backend, config)
        },
    }
}

/// Run the player on any backend.
pub fn run_with<B: AudioBackend>(backend: B, config: &EngineConfig) -> Result<()> {
    let mut manager = build_manager(backend, config)?;
    let mut timing = TickTiming::new(config.tick_rate);
    let mut elapsed = Duration::ZERO;
    let mut since_status = Duration::ZERO;

    loop {
        let dt = timing.delta();
        manager.advance(dt);
        elapsed += dt;
        since_status += dt;

        if since_status >= STATUS_INTERVAL {
            since_status = Duration::ZERO;
            info!(
                "Playing {:?}; pool {:?}; avg tick {:.2} ms",
                manager.current_music().map(ToString::to_string),
                manager.pool_stats(),
                timing.average_tick_ms()
            );
        }

        if should_stop(&manager, elapsed, config.max_runtime()) {
            break;
        }
        timing.sleep_remainder();
    }

    let diagnostics = manager.diagnostics();
    info!(
        "Played for {:?} over {} ticks ({} conditions reported)",
        manager.clock().elapsed(),
        manager.clock().ticks(),
        diagnostics.total()
    );
    Ok(())
}

/// Create the manager, register clips, apply volumes and start the playlist.
pub fn build_manager<B: AudioBackend>(backend: B, config: &EngineConfig) -> Result<AudioManager<B>> {
    let mut manager = AudioManager::new(backend, config.audio.clone())?;

    let library = ClipLibrary::load(&config.music_dir, &config.sfx_dir);
    manager.register_music(library.music);
    manager.register_sfx(library.sfx);

    manager.set_master_volume(config.master_volume);
    manager.set_music_volume(config.music_volume);
    manager.set_sfx_volume(config.sfx_volume);

    if !config.startup_playlist.is_empty() {
        manager.start_playlist(
            config.startup_playlist.iter().map(String::as_str),
            config.loop_playlist,
            config.playlist_fade(),
        );
    }
    Ok(manager)
}

/// Whether the loop should exit.
///
/// With a runtime limit, the loop runs until it elapses. Without one, it runs
/// until nothing is left to play.
pub fn should_stop<B: AudioBackend>(
    manager: &AudioManager<B>,
    elapsed: Duration,
    max_runtime: Option<Duration>,
) -> bool {
    if let Some(limit) = max_runtime {
        return elapsed >= limit;
    }
    let idle = manager.current_music().is_none()
        && !manager.is_music_transitioning()
        && manager.playlist().is_none()
        && manager.pool_stats().busy == 0;
    if idle {
        debug!("Nothing left to play");
    }
    idle
}

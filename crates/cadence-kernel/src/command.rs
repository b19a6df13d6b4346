//! Cross-thread audio requests.
//!
//! Voices are only touched on the thread that calls `advance`. Other threads
//! submit [`AudioCommand`]s through an [`AudioCommandSender`]; the queue is
//! drained at the start of every tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cadence_common::ClipId;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

use crate::manager::SfxRequest;
use crate::music::MusicRequest;
use crate::volume::Bus;

/// Default number of commands the queue holds between ticks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// A deferred call on the audio manager.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// Crossfade to a music track.
    PlayMusic {
        /// Track identifier.
        id: ClipId,
        /// Fade, loop and pitch.
        request: MusicRequest,
    },
    /// Fade the music out.
    StopMusic {
        /// Fade length; `None` uses the default.
        fade: Option<Duration>,
    },
    /// Play a sound effect.
    PlaySfx {
        /// Effect identifier.
        id: ClipId,
        /// Voice selection and levels.
        request: SfxRequest,
    },
    /// Stop every effect, pooled and exclusive.
    StopAllSfx,
    /// Start a playlist.
    StartPlaylist {
        /// Track identifiers in order.
        tracks: Vec<ClipId>,
        /// Whether to wrap around.
        looping: bool,
        /// Crossfade; `None` uses the default.
        fade: Option<Duration>,
    },
    /// Cancel the playlist.
    StopPlaylist,
    /// Set a bus level.
    SetVolume {
        /// Target bus.
        bus: Bus,
        /// Linear level in `[0, 1]`.
        linear: f32,
    },
}

/// Clonable handle for submitting commands.
#[derive(Debug, Clone)]
pub struct AudioCommandSender {
    sender: Sender<AudioCommand>,
    dropped: Arc<AtomicU64>,
}

impl AudioCommandSender {
    /// Queue a command. Never blocks; a full queue drops the command and
    /// returns false.
    pub fn send(&self, command: AudioCommand) -> bool {
        match self.sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Audio command queue full, dropped {:?}", command);
                false
            },
            Err(TrySendError::Disconnected(_)) => {
                debug!("Audio command queue closed");
                false
            },
        }
    }

    /// Shorthand for [`AudioCommand::PlayMusic`] with default settings.
    pub fn play_music(&self, id: impl Into<ClipId>) -> bool {
        self.send(AudioCommand::PlayMusic {
            id: id.into(),
            request: MusicRequest::default(),
        })
    }

    /// Shorthand for [`AudioCommand::PlaySfx`] with default settings.
    pub fn play_sfx(&self, id: impl Into<ClipId>) -> bool {
        self.send(AudioCommand::PlaySfx {
            id: id.into(),
            request: SfxRequest::default(),
        })
    }
}

/// Receiving end, owned by the audio manager.
#[derive(Debug)]
pub struct CommandQueue {
    sender: Sender<AudioCommand>,
    receiver: Receiver<AudioCommand>,
    dropped: Arc<AtomicU64>,
    capacity: usize,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl CommandQueue {
    /// Create a queue holding up to `capacity` commands.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// A new sender handle.
    #[must_use]
    pub fn sender(&self) -> AudioCommandSender {
        AudioCommandSender {
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Take every pending command.
    pub fn drain(&self) -> Vec<AudioCommand> {
        self.receiver.try_iter().collect()
    }

    /// Commands dropped since creation.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of pending commands.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Maximum pending commands.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let queue = CommandQueue::default();
        let sender = queue.sender();
        assert!(sender.play_music("theme"));
        assert!(sender.send(AudioCommand::StopPlaylist));

        let commands = queue.drain();
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], AudioCommand::PlayMusic { .. }));
        assert_eq!(commands[1], AudioCommand::StopPlaylist);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_full_queue_drops_and_counts() {
        let queue = CommandQueue::new(2);
        let sender = queue.sender();
        assert!(sender.play_sfx("a"));
        assert!(sender.play_sfx("b"));
        assert!(!sender.play_sfx("c"));
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.drain().len(), 2);
    }

    #[test]
    fn test_sender_works_across_threads() {
        let queue = CommandQueue::default();
        let sender = queue.sender();
        let handle = std::thread::spawn(move || sender.send(AudioCommand::StopAllSfx));
        assert!(handle.join().expect("sender thread"));
        assert_eq!(queue.drain(), vec![AudioCommand::StopAllSfx]);
    }
}

//! # Cadence Kernel
//!
//! Audio resource management and playback scheduling.
//!
//! This crate provides the playback core, independent of any audio device:
//! - Case-insensitive clip registries
//! - A bounded pool of reusable sound-effect voices
//! - A single pre-empting voice for effects that must never overlap
//! - Two music decks with cancellable crossfades and fade-outs
//! - A gapless playlist sequencer
//! - Linear-to-decibel bus volume control
//!
//! ## Architecture
//!
//! Everything runs on one thread, driven by [`AudioManager::advance`] once per
//! tick with the unscaled time since the previous tick. Timed work is modelled
//! as tasks held in single-occupancy slots; replacing a task is how it is
//! cancelled. Other threads submit requests through an
//! [`AudioCommandSender`], which the manager drains at the start of a tick.
//!
//! ## Backends
//!
//! The kernel never touches a device. An [`AudioBackend`] hands out voices and
//! optionally a mixer. [`VirtualBackend`] plays against a virtual timeline and
//! is what the tests run on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod clip;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod exclusive;
pub mod manager;
pub mod music;
pub mod playlist;
pub mod pool;
pub mod registry;
pub mod scheduler;
pub mod virtual_backend;
pub mod voice;
pub mod volume;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clip::*;
    pub use crate::command::*;
    pub use crate::config::*;
    pub use crate::diagnostics::*;
    pub use crate::exclusive::*;
    pub use crate::manager::*;
    pub use crate::music::*;
    pub use crate::playlist::*;
    pub use crate::pool::*;
    pub use crate::registry::*;
    pub use crate::scheduler::*;
    pub use crate::virtual_backend::*;
    pub use crate::voice::*;
    pub use crate::volume::*;
}

pub use prelude::*;

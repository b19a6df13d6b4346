//! # Cadence Engine
//!
//! Device and file plumbing around the Cadence audio kernel.
//!
//! This crate provides:
//! - A rodio output backend for the kernel's voice and mixer traits
//! - Clip loading from music and sound-effect directories
//! - TOML player configuration
//! - Tick pacing and the player run loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod assets;
pub mod config;
pub mod device;
pub mod timing;

pub use config::EngineConfig;

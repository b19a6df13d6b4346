//! Counters for locally recovered audio conditions.

use cadence_common::AudioError;
use tracing::warn;

/// Tally of reported conditions.
///
/// Nothing the playback core reports is fatal. Each condition is logged once
/// at `warn` level and counted here so callers can inspect it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioDiagnostics {
    /// Requests naming an unregistered clip.
    pub clip_not_found: u64,
    /// Effect requests dropped because the pool was exhausted.
    pub pool_exhausted: u64,
    /// Playlists started without tracks.
    pub empty_playlist: u64,
    /// Commands dropped because the queue was full.
    pub queue_overflow: u64,
    /// Most recent reported error.
    pub last_error: Option<AudioError>,
}

impl AudioDiagnostics {
    /// Log and count a condition.
    pub fn report(&mut self, err: AudioError) {
        warn!("{}", err);
        match &err {
            AudioError::ClipNotFound { .. } => self.clip_not_found += 1,
            AudioError::PoolExhausted { .. } => self.pool_exhausted += 1,
            AudioError::EmptyPlaylist => self.empty_playlist += 1,
            _ => {},
        }
        self.last_error = Some(err);
    }

    /// Fold in the sender-side drop counter.
    pub fn record_overflow(&mut self, dropped_total: u64) {
        if dropped_total > self.queue_overflow {
            warn!(
                "Audio command queue dropped {} commands",
                dropped_total - self.queue_overflow
            );
            self.queue_overflow = dropped_total;
        }
    }

    /// Total conditions reported.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.clip_not_found + self.pool_exhausted + self.empty_playlist + self.queue_overflow
    }
}

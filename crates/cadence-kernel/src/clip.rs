//! Clip handles and decoded sample data.
//!
//! A [`ClipHandle`] is the opaque reference the rest of the kernel passes
//! around. It is cheap to clone and immutable once built:
//!
//! ```text
//! ┌─────────────┐      ┌────────────┐
//! │ ClipHandle  │──Arc─│ ClipData   │── id, duration, Option<PcmBuffer>
//! └─────────────┘      └────────────┘
//! ```
//!
//! Headless clips carry only a duration; device backends need the PCM buffer.

use std::sync::Arc;
use std::time::Duration;

use cadence_common::ClipId;

/// Decoded, interleaved f32 samples.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    /// Audio sample data (interleaved).
    pub samples: Arc<Vec<f32>>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
}

impl PcmBuffer {
    /// Create a new buffer from samples.
    #[must_use]
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
            channels,
        }
    }

    /// Get the number of samples per channel.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Playback length at normal pitch.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    /// Get the size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.samples.len() * std::mem::size_of::<f32>()
    }
}

#[derive(Debug)]
struct ClipData {
    id: ClipId,
    duration: Duration,
    pcm: Option<PcmBuffer>,
}

/// Shared, immutable reference to a registered clip.
#[derive(Debug, Clone)]
pub struct ClipHandle(Arc<ClipData>);

impl ClipHandle {
    /// A clip with a known length and no sample data.
    #[must_use]
    pub fn silent(id: impl Into<ClipId>, duration: Duration) -> Self {
        Self(Arc::new(ClipData {
            id: id.into(),
            duration,
            pcm: None,
        }))
    }

    /// A clip backed by decoded samples; duration comes from the buffer.
    #[must_use]
    pub fn from_pcm(id: impl Into<ClipId>, pcm: PcmBuffer) -> Self {
        Self(Arc::new(ClipData {
            id: id.into(),
            duration: pcm.duration(),
            pcm: Some(pcm),
        }))
    }

    /// Clip identifier.
    #[must_use]
    pub fn id(&self) -> &ClipId {
        &self.0.id
    }

    /// Playback length at normal pitch.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.0.duration
    }

    /// Decoded samples, if any.
    #[must_use]
    pub fn pcm(&self) -> Option<&PcmBuffer> {
        self.0.pcm.as_ref()
    }

    /// Whether two handles refer to the same clip.
    #[must_use]
    pub fn same_clip(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.id == other.0.id
    }
}

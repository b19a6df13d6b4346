//! Pooled sound-effect voices.
//!
//! Voices live in exactly one of two sets: *free* (idle, ready for reuse) or
//! *busy* (handed out, possibly still playing). The pool grows lazily up to
//! its capacity and shrinks only when finished voices are reclaimed.
//!
//! ```text
//!   acquire()                       reconcile() (once per tick)
//! ┌──────────┐  pop / create   ┌──────────┐  finished?  ┌──────────┐
//! │   free   │ ──────────────▶ │   busy   │ ──────────▶ │ free or  │
//! └──────────┘                 └──────────┘             │ dropped  │
//!                                                       └──────────┘
//! ```

use cadence_common::{AudioError, AudioResult};
use tracing::{debug, trace};

use crate::voice::Voice;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Idle voices ready for reuse.
    pub free: usize,
    /// Voices handed out and not yet reclaimed.
    pub busy: usize,
    /// Upper bound on free + busy.
    pub capacity: usize,
    /// Voices created over the pool's lifetime.
    pub created: usize,
    /// Voices dropped during reclaim.
    pub destroyed: usize,
}

impl PoolStats {
    /// Voices currently alive.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.free + self.busy
    }
}

/// Bounded pool of reusable voices.
#[derive(Debug)]
pub struct SourcePool<V> {
    free: Vec<V>,
    busy: Vec<V>,
    max_capacity: usize,
    created: usize,
    destroyed: usize,
}

impl<V: Voice> SourcePool<V> {
    /// Create an empty pool.
    #[must_use]
    pub fn new(max_capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            busy: Vec::new(),
            max_capacity,
            created: 0,
            destroyed: 0,
        }
    }

    /// Hand out a voice, creating one with `create` if the pool is below
    /// capacity and has nothing free.
    ///
    /// # Errors
    ///
    /// [`AudioError::PoolExhausted`] at capacity; otherwise whatever `create`
    /// returned.
    pub fn acquire<F>(&mut self, create: F) -> AudioResult<&mut V>
    where
        F: FnOnce() -> AudioResult<V>,
    {
        let voice = match self.free.pop() {
            Some(voice) => voice,
            None if self.free.len() + self.busy.len() < self.max_capacity => {
                let voice = create()?;
                self.created += 1;
                debug!(
                    "Pool grew to {} voices (max {})",
                    self.busy.len() + 1,
                    self.max_capacity
                );
                voice
            },
            None => {
                return Err(AudioError::PoolExhausted {
                    capacity: self.max_capacity,
                })
            },
        };
        self.busy.push(voice);
        let last = self.busy.len() - 1;
        Ok(&mut self.busy[last])
    }

    /// Reclaim every busy voice that has finished playing. Returns how many
    /// were reclaimed.
    pub fn reconcile(&mut self) -> usize {
        let mut reclaimed = 0;
        let mut idx = 0;
        while idx < self.busy.len() {
            if self.busy[idx].is_playing() {
                idx += 1;
                continue;
            }
            let voice = self.busy.swap_remove(idx);
            self.release(voice);
            reclaimed += 1;
        }
        if reclaimed > 0 {
            trace!("Reclaimed {} pooled voices", reclaimed);
        }
        reclaimed
    }

    /// Return a voice taken out of `busy`. The voice is kept only while the
    /// pool, counted without it, is below capacity; otherwise it is dropped.
    fn release(&mut self, mut voice: V) {
        voice.stop();
        voice.assign(None);
        voice.set_position(None);
        if self.free.len() + self.busy.len() < self.max_capacity {
            self.free.push(voice);
        } else {
            self.destroyed += 1;
            debug!("Dropped surplus pooled voice (max {})", self.max_capacity);
        }
    }

    /// Stop every busy voice. They are reclaimed on the next pass.
    pub fn stop_all(&mut self) {
        for voice in &mut self.busy {
            voice.stop();
        }
    }

    /// Change the capacity. Lowering it never drops busy voices; surplus ones
    /// are pruned as they finish. Surplus free voices are dropped now.
    pub fn set_max_capacity(&mut self, max_capacity: usize) {
        self.max_capacity = max_capacity;
        while !self.free.is_empty() && self.free.len() + self.busy.len() > max_capacity {
            self.free.pop();
            self.destroyed += 1;
        }
    }

    /// Upper bound on free + busy.
    #[must_use]
    pub const fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Busy voices.
    pub fn busy(&self) -> impl Iterator<Item = &V> {
        self.busy.iter()
    }

    /// Occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            free: self.free.len(),
            busy: self.busy.len(),
            capacity: self.max_capacity,
            created: self.created,
            destroyed: self.destroyed,
        }
    }
}

//! Tick timing.
//!
//! Measures unscaled wall-clock deltas between audio ticks and paces the loop
//! to the configured tick rate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Largest delta handed to the audio manager after a stall.
pub const MAX_TICK_DELTA: Duration = Duration::from_millis(250);

/// Tick pacing and delta measurement.
#[derive(Debug)]
pub struct TickTiming {
    /// Target ticks per second
    tick_rate: u32,
    /// Time budget per tick
    tick_budget: Duration,
    /// Start of the current tick
    last_tick: Instant,
    /// Largest delta returned
    max_delta: Duration,
    /// Recent deltas for averaging
    deltas: VecDeque<Duration>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Default for TickTiming {
    fn default() -> Self {
        Self::new(60)
    }
}

impl TickTiming {
    /// Create timing for `tick_rate` ticks per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            tick_budget: Duration::from_secs_f64(1.0 / f64::from(tick_rate)),
            last_tick: Instant::now(),
            max_delta: MAX_TICK_DELTA,
            deltas: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Time since the previous call, clamped to the maximum delta.
    pub fn delta(&mut self) -> Duration {
        let now = Instant::now();
        let dt = (now - self.last_tick).min(self.max_delta);
        self.last_tick = now;

        self.deltas.push_back(dt);
        if self.deltas.len() > self.max_samples {
            self.deltas.pop_front();
        }
        dt
    }

    /// Sleep for whatever is left of the tick budget.
    pub fn sleep_remainder(&self) {
        let elapsed = self.last_tick.elapsed();
        if elapsed < self.tick_budget {
            std::thread::sleep(self.tick_budget - elapsed);
        }
    }

    /// Average delta in milliseconds over recent ticks.
    #[must_use]
    pub fn average_tick_ms(&self) -> f32 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        let total: Duration = self.deltas.iter().sum();
        total.as_secs_f32() * 1000.0 / self.deltas.len() as f32
    }

    /// Target ticks per second.
    #[must_use]
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Time budget per tick.
    #[must_use]
    pub const fn tick_budget(&self) -> Duration {
        self.tick_budget
    }

    /// Restart measurement (after a pause or a long load).
    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
        self.deltas.clear();
    }
}

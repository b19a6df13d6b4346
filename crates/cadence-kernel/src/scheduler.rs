//! Cooperative task scheduling.
//!
//! Timed work (fades, crossfades, playlist waits) runs as [`TimedTask`]s held
//! in a [`TaskSlot`]. A slot holds at most one task of its kind; scheduling a
//! new one drops the old one before it can take another step, which is the
//! only cancellation mechanism there is.
//!
//! Tasks apply their initial state synchronously when scheduled and receive
//! their first delta on the following tick.

use std::time::Duration;

use tracing::trace;

/// Outcome of running a task step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The task wants another step next tick.
    Pending,
    /// The task finished and will be removed.
    Complete,
}

/// A task stepped once per tick against a context.
pub trait TimedTask<C: ?Sized> {
    /// Apply the state at elapsed time zero.
    fn start(&mut self, ctx: &mut C) -> Step;

    /// Advance by `dt` of unscaled time.
    fn step(&mut self, ctx: &mut C, dt: Duration) -> Step;
}

/// Identity of one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    slot: &'static str,
    generation: u64,
}

impl TaskHandle {
    /// Name of the slot this task was scheduled in.
    #[must_use]
    pub const fn slot(&self) -> &'static str {
        self.slot
    }

    /// Generation counter within that slot.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Holds at most one task of a kind.
#[derive(Debug)]
pub struct TaskSlot<T> {
    name: &'static str,
    task: Option<T>,
    generation: u64,
}

impl<T> TaskSlot<T> {
    /// Create an empty slot.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            task: None,
            generation: 0,
        }
    }

    /// Cancel any running task, then start `task`.
    ///
    /// Returns `None` when the task completed during `start` and was never
    /// stored.
    pub fn schedule<C: ?Sized>(&mut self, mut task: T, ctx: &mut C) -> Option<TaskHandle>
    where
        T: TimedTask<C>,
    {
        self.cancel();
        self.generation += 1;
        let handle = self.current_handle();
        match task.start(ctx) {
            Step::Pending => {
                trace!("Scheduled {} task #{}", self.name, self.generation);
                self.task = Some(task);
                Some(handle)
            },
            Step::Complete => {
                trace!("{} task #{} completed on start", self.name, self.generation);
                None
            },
        }
    }

    /// Drop the running task, if any. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.task.take().is_some();
        if cancelled {
            trace!("Cancelled {} task #{}", self.name, self.generation);
        }
        cancelled
    }

    /// Step the running task. Returns the step outcome, or `None` if the slot
    /// was empty.
    pub fn advance<C: ?Sized>(&mut self, ctx: &mut C, dt: Duration) -> Option<Step>
    where
        T: TimedTask<C>,
    {
        let task = self.task.as_mut()?;
        let step = task.step(ctx, dt);
        if step == Step::Complete {
            trace!("{} task #{} completed", self.name, self.generation);
            self.task = None;
        }
        Some(step)
    }

    /// Whether a task is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// Handle of the running task.
    #[must_use]
    pub fn handle(&self) -> Option<TaskHandle> {
        self.task.as_ref().map(|_| self.current_handle())
    }

    /// Whether `handle` names the task currently running.
    #[must_use]
    pub fn is_current(&self, handle: TaskHandle) -> bool {
        self.handle() == Some(handle)
    }

    /// The running task.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.task.as_ref()
    }

    const fn current_handle(&self) -> TaskHandle {
        TaskHandle {
            slot: self.name,
            generation: self.generation,
        }
    }
}

/// Unscaled time accumulated across ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioClock {
    elapsed: Duration,
    ticks: u64,
}

impl AudioClock {
    /// Record one tick.
    pub fn tick(&mut self, dt: Duration) {
        self.elapsed += dt;
        self.ticks += 1;
    }

    /// Total unscaled time.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of ticks recorded.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Fraction of `duration` covered by `elapsed`, clamped to `[0, 1]`.
/// A zero duration is complete immediately.
#[must_use]
pub fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

/// Linear interpolation.
#[must_use]
pub fn lerp(from: f32, to: f32, k: f32) -> f32 {
    from + (to - from) * k
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts down and records every step it sees.
    struct Countdown {
        remaining: u32,
    }

    impl TimedTask<Vec<Duration>> for Countdown {
        fn start(&mut self, log: &mut Vec<Duration>) -> Step {
            log.push(Duration::ZERO);
            if self.remaining == 0 {
                Step::Complete
            } else {
                Step::Pending
            }
        }

        fn step(&mut self, log: &mut Vec<Duration>, dt: Duration) -> Step {
            log.push(dt);
            self.remaining -= 1;
            if self.remaining == 0 {
                Step::Complete
            } else {
                Step::Pending
            }
        }
    }

    #[test]
    fn test_task_runs_to_completion() {
        let mut slot = TaskSlot::new("countdown");
        let mut log = Vec::new();
        let dt = Duration::from_millis(16);

        assert!(slot.schedule(Countdown { remaining: 2 }, &mut log).is_some());
        assert_eq!(slot.advance(&mut log, dt), Some(Step::Pending));
        assert_eq!(slot.advance(&mut log, dt), Some(Step::Complete));
        assert_eq!(slot.advance(&mut log, dt), None);
        assert_eq!(log, vec![Duration::ZERO, dt, dt]);
    }

    #[test]
    fn test_schedule_replaces_running_task() {
        let mut slot = TaskSlot::new("countdown");
        let mut log = Vec::new();

        let first = slot.schedule(Countdown { remaining: 5 }, &mut log).expect("pending");
        let second = slot.schedule(Countdown { remaining: 1 }, &mut log).expect("pending");

        assert_ne!(first, second);
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
        assert_eq!(slot.get().map(|t| t.remaining), Some(1));
    }

    #[test]
    fn test_complete_on_start_is_not_stored() {
        let mut slot = TaskSlot::new("countdown");
        let mut log = Vec::new();
        assert!(slot.schedule(Countdown { remaining: 0 }, &mut log).is_none());
        assert!(!slot.is_active());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut slot = TaskSlot::new("countdown");
        let mut log = Vec::new();
        slot.schedule(Countdown { remaining: 3 }, &mut log);
        assert!(slot.cancel());
        assert!(!slot.cancel());
        assert_eq!(slot.advance(&mut log, Duration::from_millis(16)), None);
    }

    #[test]
    fn test_progress_and_lerp() {
        let total = Duration::from_secs(2);
        assert!((progress(Duration::from_secs(1), total) - 0.5).abs() < 1e-6);
        assert!((progress(Duration::from_secs(5), total) - 1.0).abs() < 1e-6);
        assert!((progress(Duration::ZERO, Duration::ZERO) - 1.0).abs() < 1e-6);
        assert!((lerp(1.0, 0.0, 0.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_clock_accumulates() {
        let mut clock = AudioClock::default();
        clock.tick(Duration::from_millis(10));
        clock.tick(Duration::from_millis(20));
        assert_eq!(clock.elapsed(), Duration::from_millis(30));
        assert_eq!(clock.ticks(), 2);
    }
}

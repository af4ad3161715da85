//! Ownership of the tick timer task.
//!
//! At most one timer task exists per engine. Every arm or cancel bumps a
//! generation counter; a timer task carries the generation it was spawned
//! with and exits as soon as the scheduler has moved on. Together with
//! aborting the task handle this means a timer that was already waking up
//! when `stop` or `reset` ran can never tick.

use tokio::task::JoinHandle;

/// Timer bookkeeping, guarded by the engine lock.
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Handle of the armed timer task, if any.
    handle: Option<JoinHandle<()>>,
    /// Incremented on every arm and cancel.
    generation: u64,
}

impl Scheduler {
    /// Scheduler with no timer armed.
    pub const fn new() -> Self {
        Self {
            handle: None,
            generation: 0,
        }
    }

    /// Cancel any armed timer and return the generation a new timer task
    /// must carry.
    pub fn next_generation(&mut self) -> u64 {
        self.cancel();
        self.generation
    }

    /// Record the handle of the timer task spawned for the current
    /// generation.
    pub fn arm(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.handle.replace(handle) {
            previous.abort();
        }
    }

    /// Invalidate the current generation and abort the armed timer.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Forget the armed timer without aborting it. Used by the timer task
    /// itself when it ends on its own.
    pub fn release(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.handle = None;
        }
    }

    /// Whether a timer spawned with `generation` is still the live one.
    pub const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Whether a timer task is armed.
    pub const fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

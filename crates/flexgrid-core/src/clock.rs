//! Simulation clock: tick counter and simulated calendar.
//!
//! The tick counter is the source of truth for event scheduling and the
//! time multiplier. Simulated time (in years) advances by a variable amount
//! each tick, decided by the growth model.
//!
//! All tick arithmetic is checked; the counter never wraps.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Tick counter plus simulated years.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    /// Ticks executed since the last reset.
    tick: u64,

    /// Simulated years, never negative.
    current_time: f64,
}

impl SimulationClock {
    /// Create a clock at tick 0 and the given simulated time.
    ///
    /// Negative or non-finite start times are clamped to zero.
    pub fn new(initial_time: f64) -> Self {
        Self {
            tick: 0,
            current_time: non_negative(initial_time),
        }
    }

    /// Advance the tick counter by one. Returns the new tick number.
    ///
    /// Time does not move here; call [`SimulationClock::advance_time`] with
    /// the years the growth model assigns to the new tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Move simulated time forward by `years`.
    pub fn advance_time(&mut self, years: f64) {
        self.current_time = non_negative(self.current_time + years);
    }

    /// Jump simulated time to `years`, clamped to zero.
    pub fn set_time(&mut self, years: f64) {
        self.current_time = non_negative(years);
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the current simulated time in years.
    pub const fn current_time(&self) -> f64 {
        self.current_time
    }
}

/// Clamp to `[0, inf)`, mapping NaN to zero.
fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

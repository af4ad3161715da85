//! The public engine handle.
//!
//! [`GameEngine`] is a cheap, cloneable handle. All clones share one
//! simulation behind one lock, one timer task, and one listener registry.
//!
//! # Locking
//!
//! Ticks, tool writes, overrides, and lifecycle commands each take the
//! engine lock once, mutate, copy out a snapshot, and release the lock
//! before listeners run. A listener may therefore call any engine method.
//! A poisoned lock is recovered; the simulation holds no invariant that a
//! panicking listener could break, since listeners never run under it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use flexgrid_types::{EngineStatus, GameSnapshot};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::catalog::{EventDefinition, ToolDefinition};
use crate::config::{ConfigError, GameConfig};
use crate::scheduler::Scheduler;
use crate::subscription::{Listeners, Subscription};
use crate::tick::{Simulation, TickError};
use crate::tools::ToolWrite;

/// Errors returned by [`GameEngine`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration cannot drive a game.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A manually requested tick failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// The engine was built outside a tokio runtime, so it has nowhere to
    /// spawn its timer.
    #[error("no tokio runtime available to drive the tick timer: {source}")]
    NoRuntime {
        /// The underlying runtime lookup error.
        #[from]
        source: tokio::runtime::TryCurrentError,
    },
}

/// Everything the lock guards.
#[derive(Debug)]
struct EngineCore {
    simulation: Simulation,
    scheduler: Scheduler,
}

/// State shared by every clone of a [`GameEngine`].
#[derive(Debug)]
struct Shared {
    core: Mutex<EngineCore>,
    listeners: Arc<Listeners>,
    runtime: Handle,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.core
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .scheduler
            .cancel();
    }
}

/// Handle to a running game.
#[derive(Debug, Clone)]
pub struct GameEngine {
    shared: Arc<Shared>,
}

impl GameEngine {
    /// Build an engine over the built-in catalogs.
    ///
    /// Must be called from within a tokio runtime. When
    /// `engine.auto_start` is set the timer is armed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoRuntime`] outside a tokio runtime, or
    /// [`EngineError::Config`] if the configuration is invalid.
    pub fn new(config: GameConfig) -> Result<Self, EngineError> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_simulation(Simulation::new(config)?, runtime))
    }

    /// Build an engine over custom event and tool catalogs.
    ///
    /// # Errors
    ///
    /// Same as [`GameEngine::new`].
    pub fn with_catalogs(
        config: GameConfig,
        events: &'static [EventDefinition],
        tools: &'static [ToolDefinition],
    ) -> Result<Self, EngineError> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_simulation(
            Simulation::with_catalogs(config, events, tools)?,
            runtime,
        ))
    }

    fn with_simulation(simulation: Simulation, runtime: Handle) -> Self {
        let auto_start = simulation.config().engine.auto_start;
        let engine = Self {
            shared: Arc::new(Shared {
                core: Mutex::new(EngineCore {
                    simulation,
                    scheduler: Scheduler::new(),
                }),
                listeners: Arc::new(Listeners::new()),
                runtime,
            }),
        };
        if auto_start {
            engine.start();
        }
        engine
    }

    /// Arm the tick timer. A logged no-op when already running or after
    /// game over.
    pub fn start(&self) {
        let mut core = self.shared.lock();
        match core.simulation.status() {
            EngineStatus::Running => {
                warn!("engine already running");
                return;
            }
            EngineStatus::GameOver => {
                warn!("game is over; reset before starting");
                return;
            }
            EngineStatus::Stopped => {}
        }

        core.simulation.set_status(EngineStatus::Running);
        let generation = core.scheduler.next_generation();
        let handle = self
            .shared
            .runtime
            .spawn(run_timer(Arc::downgrade(&self.shared), generation));
        core.scheduler.arm(handle);
        info!(
            tick = core.simulation.state().clock.tick(),
            interval_ms = duration_ms(core.simulation.tick_interval()),
            listeners = self.shared.listeners.len(),
            "engine started"
        );
        if self.shared.listeners.is_empty() {
            debug!("no state callbacks registered; snapshots reach broadcast receivers only");
        }
    }

    /// Cancel the pending tick. State is preserved.
    pub fn stop(&self) {
        let mut core = self.shared.lock();
        let had_pending_tick = core.scheduler.is_armed();
        core.scheduler.cancel();
        core.simulation.set_status(EngineStatus::Stopped);
        info!(
            tick = core.simulation.state().clock.tick(),
            had_pending_tick,
            "engine stopped"
        );
    }

    /// Cancel the pending tick and return to the configured initial state.
    pub fn reset(&self) {
        let mut core = self.shared.lock();
        core.scheduler.cancel();
        core.simulation.reset();
        info!("engine reset");
    }

    /// Run one tick immediately, independent of the timer, and publish it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Tick`] once the game is over or the tick
    /// counter is exhausted; state is unchanged in that case.
    pub fn step(&self) -> Result<GameSnapshot, EngineError> {
        let snapshot = {
            let mut core = self.shared.lock();
            let summary = core.simulation.run_tick()?;
            if core.simulation.status() == EngineStatus::GameOver {
                core.scheduler.cancel();
            }
            debug!(tick = summary.tick, "manual tick");
            core.simulation.snapshot()
        };
        self.shared.listeners.publish(&snapshot);
        Ok(snapshot)
    }

    /// Write a tool value. The grid is rebalanced and a snapshot published
    /// right away unless the value was rejected.
    pub fn set_tool_value(&self, tool_id: &str, value: f64) -> ToolWrite {
        let (outcome, snapshot) = {
            let mut core = self.shared.lock();
            let outcome = core.simulation.set_tool_value(tool_id, value);
            let snapshot = outcome.stored().then(|| core.simulation.snapshot());
            (outcome, snapshot)
        };
        if let Some(snapshot) = snapshot {
            self.shared.listeners.publish(&snapshot);
        }
        outcome
    }

    /// Overwrite the population (negative values clamp to zero).
    pub fn set_population(&self, population: f64) {
        self.mutate_and_publish(|simulation| simulation.set_population(population));
    }

    /// Shift the population by `delta` (result clamps to zero).
    pub fn adjust_population(&self, delta: f64) {
        self.mutate_and_publish(|simulation| simulation.adjust_population(delta));
    }

    /// Overwrite simulated time in years (negative values clamp to zero).
    pub fn set_time(&self, years: f64) {
        self.mutate_and_publish(|simulation| simulation.set_time(years));
    }

    /// Owned copy of the current state.
    pub fn state(&self) -> GameSnapshot {
        self.shared.lock().simulation.snapshot()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> EngineStatus {
        self.shared.lock().simulation.status()
    }

    /// Delay the timer will wait before the next tick.
    pub fn current_tick_interval(&self) -> Duration {
        self.shared.lock().simulation.tick_interval()
    }

    /// Register a callback for every published snapshot.
    pub fn on_state_update<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&GameSnapshot) + Send + Sync + 'static,
    {
        self.shared.listeners.register(callback)
    }

    /// Receiver for the published snapshot stream.
    pub fn subscribe(&self) -> broadcast::Receiver<GameSnapshot> {
        self.shared.listeners.subscribe()
    }

    fn mutate_and_publish(&self, mutate: impl FnOnce(&mut Simulation)) {
        let snapshot = {
            let mut core = self.shared.lock();
            mutate(&mut core.simulation);
            core.simulation.snapshot()
        };
        self.shared.listeners.publish(&snapshot);
    }
}

/// Timer loop for one generation: sleep, tick, publish, repeat while the
/// scheduler still owns this generation and the game is running.
async fn run_timer(weak: Weak<Shared>, generation: u64) {
    loop {
        let interval = {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let core = shared.lock();
            if !is_live(&core, generation) {
                return;
            }
            core.simulation.tick_interval()
        };

        tokio::time::sleep(interval).await;

        let Some(shared) = weak.upgrade() else {
            return;
        };
        let snapshot = {
            let mut core = shared.lock();
            if !is_live(&core, generation) {
                return;
            }
            match core.simulation.run_tick() {
                Ok(summary) => {
                    if core.simulation.status() == EngineStatus::GameOver {
                        core.scheduler.release(generation);
                        info!(tick = summary.tick, "timer halted by game over");
                    }
                }
                Err(e) => {
                    error!(error = %e, "tick failed, stopping timer");
                    core.simulation.set_status(EngineStatus::Stopped);
                    core.scheduler.release(generation);
                    return;
                }
            }
            core.simulation.snapshot()
        };
        shared.listeners.publish(&snapshot);
    }
}

/// Whether a timer of `generation` may still tick.
fn is_live(core: &EngineCore, generation: u64) -> bool {
    core.scheduler.is_current(generation) && core.simulation.status() == EngineStatus::Running
}

/// Whole milliseconds, saturating.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seeded() -> GameConfig {
        let mut config = GameConfig::default();
        config.engine.seed = Some(9);
        config
    }

    #[test]
    fn construction_needs_a_runtime() {
        assert!(matches!(
            GameEngine::new(seeded()),
            Err(EngineError::NoRuntime { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_config_is_reported() {
        let mut config = seeded();
        config.events.check_interval_ticks = 0;
        assert!(matches!(
            GameEngine::new(config),
            Err(EngineError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn start_and_stop_toggle_status() {
        let engine = GameEngine::new(seeded()).unwrap();
        assert_eq!(engine.status(), EngineStatus::Stopped);
        engine.start();
        assert_eq!(engine.status(), EngineStatus::Running);
        assert!(engine.state().is_running);
        engine.start();
        assert_eq!(engine.status(), EngineStatus::Running);
        engine.stop();
        assert_eq!(engine.status(), EngineStatus::Stopped);
    }

    #[tokio::test]
    async fn auto_start_arms_the_timer() {
        let mut config = seeded();
        config.engine.auto_start = true;
        let engine = GameEngine::new(config).unwrap();
        assert_eq!(engine.status(), EngineStatus::Running);
        engine.stop();
    }

    #[tokio::test]
    async fn clones_share_state() {
        let engine = GameEngine::new(seeded()).unwrap();
        let other = engine.clone();
        engine.step().unwrap();
        assert_eq!(other.state().tick_count, 1);
    }

    #[tokio::test]
    async fn rejected_tool_write_does_not_publish() {
        let engine = GameEngine::new(seeded()).unwrap();
        let mut rx = engine.subscribe();
        assert_eq!(engine.set_tool_value("ev-charging", f64::NAN), ToolWrite::Ignored);
        assert!(rx.try_recv().is_err());
        engine.set_tool_value("ev-charging", 0.05);
        assert_eq!(rx.try_recv().unwrap().tool_states.get("ev-charging"), Some(&0.05));
    }
}

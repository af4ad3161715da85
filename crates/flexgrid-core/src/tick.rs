//! Tick cycle: the single-threaded state machine behind the engine.
//!
//! Each tick runs these steps in order:
//!
//! 1. **Clock** -- increment the tick counter (checked).
//! 2. **Growth** -- compute the time multiplier, advance simulated time,
//!    and recompute population from the closed form plus noise.
//! 3. **Events** -- expire closed events, admit a new one on check ticks.
//! 4. **Network** -- recompute demand, supply, and capacity factor.
//! 5. **Warnings** -- feed the capacity factor to the warning machine;
//!    the final warning flips the status to game over.
//! 6. **Cadence** -- recompute the interval before the next tick.
//!
//! External writes (tool values, population and time overrides) only redo
//! step 4. The warning machine reacts on the next tick.
//!
//! Given the same seed, configuration, and inputs the tick sequence is
//! reproducible.

use std::time::Duration;

use flexgrid_types::{EngineStatus, GameSnapshot, GridBand, Impact};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::catalog::{self, EventDefinition, ToolDefinition};
use crate::clock::{ClockError, SimulationClock};
use crate::config::{ConfigError, GameConfig};
use crate::events::{EventManager, EventUpdate};
use crate::growth::GrowthModel;
use crate::network::{BalanceFactors, NetworkModel, NetworkReading};
use crate::tools::{ToolRegistry, ToolWrite};
use crate::warning::{self, WarningOutcome, WarningStateMachine};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The final warning has fired; only a reset can resume play.
    #[error("game over: reset before ticking again")]
    GameOver,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated years after the tick.
    pub current_time: f64,
    /// Population after the tick.
    pub population: f64,
    /// Capacity factor after the tick.
    pub capacity_factor: f64,
    /// Band of that capacity factor.
    pub band: GridBand,
    /// Event expiries and admissions.
    pub events: EventUpdate,
    /// Warning machine result.
    pub warning: WarningOutcome,
    /// Delay before the next tick.
    pub next_interval: Duration,
}

/// Scalar game state mutated by ticks and overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    /// Tick counter and simulated years.
    pub clock: SimulationClock,
    /// Current population, never negative.
    pub current_population: f64,
    /// Time multiplier of the latest tick.
    pub time_multiplier: f64,
    /// Population relative to the initial population.
    pub population_multiplier: f64,
    /// Latest network computation.
    pub reading: NetworkReading,
    /// Delay before the next scheduled tick.
    pub tick_interval: Duration,
    /// Lifecycle state, written by the scheduler and the warning machine.
    pub status: EngineStatus,
}

/// Every component of one game, plus its random source.
#[derive(Debug)]
pub struct Simulation {
    config: GameConfig,
    growth: GrowthModel,
    network: NetworkModel,
    events: EventManager,
    tools: ToolRegistry,
    warnings: WarningStateMachine,
    rng: SmallRng,
    state: SimulationState,
}

impl Simulation {
    /// Build a simulation over the built-in catalogs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration cannot drive a
    /// game.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_catalogs(config, catalog::ALL_EVENTS, catalog::ALL_TOOLS)
    }

    /// Build a simulation over custom event and tool catalogs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration cannot drive a
    /// game.
    pub fn with_catalogs(
        config: GameConfig,
        events: &'static [EventDefinition],
        tools: &'static [ToolDefinition],
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let growth = GrowthModel::new(&config);
        let network = NetworkModel::new(&config.grid);
        let events = EventManager::with_catalog(events, config.events.check_interval_ticks);
        let tools = ToolRegistry::with_catalog(tools);
        let rng = config
            .engine
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        let state = initial_state(&config, &growth, &network);

        info!(
            initial_population = growth.initial_population(),
            growth_rate = growth.growth_rate(),
            seeded = config.engine.seed.is_some(),
            "simulation initialised"
        );

        Ok(Self {
            config,
            growth,
            network,
            events,
            tools,
            warnings: WarningStateMachine::new(),
            rng,
            state,
        })
    }

    /// Run one full tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::GameOver`] without touching state once the game
    /// has ended, or [`TickError::Clock`] if the tick counter is exhausted.
    pub fn run_tick(&mut self) -> Result<TickSummary, TickError> {
        if self.state.status == EngineStatus::GameOver {
            return Err(TickError::GameOver);
        }

        // 1. Clock
        let tick = self.state.clock.advance()?;

        // 2. Growth
        let step = self.growth.step(tick);
        self.state.time_multiplier = step.time_multiplier;
        self.state.clock.advance_time(step.years_advanced);
        let current_time = self.state.clock.current_time();
        self.state.current_population = self.growth.sample_population(current_time, &mut self.rng);
        self.state.population_multiplier =
            self.growth.population_multiplier(self.state.current_population);

        // 3. Events
        let event_update = self.events.update(tick, &mut self.rng);

        // 4. Network
        self.refresh_network();
        let capacity_factor = self.state.reading.capacity_factor;

        // 5. Warnings
        let outcome = self.warnings.evaluate(capacity_factor);
        match outcome {
            WarningOutcome::Warning { count } => {
                warn!(tick, count, capacity_factor, "grid warning issued");
            }
            WarningOutcome::GameOver { reason } => {
                self.state.status = EngineStatus::GameOver;
                warn!(tick, %reason, capacity_factor, "game over");
            }
            WarningOutcome::Healthy | WarningOutcome::RedZone { .. } | WarningOutcome::Inactive => {}
        }

        // 6. Cadence
        self.state.tick_interval = self.growth.tick_interval(step.time_multiplier);

        debug!(
            tick,
            current_time,
            population = self.state.current_population,
            capacity_factor,
            active_events = self.events.active_count(),
            interval_ms = duration_ms(self.state.tick_interval),
            "tick complete"
        );

        Ok(TickSummary {
            tick,
            current_time,
            population: self.state.current_population,
            capacity_factor,
            band: warning::classify(capacity_factor),
            events: event_update,
            warning: outcome,
            next_interval: self.state.tick_interval,
        })
    }

    /// Store a tool value and rebalance the grid if anything changed.
    pub fn set_tool_value(&mut self, tool_id: &str, value: f64) -> ToolWrite {
        let outcome = self.tools.set(tool_id, value);
        if outcome.stored() {
            self.refresh_network();
        }
        outcome
    }

    /// Overwrite the population (clamped to zero) and rebalance.
    pub fn set_population(&mut self, population: f64) {
        let population = if population.is_nan() { 0.0 } else { population.max(0.0) };
        self.state.current_population = population;
        self.state.population_multiplier = self.growth.population_multiplier(population);
        self.refresh_network();
    }

    /// Shift the population by `delta` (result clamped to zero) and
    /// rebalance.
    pub fn adjust_population(&mut self, delta: f64) {
        self.set_population(self.state.current_population + delta);
    }

    /// Overwrite simulated time (clamped to zero) and rebalance. Population
    /// follows the new time on the next tick.
    pub fn set_time(&mut self, years: f64) {
        self.state.clock.set_time(years);
        self.refresh_network();
    }

    /// Set the lifecycle status. Game over is sticky until [`Simulation::reset`].
    pub fn set_status(&mut self, status: EngineStatus) {
        if self.state.status != EngineStatus::GameOver {
            self.state.status = status;
        }
    }

    /// Return to the configured initial state. The RNG is reseeded when a
    /// seed is configured.
    pub fn reset(&mut self) {
        self.events.clear();
        self.tools.reset();
        self.warnings.reset();
        if let Some(seed) = self.config.engine.seed {
            self.rng = SmallRng::seed_from_u64(seed);
        }
        self.state = initial_state(&self.config, &self.growth, &self.network);
        info!("simulation reset");
    }

    /// Owned copy of the full state.
    pub fn snapshot(&self) -> GameSnapshot {
        let reading = &self.state.reading;
        GameSnapshot {
            current_time: self.state.clock.current_time(),
            current_population: self.state.current_population,
            tick_count: self.state.clock.tick(),
            time_multiplier: self.state.time_multiplier,
            population_multiplier: self.state.population_multiplier,
            status: self.state.status,
            is_running: self.state.status == EngineStatus::Running,
            is_game_over: self.state.status == EngineStatus::GameOver,
            game_over_reason: self.warnings.game_over_reason(),
            active_events: self.events.active_events(),
            tool_states: self.tools.values().clone(),
            base_demand: reading.base_demand,
            base_supply: reading.base_supply,
            total_demand: reading.total_demand,
            total_supply: reading.total_supply,
            capacity_factor: reading.capacity_factor,
            grid_band: warning::classify(reading.capacity_factor),
            infrastructure_tier: reading.tier.to_owned(),
            warning_count: self.warnings.warning_count(),
            ticks_in_red_zone: self.warnings.ticks_in_red_zone(),
            tick_interval_ms: duration_ms(self.state.tick_interval),
        }
    }

    /// Read-only view of the scalar state.
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The configuration this simulation was built from.
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Delay before the next scheduled tick.
    pub const fn tick_interval(&self) -> Duration {
        self.state.tick_interval
    }

    /// Current lifecycle status.
    pub const fn status(&self) -> EngineStatus {
        self.state.status
    }

    fn refresh_network(&mut self) {
        let factors = BalanceFactors {
            demand: self.events.multiplier(Impact::Demand) * self.tools.multiplier(Impact::Demand),
            supply: self.events.multiplier(Impact::Supply) * self.tools.multiplier(Impact::Supply),
        };
        self.state.reading = self.network.compute(self.state.current_population, factors);
    }
}

/// State at tick 0: configured population and time, neutral multipliers.
fn initial_state(
    config: &GameConfig,
    growth: &GrowthModel,
    network: &NetworkModel,
) -> SimulationState {
    let population = growth.initial_population();
    SimulationState {
        clock: SimulationClock::new(config.time.initial_time),
        current_population: population,
        time_multiplier: 1.0,
        population_multiplier: 1.0,
        reading: network.compute(population, BalanceFactors::default()),
        tick_interval: growth.initial_interval(),
        status: EngineStatus::Stopped,
    }
}

/// Whole milliseconds, saturating.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use flexgrid_types::GameOverReason;

    use super::*;

    fn seeded_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.engine.seed = Some(42);
        config
    }

    fn quiet_simulation(config: GameConfig) -> Simulation {
        Simulation::with_catalogs(config, &[], catalog::ALL_TOOLS).unwrap()
    }

    #[test]
    fn initial_snapshot_matches_config() {
        let sim = Simulation::new(seeded_config()).unwrap();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.tick_count, 0);
        assert!((snapshot.current_population - 2_000.0).abs() < f64::EPSILON);
        assert!(snapshot.current_time.abs() < f64::EPSILON);
        assert_eq!(snapshot.status, EngineStatus::Stopped);
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.infrastructure_tier, "Village");
        assert_eq!(snapshot.tick_interval_ms, 1_000);
        assert_eq!(snapshot.tool_states.len(), catalog::ALL_TOOLS.len());
    }

    #[test]
    fn tick_increments_counter_and_time() {
        let mut sim = Simulation::new(seeded_config()).unwrap();
        let summary = sim.run_tick().unwrap();
        assert_eq!(summary.tick, 1);
        assert!(summary.current_time > 0.0);
        assert_eq!(sim.snapshot().tick_count, 1);
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = Simulation::new(seeded_config()).unwrap();
        let mut b = Simulation::new(seeded_config()).unwrap();
        for _ in 0..50 {
            let left = a.run_tick().unwrap();
            let right = b.run_tick().unwrap();
            assert!((left.population - right.population).abs() < f64::EPSILON);
            assert_eq!(left.events, right.events);
        }
    }

    #[test]
    fn tool_write_rebalances_immediately() {
        let mut sim = quiet_simulation(seeded_config());
        let before = sim.snapshot().total_demand;
        let outcome = sim.set_tool_value("industrial-load", -0.2);
        assert_eq!(outcome, ToolWrite::Applied { value: -0.2 });
        let after = sim.snapshot();
        assert!((after.total_demand - before * 0.8).abs() < 1e-9);
        assert_eq!(after.tick_count, 0);
    }

    #[test]
    fn overrides_clamp_to_zero() {
        let mut sim = quiet_simulation(seeded_config());
        sim.set_population(-50.0);
        assert!(sim.snapshot().current_population.abs() < f64::EPSILON);
        sim.adjust_population(300.0);
        assert!((sim.snapshot().current_population - 300.0).abs() < f64::EPSILON);
        sim.adjust_population(-1_000.0);
        assert!(sim.snapshot().current_population.abs() < f64::EPSILON);
        sim.set_time(-3.0);
        assert!(sim.snapshot().current_time.abs() < f64::EPSILON);
    }

    #[test]
    fn sustained_imbalance_ends_the_game() {
        let mut config = seeded_config();
        config.population.volatility = 0.0;
        config.population.growth_rate = Some(0.0);
        let mut sim = quiet_simulation(config);
        // 2000 people on a 2300 kW village sits healthy; halve demand to drop out.
        sim.set_tool_value("industrial-load", -0.2);
        sim.set_tool_value("ev-charging", -0.15);
        sim.set_tool_value("residential-load", -0.15);

        for _ in 0..29 {
            sim.run_tick().unwrap();
        }
        assert_eq!(sim.snapshot().warning_count, 2);
        let summary = sim.run_tick().unwrap();
        assert_eq!(
            summary.warning,
            WarningOutcome::GameOver {
                reason: GameOverReason::Underutilization
            }
        );

        let snapshot = sim.snapshot();
        assert!(snapshot.is_game_over);
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.warning_count, 3);
        assert!(matches!(sim.run_tick(), Err(TickError::GameOver)));
        assert_eq!(sim.snapshot().tick_count, 30);
    }

    #[test]
    fn game_over_is_sticky_until_reset() {
        let mut config = seeded_config();
        config.population.volatility = 0.0;
        config.population.growth_rate = Some(0.0);
        config.population.initial_population = 100.0;
        let mut sim = quiet_simulation(config);
        for _ in 0..30 {
            sim.run_tick().unwrap();
        }
        sim.set_status(EngineStatus::Running);
        assert_eq!(sim.status(), EngineStatus::GameOver);

        sim.reset();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.status, EngineStatus::Stopped);
        assert_eq!(snapshot.warning_count, 0);
        assert_eq!(snapshot.game_over_reason, None);
        assert_eq!(snapshot.tick_count, 0);
    }

    #[test]
    fn reset_reproduces_the_seeded_run() {
        let mut sim = Simulation::new(seeded_config()).unwrap();
        let first: Vec<f64> = (0..20).map(|_| sim.run_tick().unwrap().population).collect();
        sim.reset();
        let second: Vec<f64> = (0..20).map(|_| sim.run_tick().unwrap().population).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = GameConfig::default();
        config.ticks.min_interval_ms = 10_000;
        assert!(matches!(
            Simulation::new(config),
            Err(ConfigError::Invalid { .. })
        ));
    }
}

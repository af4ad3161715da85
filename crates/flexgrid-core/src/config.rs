//! Configuration loading and typed config structures for the FlexGrid engine.
//!
//! The canonical configuration lives in `flexgrid-config.yaml` at the project
//! root. Every key is optional; missing sections and fields fall back to the
//! defaults below, which reproduce a 100-year game over two real hours.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but cannot drive a game.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `flexgrid-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Population parameters.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Simulated calendar parameters.
    #[serde(default)]
    pub time: TimeConfig,

    /// Real-time tick cadence.
    #[serde(default)]
    pub ticks: TickConfig,

    /// Grid demand and supply constants.
    #[serde(default)]
    pub grid: GridConfig,

    /// Random event parameters.
    #[serde(default)]
    pub events: EventConfig,

    /// Engine lifecycle settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value can drive a game.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let population = &self.population;
        require(
            population.initial_population.is_finite() && population.initial_population >= 0.0,
            "population.initial_population must be a finite, non-negative number",
        )?;
        require(
            (0.0..1.0).contains(&population.volatility),
            "population.volatility must lie in [0, 1)",
        )?;
        if let Some(rate) = population.growth_rate {
            require(rate.is_finite(), "population.growth_rate must be finite")?;
        }

        let time = &self.time;
        require(
            time.initial_time.is_finite() && time.initial_time >= 0.0,
            "time.initial_time must be a finite, non-negative number",
        )?;
        require(
            time.target_years.is_finite() && time.target_years > 0.0,
            "time.target_years must be positive",
        )?;
        require(
            time.target_real_minutes.is_finite() && time.target_real_minutes > 0.0,
            "time.target_real_minutes must be positive",
        )?;
        require(
            time.growth_rate.is_finite() && time.growth_rate >= 0.0,
            "time.growth_rate must be a finite, non-negative number",
        )?;

        let ticks = &self.ticks;
        require(ticks.base_interval_ms > 0, "ticks.base_interval_ms must be at least 1")?;
        require(ticks.min_interval_ms > 0, "ticks.min_interval_ms must be at least 1")?;
        require(
            ticks.min_interval_ms <= ticks.max_interval_ms,
            "ticks.min_interval_ms must not exceed ticks.max_interval_ms",
        )?;

        let grid = &self.grid;
        require(
            grid.base_supply_kw.is_finite() && grid.base_supply_kw > 0.0,
            "grid.base_supply_kw must be positive",
        )?;
        require(
            grid.demand_per_capita_kw.is_finite() && grid.demand_per_capita_kw >= 0.0,
            "grid.demand_per_capita_kw must be a finite, non-negative number",
        )?;

        require(
            self.events.check_interval_ticks > 0,
            "events.check_interval_ticks must be at least 1",
        )?;

        Ok(())
    }
}

/// Return [`ConfigError::Invalid`] with `reason` unless `condition` holds.
fn require(condition: bool, reason: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            reason: reason.to_owned(),
        })
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Population at tick 0.
    #[serde(default = "default_initial_population")]
    pub initial_population: f64,

    /// Maximum fractional noise applied to the closed-form population each
    /// tick (0.01 = up to +/-1%).
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Exponential growth rate per simulated year. When absent it is solved
    /// so the population reaches the largest infrastructure milestone after
    /// `time.target_years`.
    #[serde(default)]
    pub growth_rate: Option<f64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_population: default_initial_population(),
            volatility: default_volatility(),
            growth_rate: None,
        }
    }
}

/// Simulated calendar configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeConfig {
    /// Calendar year at tick 0.
    #[serde(default)]
    pub initial_time: f64,

    /// Simulated years the game is paced to cover.
    #[serde(default = "default_target_years")]
    pub target_years: f64,

    /// Real-time minutes the game is paced to last.
    #[serde(default = "default_target_real_minutes")]
    pub target_real_minutes: f64,

    /// Exponential rate at which the calendar accelerates per tick.
    #[serde(default = "default_time_growth_rate")]
    pub growth_rate: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            initial_time: 0.0,
            target_years: default_target_years(),
            target_real_minutes: default_target_real_minutes(),
            growth_rate: default_time_growth_rate(),
        }
    }
}

/// Real-time tick cadence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TickConfig {
    /// Nominal milliseconds per tick; also sets the planned tick count.
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Fastest allowed cadence.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Slowest allowed cadence.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: default_base_interval_ms(),
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

/// Grid constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridConfig {
    /// Supply (kW) while the population is below the first milestone.
    #[serde(default = "default_base_supply_kw")]
    pub base_supply_kw: f64,

    /// Demand (kW) contributed by each inhabitant.
    #[serde(default = "default_demand_per_capita_kw")]
    pub demand_per_capita_kw: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base_supply_kw: default_base_supply_kw(),
            demand_per_capita_kw: default_demand_per_capita_kw(),
        }
    }
}

/// Random event configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventConfig {
    /// Attempt an admission every N ticks.
    #[serde(default = "default_check_interval_ticks")]
    pub check_interval_ticks: u64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            check_interval_ticks: default_check_interval_ticks(),
        }
    }
}

/// Engine lifecycle configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Start ticking as soon as the engine is constructed.
    #[serde(default)]
    pub auto_start: bool,

    /// Seed for population noise and event draws. Absent means seeded from
    /// the operating system at construction; reset keeps the same generator.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_initial_population() -> f64 {
    2000.0
}

const fn default_volatility() -> f64 {
    0.01
}

const fn default_target_years() -> f64 {
    100.0
}

const fn default_target_real_minutes() -> f64 {
    120.0
}

const fn default_time_growth_rate() -> f64 {
    0.001
}

const fn default_base_interval_ms() -> u64 {
    1000
}

const fn default_min_interval_ms() -> u64 {
    100
}

const fn default_max_interval_ms() -> u64 {
    5000
}

const fn default_base_supply_kw() -> f64 {
    1000.0
}

const fn default_demand_per_capita_kw() -> f64 {
    1.0
}

const fn default_check_interval_ticks() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}

//! Tick cycle, growth model, events, tools, and grid balance for the FlexGrid
//! simulation.
//!
//! This crate owns the state machine behind the game: each tick advances
//! simulated time, grows the population, cycles random events, rebalances
//! the grid, and feeds the warning machine. [`GameEngine`] wraps it in a
//! self-scheduling timer and publishes a snapshot after every change.
//!
//! # Modules
//!
//! - [`catalog`] -- Static event, tool, and infrastructure tier definitions.
//! - [`clock`] -- Tick counter and simulated calendar with checked advance.
//! - [`config`] -- Configuration loading from `flexgrid-config.yaml` into
//!   strongly-typed structs.
//! - [`growth`] -- Time multiplier, closed-form population, tick cadence.
//! - [`events`] -- Active event expiry, admission, and multipliers.
//! - [`tools`] -- Tool values and their multipliers.
//! - [`network`] -- Demand, supply, and capacity factor.
//! - [`warning`] -- Red-zone streaks, warnings, and game over.
//! - [`tick`] -- The per-tick orchestration over all of the above.
//! - [`scheduler`] -- Timer task ownership and cancellation.
//! - [`subscription`] -- Snapshot listeners and broadcast.
//! - [`engine`] -- The cloneable [`GameEngine`] handle.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod growth;
pub mod network;
pub mod scheduler;
pub mod subscription;
pub mod tick;
pub mod tools;
pub mod warning;

pub use config::{ConfigError, GameConfig};
pub use engine::{EngineError, GameEngine};
pub use subscription::Subscription;
pub use tick::{Simulation, TickError, TickSummary};
pub use tools::ToolWrite;

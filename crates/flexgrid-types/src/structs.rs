//! Snapshot structs published by the engine.
//!
//! Everything here is an owned copy of engine state. Holding or mutating a
//! snapshot never affects the running simulation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EngineStatus, GameOverReason, GridBand, Impact};
use crate::ids::ActiveEventId;

// ---------------------------------------------------------------------------
// ActiveEvent
// ---------------------------------------------------------------------------

/// A catalog event currently in effect, materialized with its tick window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActiveEvent {
    /// Identifier of this occurrence.
    pub instance_id: ActiveEventId,
    /// Catalog id of the event definition (e.g. `cold-weather`).
    pub event_id: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Side of the balance the event scales.
    pub impact: Impact,
    /// Multiplier applied while active (0.9 = -10%, 1.1 = +10%).
    pub multiplier: f64,
    /// Ticks the event lasts once admitted.
    pub duration_ticks: u64,
    /// Catalog rarity weight, for display.
    pub probability: f64,
    /// Catalog ids of events this one cannot run alongside.
    pub conflicts: Vec<String>,
    /// Tick at which the event was admitted.
    pub start_tick: u64,
    /// First tick at which the event is no longer active.
    pub end_tick: u64,
}

impl ActiveEvent {
    /// Ticks left before expiry, counted from `tick`.
    pub const fn ticks_remaining(&self, tick: u64) -> u64 {
        self.end_tick.saturating_sub(tick)
    }
}

// ---------------------------------------------------------------------------
// GameSnapshot
// ---------------------------------------------------------------------------

/// Full, immutable copy of the simulation state.
///
/// Published once per tick and once per external write. Subscribers always
/// receive the whole state, never a delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameSnapshot {
    /// Simulated years elapsed on the game calendar.
    pub current_time: f64,
    /// Current population (never negative).
    pub current_population: f64,
    /// Number of ticks executed since the last reset.
    pub tick_count: u64,
    /// `exp(time_growth_rate * tick_count)`; how fast the calendar runs.
    pub time_multiplier: f64,
    /// Current population relative to the initial population.
    pub population_multiplier: f64,
    /// Scheduler lifecycle state.
    pub status: EngineStatus,
    /// Whether a tick timer is armed.
    pub is_running: bool,
    /// Whether the third warning has fired.
    pub is_game_over: bool,
    /// Why the game ended, when it has.
    pub game_over_reason: Option<GameOverReason>,
    /// Events in effect, in admission order.
    pub active_events: Vec<ActiveEvent>,
    /// Current value of every tool that has been initialised or written.
    pub tool_states: BTreeMap<String, f64>,
    /// Demand before event and tool multipliers (kW).
    pub base_demand: f64,
    /// Supply of the current infrastructure tier (kW).
    pub base_supply: f64,
    /// Demand after all multipliers (kW).
    pub total_demand: f64,
    /// Supply after all multipliers (kW).
    pub total_supply: f64,
    /// `total_demand / total_supply`.
    pub capacity_factor: f64,
    /// Band the capacity factor currently falls into.
    pub grid_band: GridBand,
    /// Name of the highest population milestone reached.
    pub infrastructure_tier: String,
    /// Warnings issued so far (0..=3).
    pub warning_count: u32,
    /// Consecutive ticks spent outside the healthy band.
    pub ticks_in_red_zone: u32,
    /// Delay before the next scheduled tick, in milliseconds.
    pub tick_interval_ms: u64,
}

impl GameSnapshot {
    /// Product of the multipliers of active events with the given impact.
    pub fn event_multiplier(&self, impact: Impact) -> f64 {
        self.active_events
            .iter()
            .filter(|event| event.impact == impact)
            .map(|event| event.multiplier)
            .product()
    }
}

//! Enumeration types for the FlexGrid simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Impact
// ---------------------------------------------------------------------------

/// Which side of the grid balance an event or tool acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Impact {
    /// Scales energy generation.
    Supply,
    /// Scales energy consumption.
    Demand,
}

impl Impact {
    /// Lowercase name used in logs and serialized payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Supply => "supply",
            Self::Demand => "demand",
        }
    }
}

// ---------------------------------------------------------------------------
// Engine lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of the engine's scheduler.
///
/// `GameOver` is terminal: only a reset leads back to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EngineStatus {
    /// No timer armed; state is preserved and the game can resume.
    Stopped,
    /// A tick timer is armed.
    Running,
    /// The third warning fired; the engine refuses to start until reset.
    GameOver,
}

// ---------------------------------------------------------------------------
// Grid health
// ---------------------------------------------------------------------------

/// Classification of a capacity factor against the healthy band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GridBand {
    /// Demand is well below supply; generation sits idle.
    Underutilized,
    /// Capacity factor is inside the healthy band.
    Healthy,
    /// Demand is at or above the safe share of supply.
    Overloaded,
}

impl GridBand {
    /// Whether this band counts toward the red-zone streak.
    pub const fn is_red(self) -> bool {
        !matches!(self, Self::Healthy)
    }
}

/// Why the game ended, chosen by the direction of the final breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GameOverReason {
    /// The grid ran above the healthy band.
    Overload,
    /// The grid ran below the healthy band.
    Underutilization,
}

impl GameOverReason {
    /// Player-facing explanation.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Overload => {
                "Grid overload! Demand outstripped safe capacity for too long and the network collapsed."
            }
            Self::Underutilization => {
                "Grid underutilised! Generation sat idle for too long and the network was decommissioned."
            }
        }
    }
}

impl core::fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_serializes_snake_case() {
        let json = serde_json::to_string(&Impact::Demand).ok();
        assert_eq!(json.as_deref(), Some("\"demand\""));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&EngineStatus::GameOver).ok();
        assert_eq!(json.as_deref(), Some("\"game_over\""));
    }

    #[test]
    fn only_healthy_band_is_not_red() {
        assert!(GridBand::Underutilized.is_red());
        assert!(GridBand::Overloaded.is_red());
        assert!(!GridBand::Healthy.is_red());
    }

    #[test]
    fn reasons_have_distinct_messages() {
        assert_ne!(
            GameOverReason::Overload.message(),
            GameOverReason::Underutilization.message()
        );
    }
}

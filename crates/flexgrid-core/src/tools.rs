//! Runtime tool values and their effect on demand and supply.
//!
//! The registry stores one scalar per tool id. Catalog tools start at their
//! neutral value; writes to ids outside the catalog are kept so they show up
//! in snapshots, but they never contribute a multiplier.

use std::collections::BTreeMap;

use flexgrid_types::Impact;
use tracing::{debug, warn};

use crate::catalog::{self, ToolDefinition, ToolKind};

/// Toggle values within this distance of 1 count as "on".
const TOGGLE_ON_TOLERANCE: f64 = f64::EPSILON;

/// Multiplier a tool contributes at the given value.
pub fn tool_multiplier(tool: &ToolDefinition, value: f64) -> f64 {
    match tool.kind {
        ToolKind::Slider { .. } => 1.0 + value,
        ToolKind::Toggle { multiplier } => {
            if (value - 1.0).abs() < TOGGLE_ON_TOLERANCE {
                multiplier
            } else {
                1.0
            }
        }
    }
}

/// Outcome of [`ToolRegistry::set`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolWrite {
    /// Stored as given.
    Applied {
        /// The stored value.
        value: f64,
    },
    /// Pulled into the slider's declared range before storing.
    Clamped {
        /// The value the caller asked for.
        requested: f64,
        /// The stored value.
        value: f64,
    },
    /// Stored under an id the catalog does not know; no effect on the grid.
    Unknown {
        /// The stored value.
        value: f64,
    },
    /// NaN or infinite; nothing was stored.
    Ignored,
}

impl ToolWrite {
    /// Whether the registry changed.
    pub const fn stored(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Current value of every tool.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    /// Tools that contribute multipliers.
    catalog: &'static [ToolDefinition],
    /// Tool id to current value.
    values: BTreeMap<String, f64>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Registry over the built-in tool catalog, every tool neutral.
    pub fn new() -> Self {
        Self::with_catalog(catalog::ALL_TOOLS)
    }

    /// Registry over a custom catalog, every tool neutral.
    pub fn with_catalog(catalog: &'static [ToolDefinition]) -> Self {
        let mut registry = Self {
            catalog,
            values: BTreeMap::new(),
        };
        registry.reset();
        registry
    }

    /// Put every catalog tool back to its neutral value and forget unknown
    /// ids.
    pub fn reset(&mut self) {
        self.values = self
            .catalog
            .iter()
            .map(|tool| (tool.id.to_owned(), tool.default_value()))
            .collect();
    }

    /// Store a value for `id`.
    pub fn set(&mut self, id: &str, value: f64) -> ToolWrite {
        if !value.is_finite() {
            warn!(tool = id, value, "ignoring non-finite tool value");
            return ToolWrite::Ignored;
        }

        let outcome = match self.definition(id).map(|tool| tool.kind) {
            Some(ToolKind::Slider { min, max, .. }) => {
                let clamped = value.max(min).min(max);
                if (clamped - value).abs() > 0.0 {
                    debug!(tool = id, requested = value, value = clamped, "slider value clamped");
                    ToolWrite::Clamped {
                        requested: value,
                        value: clamped,
                    }
                } else {
                    ToolWrite::Applied { value }
                }
            }
            Some(ToolKind::Toggle { .. }) => ToolWrite::Applied { value },
            None => {
                debug!(tool = id, value, "value stored for unknown tool");
                ToolWrite::Unknown { value }
            }
        };

        if let ToolWrite::Applied { value }
        | ToolWrite::Clamped { value, .. }
        | ToolWrite::Unknown { value } = outcome
        {
            self.values.insert(id.to_owned(), value);
        }
        outcome
    }

    /// Current value of `id`, if it has one.
    pub fn get(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied()
    }

    /// Product of the multipliers of catalog tools with the given impact.
    pub fn multiplier(&self, impact: Impact) -> f64 {
        self.catalog
            .iter()
            .filter(|tool| tool.impact == impact)
            .map(|tool| {
                let value = self.get(tool.id).unwrap_or_else(|| tool.default_value());
                tool_multiplier(tool, value)
            })
            .product()
    }

    /// Every stored value, keyed by tool id.
    pub const fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    fn definition(&self, id: &str) -> Option<&'static ToolDefinition> {
        self.catalog.iter().find(|tool| tool.id == id)
    }
}

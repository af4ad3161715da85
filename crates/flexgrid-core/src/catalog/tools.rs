//! Player-controlled flexibility levers.

use flexgrid_types::Impact;
use serde::Serialize;

/// How a tool's scalar value maps to a multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolKind {
    /// Continuous control. The value is a signed fractional adjustment and
    /// the multiplier is `1 + value`.
    Slider {
        /// Lowest accepted value.
        min: f64,
        /// Highest accepted value.
        max: f64,
        /// UI granularity.
        step: f64,
        /// Neutral position.
        default: f64,
    },
    /// On/off switch. Value `1` applies the multiplier, anything else is off.
    Toggle {
        /// Multiplier while switched on.
        multiplier: f64,
    },
}

/// Static definition of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Stable identifier (kebab-case).
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Display description.
    pub description: &'static str,
    /// Side of the balance the tool scales.
    pub impact: Impact,
    /// Slider or toggle behaviour.
    pub kind: ToolKind,
}

impl ToolDefinition {
    /// Value the tool holds before the player touches it.
    pub const fn default_value(&self) -> f64 {
        match self.kind {
            ToolKind::Slider { default, .. } => default,
            ToolKind::Toggle { .. } => 0.0,
        }
    }
}

/// Every tool available to the player: sliders first, then toggles.
pub static ALL_TOOLS: &[ToolDefinition] = &[
    ToolDefinition {
        id: "ev-charging",
        name: "EV Charging Control",
        description: "Delay charging (left) or accelerate charging (right)",
        impact: Impact::Demand,
        kind: ToolKind::Slider {
            min: -0.15,
            max: 0.15,
            step: 0.01,
            default: 0.0,
        },
    },
    ToolDefinition {
        id: "residential-load",
        name: "Residential Load Control",
        description: "Decrease (left) or increase (right) residential consumption",
        impact: Impact::Demand,
        kind: ToolKind::Slider {
            min: -0.15,
            max: 0.15,
            step: 0.01,
            default: 0.0,
        },
    },
    ToolDefinition {
        id: "industrial-load",
        name: "Industrial Load Shifting",
        description: "Shift industrial loads to reduce (left) or increase (right) demand",
        impact: Impact::Demand,
        kind: ToolKind::Slider {
            min: -0.20,
            max: 0.20,
            step: 0.01,
            default: 0.0,
        },
    },
    ToolDefinition {
        id: "battery-storage",
        name: "Battery Storage Control",
        description: "Send to storage (left) or draw from storage (right)",
        impact: Impact::Supply,
        kind: ToolKind::Slider {
            min: -0.15,
            max: 0.15,
            step: 0.01,
            default: 0.0,
        },
    },
    ToolDefinition {
        id: "pause-non-essential",
        name: "Pause Non-Essential Loads",
        description: "Temporarily reduce power to non-critical systems",
        impact: Impact::Demand,
        kind: ToolKind::Toggle { multiplier: 0.85 },
    },
    ToolDefinition {
        id: "emergency-repairs",
        name: "Emergency Repairs",
        description: "Rapidly repair infrastructure to restore generation",
        impact: Impact::Supply,
        kind: ToolKind::Toggle { multiplier: 1.10 },
    },
];

/// Look up a tool definition by id.
pub fn tool_by_id(id: &str) -> Option<&'static ToolDefinition> {
    ALL_TOOLS.iter().find(|tool| tool.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_sliders_two_toggles() {
        let sliders = ALL_TOOLS
            .iter()
            .filter(|t| matches!(t.kind, ToolKind::Slider { .. }))
            .count();
        assert_eq!(sliders, 4);
        assert_eq!(ALL_TOOLS.len(), 6);
    }

    #[test]
    fn slider_ranges_contain_default() {
        for tool in ALL_TOOLS {
            if let ToolKind::Slider {
                min,
                max,
                step,
                default,
            } = tool.kind
            {
                assert!(min < max, "{}", tool.id);
                assert!((min..=max).contains(&default), "{}", tool.id);
                assert!(step > 0.0, "{}", tool.id);
            }
        }
    }

    #[test]
    fn toggles_default_off() {
        let Some(pause) = tool_by_id("pause-non-essential") else {
            panic!("pause-non-essential missing");
        };
        assert!(pause.default_value().abs() < f64::EPSILON);
        assert_eq!(pause.impact, Impact::Demand);
    }

    #[test]
    fn lookup_unknown_tool() {
        assert!(tool_by_id("flux-capacitor").is_none());
        assert!(tool_by_id("battery-storage").is_some());
    }
}

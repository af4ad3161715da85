//! Random grid events.
//!
//! | Event               | Impact | Mult. | Ticks | Conflicts                                   |
//! |---------------------|--------|-------|-------|---------------------------------------------|
//! | factory-shift       | demand | 1.30  | 5     |                                             |
//! | sports-event        | demand | 1.20  | 3     |                                             |
//! | cold-weather        | demand | 1.40  | 7     | heatwave-demand, mild-weather               |
//! | heatwave-demand     | demand | 1.35  | 6     | cold-weather, mild-weather                  |
//! | holiday-season      | demand | 1.15  | 4     |                                             |
//! | mild-weather        | demand | 0.85  | 11    | cold-weather, heatwave-demand               |
//! | wind-surge          | supply | 1.30  | 4     | wind-drop                                   |
//! | solar-dip           | supply | 0.70  | 7     | optimal-conditions                          |
//! | wind-drop           | supply | 0.75  | 5     | wind-surge                                  |
//! | drought             | supply | 0.80  | 4     | extreme-downpour, optimal-conditions        |
//! | extreme-downpour    | supply | 1.25  | 3     | drought                                     |
//! | heatwave-supply     | supply | 0.85  | 5     | extreme-cold                                |
//! | extreme-cold        | supply | 0.65  | 8     | heatwave-supply, optimal-conditions         |
//! | optimal-conditions  | supply | 1.20  | 5     | solar-dip, extreme-cold, drought            |
//!
//! The `probability` field records how rare an event is meant to feel. The
//! event manager does not read it: admission runs on a fixed cadence with a
//! uniform draw over the catalog.

use flexgrid_types::Impact;
use serde::Serialize;

/// Static definition of a random event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventDefinition {
    /// Stable identifier (kebab-case).
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Display description.
    pub description: &'static str,
    /// Side of the balance the event scales.
    pub impact: Impact,
    /// Multiplier applied while active.
    pub multiplier: f64,
    /// How many ticks the event stays active.
    pub duration_ticks: u64,
    /// Nominal rarity, 0..1.
    pub probability: f64,
    /// Events that may not be active at the same time as this one.
    pub conflicts: &'static [&'static str],
}

impl EventDefinition {
    /// Whether this definition declares a conflict with `other_id`.
    pub fn declares_conflict(&self, other_id: &str) -> bool {
        self.conflicts.contains(&other_id)
    }

    /// Whether the two definitions may not coexist, in either declared
    /// direction.
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.declares_conflict(other.id) || other.declares_conflict(self.id)
    }
}

/// The full event pool: demand events followed by supply events.
pub static ALL_EVENTS: &[EventDefinition] = &[
    // Demand
    EventDefinition {
        id: "factory-shift",
        name: "Factory Shift Change",
        description: "Major industrial facilities starting operations",
        impact: Impact::Demand,
        multiplier: 1.3,
        duration_ticks: 5,
        probability: 0.15,
        conflicts: &[],
    },
    EventDefinition {
        id: "sports-event",
        name: "Major Sports Event",
        description: "Large sporting event causing spike in viewership",
        impact: Impact::Demand,
        multiplier: 1.2,
        duration_ticks: 3,
        probability: 0.08,
        conflicts: &[],
    },
    EventDefinition {
        id: "cold-weather",
        name: "Cold Weather Snap",
        description: "Unseasonably cold weather increasing heating demand",
        impact: Impact::Demand,
        multiplier: 1.4,
        duration_ticks: 7,
        probability: 0.12,
        conflicts: &["heatwave-demand", "mild-weather"],
    },
    EventDefinition {
        id: "heatwave-demand",
        name: "Heatwave",
        description: "Extreme heat causing air conditioning surge",
        impact: Impact::Demand,
        multiplier: 1.35,
        duration_ticks: 6,
        probability: 0.1,
        conflicts: &["cold-weather", "mild-weather"],
    },
    EventDefinition {
        id: "holiday-season",
        name: "Holiday Season",
        description: "Increased residential energy consumption during holidays",
        impact: Impact::Demand,
        multiplier: 1.15,
        duration_ticks: 4,
        probability: 0.2,
        conflicts: &[],
    },
    EventDefinition {
        id: "mild-weather",
        name: "Mild Weather",
        description: "Pleasant temperatures reducing heating/cooling needs",
        impact: Impact::Demand,
        multiplier: 0.85,
        duration_ticks: 11,
        probability: 0.15,
        conflicts: &["cold-weather", "heatwave-demand"],
    },
    // Supply
    EventDefinition {
        id: "wind-surge",
        name: "Wind Surge",
        description: "Strong consistent winds boosting wind power generation",
        impact: Impact::Supply,
        multiplier: 1.3,
        duration_ticks: 4,
        probability: 0.12,
        conflicts: &["wind-drop"],
    },
    EventDefinition {
        id: "solar-dip",
        name: "Solar Dip",
        description: "Extended cloudy period reducing solar output",
        impact: Impact::Supply,
        multiplier: 0.7,
        duration_ticks: 7,
        probability: 0.15,
        conflicts: &["optimal-conditions"],
    },
    EventDefinition {
        id: "wind-drop",
        name: "Wind Drop",
        description: "Calm weather reducing wind power generation",
        impact: Impact::Supply,
        multiplier: 0.75,
        duration_ticks: 5,
        probability: 0.15,
        conflicts: &["wind-surge"],
    },
    EventDefinition {
        id: "drought",
        name: "Drought",
        description: "Low water levels affecting hydroelectric generation",
        impact: Impact::Supply,
        multiplier: 0.8,
        duration_ticks: 4,
        probability: 0.08,
        conflicts: &["extreme-downpour", "optimal-conditions"],
    },
    EventDefinition {
        id: "extreme-downpour",
        name: "Extreme Downpour",
        description: "Heavy rainfall boosting hydroelectric output",
        impact: Impact::Supply,
        multiplier: 1.25,
        duration_ticks: 3,
        probability: 0.1,
        conflicts: &["drought"],
    },
    EventDefinition {
        id: "heatwave-supply",
        name: "Heatwave (Infrastructure)",
        description: "Extreme heat causing equipment efficiency losses",
        impact: Impact::Supply,
        multiplier: 0.85,
        duration_ticks: 5,
        probability: 0.1,
        conflicts: &["extreme-cold"],
    },
    EventDefinition {
        id: "extreme-cold",
        name: "Extreme Cold",
        description: "Freezing conditions damaging infrastructure",
        impact: Impact::Supply,
        multiplier: 0.65,
        duration_ticks: 8,
        probability: 0.07,
        conflicts: &["heatwave-supply", "optimal-conditions"],
    },
    EventDefinition {
        id: "optimal-conditions",
        name: "Optimal Generation Conditions",
        description: "Perfect weather conditions for renewable energy",
        impact: Impact::Supply,
        multiplier: 1.2,
        duration_ticks: 5,
        probability: 0.1,
        conflicts: &["solar-dip", "extreme-cold", "drought"],
    },
];

/// Catalog entries acting on one side of the balance.
pub fn events_for(impact: Impact) -> impl Iterator<Item = &'static EventDefinition> {
    ALL_EVENTS.iter().filter(move |event| event.impact == impact)
}

/// Look up an event definition by id.
pub fn event_by_id(id: &str) -> Option<&'static EventDefinition> {
    ALL_EVENTS.iter().find(|event| event.id == id)
}

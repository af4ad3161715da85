//! A simple operator that steers the tools toward the middle of the
//! healthy band.
//!
//! The autopilot is a pure function of the latest snapshot. It reaches for
//! the demand sliders first, spreading the correction evenly across them,
//! and only engages the toggles and the battery when the sliders alone
//! cannot close the gap.

use flexgrid_core::catalog::{ALL_TOOLS, ToolDefinition, ToolKind, tool_by_id};
use flexgrid_core::tools::tool_multiplier;
use flexgrid_types::{GameSnapshot, Impact};

/// Capacity factor the autopilot aims for.
pub const TARGET_CAPACITY_FACTOR: f64 = 0.875;

/// Distance from the target inside which nothing is touched.
pub const DEADBAND: f64 = 0.03;

const PAUSE_LOADS: &str = "pause-non-essential";
const REPAIRS: &str = "emergency-repairs";
const BATTERY: &str = "battery-storage";

/// One tool write the autopilot wants applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    /// Catalog id of the tool.
    pub tool_id: &'static str,
    /// Value to write.
    pub value: f64,
}

/// Decide which tool writes move the grid toward the target.
///
/// Returns only the writes that change a tool's current value.
pub fn plan(snapshot: &GameSnapshot) -> Vec<Adjustment> {
    let cf = snapshot.capacity_factor;
    if snapshot.is_game_over || !cf.is_finite() || cf <= 0.0 {
        return Vec::new();
    }
    if (cf - TARGET_CAPACITY_FACTOR).abs() <= DEADBAND {
        return Vec::new();
    }

    let sliders: Vec<&'static ToolDefinition> = ALL_TOOLS
        .iter()
        .filter(|tool| is_demand_slider(tool))
        .collect();
    let (reach_low, reach_high) = slider_reach(&sliders);
    let slider_product: f64 = sliders
        .iter()
        .map(|tool| tool_multiplier(tool, current_value(snapshot, tool)))
        .product();

    // Slider product that would land exactly on the target.
    let needed = slider_product * TARGET_CAPACITY_FACTOR / cf;

    let mut backstop: Vec<Adjustment> = Vec::new();
    if needed < reach_low {
        backstop.push(write(PAUSE_LOADS, 1.0));
        backstop.push(write(REPAIRS, 1.0));
        backstop.push(write(BATTERY, slider_bound(BATTERY, true)));
    } else if cf < TARGET_CAPACITY_FACTOR {
        backstop.push(write(PAUSE_LOADS, 0.0));
        backstop.push(write(REPAIRS, 0.0));
        if needed > reach_high {
            backstop.push(write(BATTERY, slider_bound(BATTERY, false)));
        } else if value_by_id(snapshot, BATTERY) > 0.0 {
            backstop.push(write(BATTERY, 0.0));
        }
    }
    backstop.retain(|adjustment| changes(snapshot, adjustment));

    let predicted = predicted_capacity_factor(snapshot, cf, &backstop);
    let needed = slider_product * TARGET_CAPACITY_FACTOR / predicted;
    let per_slider = spread(needed, sliders.len());

    let mut plan = backstop;
    for tool in sliders {
        let value = snap_to_slider(tool, per_slider - 1.0);
        let adjustment = Adjustment {
            tool_id: tool.id,
            value,
        };
        if changes(snapshot, &adjustment) {
            plan.push(adjustment);
        }
    }
    plan
}

const fn write(tool_id: &'static str, value: f64) -> Adjustment {
    Adjustment { tool_id, value }
}

const fn is_demand_slider(tool: &ToolDefinition) -> bool {
    matches!(tool.impact, Impact::Demand) && matches!(tool.kind, ToolKind::Slider { .. })
}

fn current_value(snapshot: &GameSnapshot, tool: &ToolDefinition) -> f64 {
    snapshot
        .tool_states
        .get(tool.id)
        .copied()
        .unwrap_or_else(|| tool.default_value())
}

fn value_by_id(snapshot: &GameSnapshot, tool_id: &str) -> f64 {
    tool_by_id(tool_id).map_or(0.0, |tool| current_value(snapshot, tool))
}

fn changes(snapshot: &GameSnapshot, adjustment: &Adjustment) -> bool {
    tool_by_id(adjustment.tool_id)
        .is_some_and(|tool| (current_value(snapshot, tool) - adjustment.value).abs() > 1e-9)
}

/// Lowest and highest product the given sliders can reach together.
fn slider_reach(sliders: &[&ToolDefinition]) -> (f64, f64) {
    sliders.iter().fold((1.0, 1.0), |(low, high), tool| match tool.kind {
        ToolKind::Slider { min, max, .. } => (low * (1.0 + min), high * (1.0 + max)),
        ToolKind::Toggle { .. } => (low, high),
    })
}

fn slider_bound(tool_id: &str, upper: bool) -> f64 {
    match tool_by_id(tool_id).map(|tool| tool.kind) {
        Some(ToolKind::Slider { min, max, .. }) => {
            if upper {
                max
            } else {
                min
            }
        }
        _ => 0.0,
    }
}

/// Capacity factor after the given non-slider writes take effect.
fn predicted_capacity_factor(snapshot: &GameSnapshot, cf: f64, writes: &[Adjustment]) -> f64 {
    writes.iter().fold(cf, |cf, adjustment| {
        let Some(tool) = tool_by_id(adjustment.tool_id) else {
            return cf;
        };
        let before = tool_multiplier(tool, current_value(snapshot, tool));
        let after = tool_multiplier(tool, adjustment.value);
        if before <= 0.0 || after <= 0.0 {
            return cf;
        }
        match tool.impact {
            Impact::Demand => cf * after / before,
            Impact::Supply => cf * before / after,
        }
    })
}

/// Equal per-slider factor whose product is `product`.
fn spread(product: f64, sliders: usize) -> f64 {
    let count = u32::try_from(sliders).unwrap_or(1).max(1);
    product.max(0.0).powf(1.0 / f64::from(count))
}

fn snap_to_slider(tool: &ToolDefinition, value: f64) -> f64 {
    match tool.kind {
        ToolKind::Slider { min, max, step, .. } => {
            let stepped = if step > 0.0 {
                (value / step).round() * step
            } else {
                value
            };
            stepped.clamp(min, max)
        }
        ToolKind::Toggle { .. } => value,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use flexgrid_types::{EngineStatus, GameOverReason, GridBand};

    use super::*;

    fn snapshot(capacity_factor: f64, overrides: &[(&str, f64)]) -> GameSnapshot {
        let mut tool_states: BTreeMap<String, f64> = ALL_TOOLS
            .iter()
            .map(|tool| (tool.id.to_owned(), tool.default_value()))
            .collect();
        for (id, value) in overrides {
            tool_states.insert((*id).to_owned(), *value);
        }
        GameSnapshot {
            current_time: 12.0,
            current_population: 40_000.0,
            tick_count: 90,
            time_multiplier: 1.1,
            population_multiplier: 20.0,
            status: EngineStatus::Running,
            is_running: true,
            is_game_over: false,
            game_over_reason: None,
            active_events: Vec::new(),
            tool_states,
            base_demand: 40_000.0 * capacity_factor,
            base_supply: 40_000.0,
            total_demand: 40_000.0 * capacity_factor,
            total_supply: 40_000.0,
            capacity_factor,
            grid_band: GridBand::Healthy,
            infrastructure_tier: "Town".to_owned(),
            warning_count: 0,
            ticks_in_red_zone: 0,
            tick_interval_ms: 900,
        }
    }

    fn value_of(plan: &[Adjustment], id: &str) -> Option<f64> {
        plan.iter().find(|a| a.tool_id == id).map(|a| a.value)
    }

    #[test]
    fn near_target_does_nothing() {
        assert!(plan(&snapshot(0.88, &[])).is_empty());
        assert!(plan(&snapshot(0.86, &[])).is_empty());
    }

    #[test]
    fn mild_overload_uses_sliders_only() {
        let plan = plan(&snapshot(1.0, &[]));
        assert!(value_of(&plan, PAUSE_LOADS).is_none());
        assert!(value_of(&plan, REPAIRS).is_none());
        assert!(value_of(&plan, BATTERY).is_none());
        for id in ["ev-charging", "residential-load", "industrial-load"] {
            let value = value_of(&plan, id).unwrap();
            assert!((value + 0.04).abs() < 1e-9, "{id} = {value}");
        }
    }

    #[test]
    fn severe_overload_engages_the_backstop() {
        let plan = plan(&snapshot(2.0, &[]));
        assert_eq!(value_of(&plan, PAUSE_LOADS), Some(1.0));
        assert_eq!(value_of(&plan, REPAIRS), Some(1.0));
        assert_eq!(value_of(&plan, BATTERY), Some(0.15));
        for id in ["ev-charging", "residential-load", "industrial-load"] {
            assert!(value_of(&plan, id).unwrap() < 0.0);
        }
    }

    #[test]
    fn underutilisation_releases_toggles() {
        let plan = plan(&snapshot(
            0.5,
            &[(PAUSE_LOADS, 1.0), (REPAIRS, 1.0), (BATTERY, 0.15)],
        ));
        assert_eq!(value_of(&plan, PAUSE_LOADS), Some(0.0));
        assert_eq!(value_of(&plan, REPAIRS), Some(0.0));
        assert!(value_of(&plan, BATTERY).unwrap() <= 0.0);
    }

    #[test]
    fn deep_underutilisation_stores_energy() {
        let plan = plan(&snapshot(0.3, &[]));
        assert_eq!(value_of(&plan, BATTERY), Some(-0.15));
        assert!(value_of(&plan, PAUSE_LOADS).is_none());
        for id in ["ev-charging", "residential-load", "industrial-load"] {
            assert!(value_of(&plan, id).unwrap() > 0.0);
        }
    }

    #[test]
    fn slider_writes_stay_in_range() {
        for cf in [0.1, 0.4, 0.7, 1.2, 3.0, 10.0] {
            for adjustment in plan(&snapshot(cf, &[])) {
                let tool = tool_by_id(adjustment.tool_id).unwrap();
                if let ToolKind::Slider { min, max, .. } = tool.kind {
                    assert!((min..=max).contains(&adjustment.value), "{cf}: {adjustment:?}");
                }
            }
        }
    }

    #[test]
    fn game_over_freezes_the_autopilot() {
        let mut over = snapshot(2.0, &[]);
        over.is_game_over = true;
        over.status = EngineStatus::GameOver;
        over.game_over_reason = Some(GameOverReason::Overload);
        assert!(plan(&over).is_empty());
    }
}

//! Grid balance: total demand, total supply, and capacity factor.
//!
//! ```text
//! base_demand    = population * demand_per_capita
//! base_supply    = capacity of the highest tier reached (configured base below the first)
//! total_demand   = base_demand * event_demand * tool_demand
//! total_supply   = max(base_supply * event_supply * tool_supply, MIN_TOTAL_SUPPLY_KW)
//! capacity       = total_demand / total_supply
//! ```

use crate::catalog::{self, tiers::SETTLEMENT};
use crate::config::GridConfig;

/// Floor under total supply so the capacity factor stays finite.
pub const MIN_TOTAL_SUPPLY_KW: f64 = 1e-6;

/// Combined multipliers acting on one tick's balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceFactors {
    /// Product of demand-side event and tool multipliers.
    pub demand: f64,
    /// Product of supply-side event and tool multipliers.
    pub supply: f64,
}

impl Default for BalanceFactors {
    fn default() -> Self {
        Self {
            demand: 1.0,
            supply: 1.0,
        }
    }
}

/// Result of a network computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkReading {
    /// Demand before multipliers (kW).
    pub base_demand: f64,
    /// Tier supply before multipliers (kW).
    pub base_supply: f64,
    /// Demand after multipliers (kW).
    pub total_demand: f64,
    /// Supply after multipliers, floored (kW).
    pub total_supply: f64,
    /// `total_demand / total_supply`.
    pub capacity_factor: f64,
    /// Name of the infrastructure tier supplying the grid.
    pub tier: &'static str,
}

/// Stateless calculator over the grid constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkModel {
    base_supply_kw: f64,
    demand_per_capita_kw: f64,
}

impl NetworkModel {
    /// Build from the grid section of the configuration.
    pub const fn new(config: &GridConfig) -> Self {
        Self {
            base_supply_kw: config.base_supply_kw,
            demand_per_capita_kw: config.demand_per_capita_kw,
        }
    }

    /// Compute the balance for `population` under the given multipliers.
    pub fn compute(&self, population: f64, factors: BalanceFactors) -> NetworkReading {
        let (tier, base_supply) = catalog::tier_for_population(population).map_or(
            (SETTLEMENT, self.base_supply_kw),
            |tier| (tier.name, tier.supply_capacity_kw),
        );
        let base_demand = population.max(0.0) * self.demand_per_capita_kw;
        let total_demand = base_demand * factors.demand;
        let total_supply = (base_supply * factors.supply).max(MIN_TOTAL_SUPPLY_KW);

        NetworkReading {
            base_demand,
            base_supply,
            total_demand,
            total_supply,
            capacity_factor: total_demand / total_supply,
            tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> NetworkModel {
        NetworkModel::new(&GridConfig::default())
    }

    #[test]
    fn settlement_uses_configured_base_supply() {
        let reading = network().compute(500.0, BalanceFactors::default());
        assert_eq!(reading.tier, SETTLEMENT);
        assert!((reading.base_supply - 1_000.0).abs() < f64::EPSILON);
        assert!((reading.capacity_factor - 0.5).abs() < 1e-12);
    }

    #[test]
    fn tier_supplies_the_grid() {
        let reading = network().compute(2_000.0, BalanceFactors::default());
        assert_eq!(reading.tier, "Village");
        assert!((reading.total_supply - 2_300.0).abs() < f64::EPSILON);
        assert!((reading.capacity_factor - 2_000.0 / 2_300.0).abs() < 1e-12);
    }

    #[test]
    fn multipliers_scale_both_sides() {
        let factors = BalanceFactors {
            demand: 1.4 * 0.85,
            supply: 0.7,
        };
        let reading = network().compute(10_000.0, factors);
        assert!((reading.total_demand - 10_000.0 * 1.4 * 0.85).abs() < 1e-9);
        assert!((reading.total_supply - 16_500.0 * 0.7).abs() < 1e-9);
    }

    #[test]
    fn zero_supply_is_floored() {
        let factors = BalanceFactors {
            demand: 1.0,
            supply: 0.0,
        };
        let reading = network().compute(2_000.0, factors);
        assert!((reading.total_supply - MIN_TOTAL_SUPPLY_KW).abs() < f64::EPSILON);
        assert!(reading.capacity_factor.is_finite());
    }

    #[test]
    fn empty_town_has_zero_demand() {
        let reading = network().compute(0.0, BalanceFactors::default());
        assert!(reading.total_demand.abs() < f64::EPSILON);
        assert!(reading.capacity_factor.abs() < f64::EPSILON);
    }
}

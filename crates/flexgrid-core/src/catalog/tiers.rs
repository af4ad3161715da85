//! Infrastructure tiers: the base supply a settlement of a given size has
//! built out.
//!
//! Supply is a step function of population. The largest threshold doubles as
//! the population target the growth model aims for.

use serde::Serialize;

/// A rung on the infrastructure ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InfrastructureTier {
    /// Display name.
    pub name: &'static str,
    /// Population at which this tier is reached.
    pub population_threshold: f64,
    /// Generation capacity once reached, in kW.
    pub supply_capacity_kw: f64,
}

/// Tier reported below the first threshold. Its capacity is the configured
/// base supply rather than a catalog constant.
pub const SETTLEMENT: &str = "Settlement";

/// Tiers in ascending threshold order.
pub static TIERS: &[InfrastructureTier] = &[
    InfrastructureTier {
        name: "Village",
        population_threshold: 1_000.0,
        supply_capacity_kw: 2_300.0,
    },
    InfrastructureTier {
        name: "Large Village",
        population_threshold: 4_500.0,
        supply_capacity_kw: 7_500.0,
    },
    InfrastructureTier {
        name: "Town",
        population_threshold: 10_000.0,
        supply_capacity_kw: 16_500.0,
    },
    InfrastructureTier {
        name: "Large Town",
        population_threshold: 22_000.0,
        supply_capacity_kw: 36_000.0,
    },
    InfrastructureTier {
        name: "Small City",
        population_threshold: 48_000.0,
        supply_capacity_kw: 79_000.0,
    },
    InfrastructureTier {
        name: "City",
        population_threshold: 105_000.0,
        supply_capacity_kw: 172_500.0,
    },
    InfrastructureTier {
        name: "Large City",
        population_threshold: 230_000.0,
        supply_capacity_kw: 375_000.0,
    },
    InfrastructureTier {
        name: "Metropolis",
        population_threshold: 500_000.0,
        supply_capacity_kw: 750_000.0,
    },
];

/// Highest tier whose threshold is at or below `population`, or `None`
/// below the first rung.
pub fn tier_for_population(population: f64) -> Option<&'static InfrastructureTier> {
    TIERS
        .iter()
        .rev()
        .find(|tier| tier.population_threshold <= population)
}

/// Population the growth model targets: the last tier's threshold.
pub fn target_population() -> f64 {
    TIERS
        .last()
        .map_or(0.0, |tier| tier.population_threshold)
}

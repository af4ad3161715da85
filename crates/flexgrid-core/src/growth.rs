//! Time acceleration, population growth, and tick cadence.
//!
//! # Time
//!
//! The time multiplier grows exponentially with the tick count:
//! `tm(n) = exp(time_growth_rate * n)`. Each tick advances simulated time by
//! `(target_years / planned_ticks) * tm(n)`, where `planned_ticks` is how
//! many base-interval ticks fit into the target real-time duration.
//!
//! # Population
//!
//! Population follows `P(t) = P0 * exp(k * t)` with `t` the simulated years
//! elapsed since the initial time. It is recomputed from the clock every
//! tick and never accumulated, so noise cannot compound. Each recomputation
//! is scaled by `1 + (u - 0.5) * 2 * volatility` with `u` uniform on `[0, 1)`.
//!
//! # Cadence
//!
//! The real-time interval between ticks stretches as time accelerates:
//! `clamp(base * (1 + ln(1 + tm)), min, max)`.

use std::time::Duration;

use rand::Rng;

use crate::catalog;
use crate::config::GameConfig;

/// Output of one growth step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthStep {
    /// Time multiplier for the tick.
    pub time_multiplier: f64,
    /// Simulated years the tick advances.
    pub years_advanced: f64,
}

/// Closed-form growth model derived from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthModel {
    /// Population at the initial time.
    initial_population: f64,
    /// Simulated year the game starts at.
    initial_time: f64,
    /// Exponential population growth rate per simulated year.
    growth_rate: f64,
    /// Maximum fractional noise on population.
    volatility: f64,
    /// Exponent of the time multiplier per tick.
    time_growth_rate: f64,
    /// Years advanced by a tick at multiplier 1.
    base_years_per_tick: f64,
    /// Nominal real-time tick interval.
    base_interval: Duration,
    /// Shortest allowed tick interval.
    min_interval: Duration,
    /// Longest allowed tick interval.
    max_interval: Duration,
}

impl GrowthModel {
    /// Build the model from validated configuration.
    pub fn new(config: &GameConfig) -> Self {
        let initial_population = config.population.initial_population.max(0.0);
        let growth_rate = config.population.growth_rate.unwrap_or_else(|| {
            solve_growth_rate(
                initial_population,
                catalog::target_population(),
                config.time.target_years,
            )
        });

        let base_interval = Duration::from_millis(config.ticks.base_interval_ms);
        let planned_ticks = config.time.target_real_minutes * 60.0 / base_interval.as_secs_f64();
        let base_years_per_tick = if planned_ticks.is_finite() && planned_ticks > 0.0 {
            config.time.target_years / planned_ticks
        } else {
            0.0
        };

        Self {
            initial_population,
            initial_time: config.time.initial_time,
            growth_rate,
            volatility: config.population.volatility,
            time_growth_rate: config.time.growth_rate,
            base_years_per_tick,
            base_interval,
            min_interval: Duration::from_millis(config.ticks.min_interval_ms),
            max_interval: Duration::from_millis(config.ticks.max_interval_ms),
        }
    }

    /// Population growth rate per simulated year.
    pub const fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Population at tick 0.
    pub const fn initial_population(&self) -> f64 {
        self.initial_population
    }

    /// Time multiplier for tick `n`.
    pub fn time_multiplier(&self, tick: u64) -> f64 {
        (self.time_growth_rate * tick_as_f64(tick)).exp()
    }

    /// Time multiplier and simulated years for tick `n`.
    pub fn step(&self, tick: u64) -> GrowthStep {
        let time_multiplier = self.time_multiplier(tick);
        GrowthStep {
            time_multiplier,
            years_advanced: self.base_years_per_tick * time_multiplier,
        }
    }

    /// Noise-free population at simulated time `current_time`.
    ///
    /// Saturates at `f64::MAX` once the exponential overflows. An empty
    /// start stays empty.
    pub fn population_at(&self, current_time: f64) -> f64 {
        let elapsed = current_time - self.initial_time;
        saturate(self.initial_population * (self.growth_rate * elapsed).exp())
    }

    /// Population at `current_time` with one draw of volatility noise.
    pub fn sample_population(&self, current_time: f64, rng: &mut impl Rng) -> f64 {
        let noise = 1.0 + (rng.random::<f64>() - 0.5) * 2.0 * self.volatility;
        saturate(self.population_at(current_time) * noise)
    }

    /// Ratio of `population` to the starting population; 1 when the game
    /// started empty.
    pub fn population_multiplier(&self, population: f64) -> f64 {
        if self.initial_population > 0.0 {
            population / self.initial_population
        } else {
            1.0
        }
    }

    /// Tick interval before the first tick: the base interval, within bounds.
    pub fn initial_interval(&self) -> Duration {
        self.base_interval.clamp(self.min_interval, self.max_interval)
    }

    /// Real-time delay before the next tick at the given time multiplier.
    pub fn tick_interval(&self, time_multiplier: f64) -> Duration {
        let scale = 1.0 + time_multiplier.max(0.0).ln_1p();
        Duration::try_from_secs_f64(self.base_interval.as_secs_f64() * scale)
            .unwrap_or(self.max_interval)
            .clamp(self.min_interval, self.max_interval)
    }
}

/// Growth rate that takes `initial` to `target` in `years`.
///
/// Returns 0 when there is nothing to grow toward: a non-positive start, a
/// start already at or past the target, or a non-positive horizon.
pub fn solve_growth_rate(initial: f64, target: f64, years: f64) -> f64 {
    if initial <= 0.0 || initial >= target || years <= 0.0 {
        return 0.0;
    }
    (target / initial).ln() / years
}

/// Clamp a population into `[0, f64::MAX]`; NaN (`0 * inf`) is an empty town.
fn saturate(population: f64) -> f64 {
    if population.is_nan() {
        0.0
    } else {
        population.clamp(0.0, f64::MAX)
    }
}

/// Tick counts stay far below 2^53 in any real game.
#[allow(clippy::cast_precision_loss)]
const fn tick_as_f64(tick: u64) -> f64 {
    tick as f64
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn model(config: &GameConfig) -> GrowthModel {
        GrowthModel::new(config)
    }

    #[test]
    fn growth_rate_is_solved_from_target() {
        let config = GameConfig::default();
        let growth = model(&config);
        let expected = (500_000.0_f64 / 2_000.0).ln() / 100.0;
        assert!((growth.growth_rate() - expected).abs() < 1e-12);
    }

    #[test]
    fn configured_growth_rate_wins() {
        let mut config = GameConfig::default();
        config.population.growth_rate = Some(0.02);
        assert!((model(&config).growth_rate() - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn no_growth_without_headroom() {
        assert!(solve_growth_rate(0.0, 500_000.0, 100.0).abs() < f64::EPSILON);
        assert!(solve_growth_rate(600_000.0, 500_000.0, 100.0).abs() < f64::EPSILON);
        assert!(solve_growth_rate(500_000.0, 500_000.0, 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reaches_target_after_target_years() {
        let growth = model(&GameConfig::default());
        let population = growth.population_at(100.0);
        assert!((population - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn zero_volatility_is_the_closed_form() {
        let mut config = GameConfig::default();
        config.population.volatility = 0.0;
        let growth = model(&config);
        let mut rng = SmallRng::seed_from_u64(7);
        for year in [0.0, 3.5, 42.0, 99.0] {
            let sampled = growth.sample_population(year, &mut rng);
            assert!((sampled - growth.population_at(year)).abs() < 1e-9);
        }
    }

    #[test]
    fn volatility_stays_within_bounds() {
        let mut config = GameConfig::default();
        config.population.volatility = 0.05;
        let growth = model(&config);
        let mut rng = SmallRng::seed_from_u64(99);
        let base = growth.population_at(10.0);
        for _ in 0..1_000 {
            let sampled = growth.sample_population(10.0, &mut rng);
            assert!(sampled >= base * 0.95 - 1e-9);
            assert!(sampled <= base * 1.05 + 1e-9);
        }
    }

    #[test]
    fn time_multiplier_is_monotonic() {
        let growth = model(&GameConfig::default());
        let mut last = 0.0;
        for tick in 0..5_000 {
            let tm = growth.time_multiplier(tick);
            assert!(tm >= last);
            last = tm;
        }
        assert!((growth.time_multiplier(0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn years_per_tick_scale_with_multiplier() {
        let growth = model(&GameConfig::default());
        // 120 minutes of one-second ticks.
        let base = 100.0 / 7_200.0;
        let step = growth.step(0);
        assert!((step.years_advanced - base).abs() < 1e-12);
        let later = growth.step(1_000);
        assert!((later.years_advanced - base * later.time_multiplier).abs() < 1e-12);
    }

    #[test]
    fn tick_interval_stays_in_bounds() {
        let growth = model(&GameConfig::default());
        for tm in [0.0, 0.5, 1.0, 10.0, 1e6, f64::INFINITY] {
            let interval = growth.tick_interval(tm);
            assert!(interval >= Duration::from_millis(100));
            assert!(interval <= Duration::from_millis(5_000));
        }
    }

    #[test]
    fn first_interval_is_the_base() {
        let growth = model(&GameConfig::default());
        assert_eq!(growth.initial_interval(), Duration::from_secs(1));
    }

    #[test]
    fn tick_interval_formula() {
        let growth = model(&GameConfig::default());
        let interval = growth.tick_interval(1.0);
        let expected = 1.0 + 2.0_f64.ln();
        assert!((interval.as_secs_f64() - expected).abs() < 1e-6);
    }

    #[test]
    fn empty_start_has_unit_multiplier() {
        let mut config = GameConfig::default();
        config.population.initial_population = 0.0;
        let growth = model(&config);
        assert!((growth.population_multiplier(123.0) - 1.0).abs() < f64::EPSILON);
        assert!(growth.population_at(50.0).abs() < f64::EPSILON);
        assert!(growth.population_at(1.0e9).abs() < f64::EPSILON);
    }

    #[test]
    fn overflowing_growth_saturates() {
        let growth = model(&GameConfig::default());
        let population = growth.population_at(20_000.0);
        assert!(population.is_finite());
        assert!(population >= f64::MAX / 2.0);

        let mut config = GameConfig::default();
        config.population.volatility = 0.05;
        let noisy = model(&config);
        let mut rng = SmallRng::seed_from_u64(21);
        for _ in 0..100 {
            let sampled = noisy.sample_population(20_000.0, &mut rng);
            assert!(sampled.is_finite());
            assert!(sampled > 0.0);
        }
    }
}

//! Red-zone tracking, warnings, and game over.
//!
//! The machine sees one capacity factor per tick. Consecutive ticks outside
//! the healthy band build a streak; a streak of [`RED_ZONE_TICKS`] issues a
//! warning and restarts the count. The [`MAX_WARNINGS`]-th warning ends the
//! game, and nothing is evaluated again until [`WarningStateMachine::reset`].

use flexgrid_types::{GameOverReason, GridBand};

/// Lowest healthy capacity factor (inclusive).
pub const HEALTHY_MIN: f64 = 0.8;

/// Capacity factor at which the grid counts as overloaded.
pub const HEALTHY_MAX: f64 = 0.95;

/// Consecutive red ticks that trigger a warning.
pub const RED_ZONE_TICKS: u32 = 10;

/// Warnings that end the game.
pub const MAX_WARNINGS: u32 = 3;

/// Band a capacity factor falls into. Healthy is `[HEALTHY_MIN, HEALTHY_MAX)`.
pub fn classify(capacity_factor: f64) -> GridBand {
    if capacity_factor >= HEALTHY_MAX {
        GridBand::Overloaded
    } else if capacity_factor >= HEALTHY_MIN {
        GridBand::Healthy
    } else {
        GridBand::Underutilized
    }
}

/// What one evaluation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningOutcome {
    /// Inside the band; any streak was cleared.
    Healthy,
    /// Outside the band, streak still below the threshold.
    RedZone {
        /// Current streak length.
        ticks: u32,
    },
    /// The streak hit the threshold and a warning was issued.
    Warning {
        /// Warnings issued so far.
        count: u32,
    },
    /// The final warning was issued.
    GameOver {
        /// Direction of the breach that ended the game.
        reason: GameOverReason,
    },
    /// The game is already over; nothing was evaluated.
    Inactive,
}

/// Warning counter and red-zone streak.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningStateMachine {
    ticks_in_red_zone: u32,
    warning_count: u32,
    game_over: Option<GameOverReason>,
}

impl WarningStateMachine {
    /// Fresh machine: no streak, no warnings.
    pub const fn new() -> Self {
        Self {
            ticks_in_red_zone: 0,
            warning_count: 0,
            game_over: None,
        }
    }

    /// Observe one tick's capacity factor.
    pub fn evaluate(&mut self, capacity_factor: f64) -> WarningOutcome {
        if self.game_over.is_some() {
            return WarningOutcome::Inactive;
        }

        let band = classify(capacity_factor);
        if !band.is_red() {
            self.ticks_in_red_zone = 0;
            return WarningOutcome::Healthy;
        }

        self.ticks_in_red_zone = self.ticks_in_red_zone.saturating_add(1);
        if self.ticks_in_red_zone < RED_ZONE_TICKS {
            return WarningOutcome::RedZone {
                ticks: self.ticks_in_red_zone,
            };
        }

        self.ticks_in_red_zone = 0;
        self.warning_count = self.warning_count.saturating_add(1);
        if self.warning_count < MAX_WARNINGS {
            return WarningOutcome::Warning {
                count: self.warning_count,
            };
        }

        let reason = if band == GridBand::Overloaded {
            GameOverReason::Overload
        } else {
            GameOverReason::Underutilization
        };
        self.game_over = Some(reason);
        WarningOutcome::GameOver { reason }
    }

    /// Consecutive ticks outside the band.
    pub const fn ticks_in_red_zone(&self) -> u32 {
        self.ticks_in_red_zone
    }

    /// Warnings issued so far.
    pub const fn warning_count(&self) -> u32 {
        self.warning_count
    }

    /// Why the game ended, if it has.
    pub const fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over
    }

    /// Whether the final warning has fired.
    pub const fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    /// Clear streak, warnings, and game over.
    pub const fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(machine: &mut WarningStateMachine, capacity_factor: f64, ticks: u32) -> WarningOutcome {
        let mut last = WarningOutcome::Inactive;
        for _ in 0..ticks {
            last = machine.evaluate(capacity_factor);
        }
        last
    }

    #[test]
    fn band_edges() {
        assert_eq!(classify(0.79), GridBand::Underutilized);
        assert_eq!(classify(0.8), GridBand::Healthy);
        assert_eq!(classify(0.9499), GridBand::Healthy);
        assert_eq!(classify(0.95), GridBand::Overloaded);
        assert_eq!(classify(2.0), GridBand::Overloaded);
    }

    #[test]
    fn ten_red_ticks_issue_one_warning() {
        let mut machine = WarningStateMachine::new();
        assert_eq!(feed(&mut machine, 1.2, 9), WarningOutcome::RedZone { ticks: 9 });
        assert_eq!(machine.evaluate(1.2), WarningOutcome::Warning { count: 1 });
        assert_eq!(machine.ticks_in_red_zone(), 0);
        assert_eq!(machine.warning_count(), 1);
    }

    #[test]
    fn recovery_clears_streak_without_warning() {
        let mut machine = WarningStateMachine::new();
        feed(&mut machine, 0.5, 9);
        assert_eq!(machine.evaluate(0.85), WarningOutcome::Healthy);
        assert_eq!(machine.ticks_in_red_zone(), 0);
        assert_eq!(machine.warning_count(), 0);
    }

    #[test]
    fn mixed_red_bands_share_a_streak() {
        let mut machine = WarningStateMachine::new();
        feed(&mut machine, 0.5, 5);
        assert_eq!(feed(&mut machine, 1.5, 5), WarningOutcome::Warning { count: 1 });
    }

    #[test]
    fn third_warning_ends_the_game() {
        let mut machine = WarningStateMachine::new();
        feed(&mut machine, 1.1, 20);
        assert_eq!(machine.warning_count(), 2);
        let outcome = feed(&mut machine, 1.1, 10);
        assert_eq!(
            outcome,
            WarningOutcome::GameOver {
                reason: GameOverReason::Overload
            }
        );
        assert!(machine.is_game_over());
        assert_eq!(machine.evaluate(0.9), WarningOutcome::Inactive);
        assert_eq!(machine.warning_count(), MAX_WARNINGS);
    }

    #[test]
    fn underutilisation_reason() {
        let mut machine = WarningStateMachine::new();
        feed(&mut machine, 0.3, 30);
        assert_eq!(
            machine.game_over_reason(),
            Some(GameOverReason::Underutilization)
        );
    }

    #[test]
    fn reset_clears_everything() {
        let mut machine = WarningStateMachine::new();
        feed(&mut machine, 0.3, 30);
        machine.reset();
        assert_eq!(machine, WarningStateMachine::new());
    }
}

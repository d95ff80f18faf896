/*!
This module handles the game modes a round can be played in and the
mode-specific progress tracked alongside the shared game state.

The engine is one canonical implementation parameterized by [`GameMode`];
the capability methods below decide which of the optional rules (leveling,
gravity acceleration, spin bonuses, move budgets) apply to a round, and
[`ModeState`] holds whatever counters and timers the chosen mode needs.
*/

use std::fmt;

use crate::{Configuration, GameTime};

/// The selectable game modes.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum GameMode {
    /// Endless play; the round only ends on a spawn collision.
    #[default]
    Classic,
    /// Race to clear a fixed number of lines; the recorded score is the
    /// elapsed time, lower is better.
    Sprint,
    /// Score as many points as possible within a fixed time budget.
    Timed,
    /// Clear lines within a fixed budget of placing actions.
    Puzzle,
    /// Endless play against periodically injected garbage rows.
    Survival,
    /// Cleared rows are zeroed and compact downwards instead of being
    /// spliced out, potentially chaining combo clears.
    Cascade,
}

/// Mode-specific progress of one round, created by
/// [`GameMode::initial_state`] and advanced by the game's tick loop.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum ModeState {
    /// No extra progress tracked.
    Classic,
    /// Sprint progress.
    Sprint {
        /// Lines left to clear until the round is won.
        lines_to_go: u32,
        /// Stopwatch counting up; the round's recorded result on a win.
        elapsed: GameTime,
    },
    /// Timed progress.
    Timed {
        /// Time left until the round ends.
        remaining: GameTime,
    },
    /// Puzzle progress.
    Puzzle {
        /// Placing actions left until the round ends.
        moves_left: u32,
    },
    /// Survival progress.
    Survival {
        /// Time left until the next garbage injection.
        injection_timer: GameTime,
        /// Current injection interval; decays multiplicatively down to a floor.
        injection_interval: GameTime,
        /// How many garbage rows the next injection inserts.
        garbage_rows: u32,
    },
    /// Cascade progress.
    Cascade {
        /// Number of chained clear passes in the currently settling cascade;
        /// `0` outside of a cascade sequence.
        combo: u32,
    },
}

impl GameMode {
    /// All `GameMode` enum variants in order.
    pub const VARIANTS: [Self; 6] = {
        use GameMode::*;
        [Classic, Sprint, Timed, Puzzle, Survival, Cascade]
    };

    /// Whether clearing lines increases the round's level.
    ///
    /// Sprint and timed rounds stay at level 0, keeping the score multiplier
    /// at x1 for their whole duration.
    pub const fn levels_up(self) -> bool {
        matches!(
            self,
            GameMode::Classic | GameMode::Puzzle | GameMode::Survival | GameMode::Cascade
        )
    }

    /// Whether leveling up shortens the autonomous drop interval.
    pub const fn gravity_accelerates(self) -> bool {
        self.levels_up() && !matches!(self, GameMode::Cascade)
    }

    /// Whether spin locks are detected and rewarded.
    pub const fn spin_bonus(self) -> bool {
        !matches!(self, GameMode::Cascade)
    }

    /// Whether placing actions are counted against a move budget.
    pub const fn tracks_moves(self) -> bool {
        matches!(self, GameMode::Puzzle)
    }

    /// Whether a lower recorded value ranks higher on the scoreboard.
    ///
    /// Only sprint records a time; every other mode records points.
    pub const fn lower_is_better(self) -> bool {
        matches!(self, GameMode::Sprint)
    }

    /// The fresh [`ModeState`] a round of this mode starts with.
    pub fn initial_state(self, config: &Configuration) -> ModeState {
        match self {
            GameMode::Classic => ModeState::Classic,
            GameMode::Sprint => ModeState::Sprint {
                lines_to_go: config.sprint_target,
                elapsed: GameTime::ZERO,
            },
            GameMode::Timed => ModeState::Timed {
                remaining: config.time_budget,
            },
            GameMode::Puzzle => ModeState::Puzzle {
                moves_left: config.move_budget,
            },
            GameMode::Survival => ModeState::Survival {
                injection_timer: config.garbage_start_interval,
                injection_interval: config.garbage_start_interval,
                garbage_rows: 1,
            },
            GameMode::Cascade => ModeState::Cascade { combo: 0 },
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::Classic => "Classic",
            GameMode::Sprint => "Sprint",
            GameMode::Timed => "Timed",
            GameMode::Puzzle => "Puzzle",
            GameMode::Survival => "Survival",
            GameMode::Cascade => "Cascade",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_table_is_consistent() {
        for mode in GameMode::VARIANTS {
            // Gravity acceleration is only ever a consequence of leveling.
            if mode.gravity_accelerates() {
                assert!(mode.levels_up(), "{mode} accelerates without leveling");
            }
        }
        assert!(!GameMode::Cascade.gravity_accelerates());
        assert!(!GameMode::Cascade.spin_bonus());
        assert!(!GameMode::Sprint.levels_up());
        assert!(!GameMode::Timed.levels_up());
    }

    #[test]
    fn initial_state_picks_up_configuration() {
        let config = Configuration {
            sprint_target: 20,
            move_budget: 5,
            ..Configuration::default()
        };
        assert_eq!(
            GameMode::Sprint.initial_state(&config),
            ModeState::Sprint {
                lines_to_go: 20,
                elapsed: GameTime::ZERO
            }
        );
        assert_eq!(
            GameMode::Puzzle.initial_state(&config),
            ModeState::Puzzle { moves_left: 5 }
        );
    }
}

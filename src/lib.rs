/*!
# Quadfall Engine

`quadfall_engine` is an implementation of a falling-block puzzle game engine
with several timed and scored game modes.

The engine is strictly step-driven: it owns no timers and spawns no threads.
An external scheduler advances a [`Game`] by calling [`Game::tick`] with a
time delta, and forwards discrete player [`Intent`]s through [`Game::input`].
Both calls return timestamped [`Feedback`] messages that a frontend can map
to audio cues or visual effects; everything else a renderer needs is read
through the accessors on [`Game`].

# Examples

```
use std::time::Duration;
use quadfall_engine::{Game, GameMode, Intent};

// Starting a round of the classic mode - note that in-game time starts at 0.0s.
let mut game = Game::builder().mode(GameMode::Classic).seed(42).build();

// Forwarding a player intent; the active piece will try to move left.
game.input(Intent::MoveLeft);

// Advancing in-game time; the active piece falls once enough time accumulates.
game.tick(Duration::from_millis(16));

// Reading most recent game state;
// This is how a UI can know how to render the board, etc.
let state = game.state();
assert_eq!(state.lines_cleared, 0);
```
*/

#![warn(missing_docs)]

mod game_builder;
mod game_update;
pub mod game_mode;
pub mod rotation;
pub mod scoreboard;
pub mod tetromino_bag;

use std::{num::NonZeroU8, time::Duration};

use rand_chacha::ChaCha12Rng;

pub use game_builder::GameBuilder;
pub use game_mode::{GameMode, ModeState};
pub use tetromino_bag::TetrominoBag;

/// Abstract identifier for which type of tile occupies a cell in the grid.
pub type TileTypeID = NonZeroU8;
/// The type of horizontal lines of the playing grid.
pub type Line = [Option<TileTypeID>; Game::WIDTH];
/// The type of the entire two-dimensional playing grid.
///
/// Stored row-major with row `0` at the *top* of the visible board.
pub type Board = [Line; Game::HEIGHT];
/// Coordinates used to position pieces on the [`Board`].
///
/// These are signed: the anchor of a piece's bounding box may lie outside the
/// visible grid (most notably above the top while spawning or kicking).
pub type Coord = (i32, i32);
/// Coordinate offsets that can be added to [`Coord`]inates.
pub type Offset = (i32, i32);

/// The type used to identify points in time in a game's internal timeline.
pub type GameTime = Duration;
/// The internal RNG used by a game.
pub type GameRng = ChaCha12Rng;
/// The result of a round that ended: `Ok(())` for a completed round
/// (reaching the sprint target), `Err` for any of the loss conditions.
pub type RoundResult = Result<(), GameOver>;

/// Convenient type alias to denote a [`Feedback`] associated with some [`GameTime`].
pub type FeedbackMsg = (GameTime, Feedback);
/// Collection of [`FeedbackMsg`]s produced by one engine call.
pub type FeedbackMsgs = Vec<FeedbackMsg>;

/// Tile id marking garbage cells injected during survival rounds.
// SAFETY: `8 > 0`.
pub const GARBAGE_TILE: TileTypeID = unsafe { TileTypeID::new_unchecked(8) };

/// Represents one of the seven "Tetrominos";
///
/// A *tetromino* is a two-dimensional, geometric shape made by
/// connecting four squares (orthogonally / along the edges).
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum Tetromino {
    /// 'I'-Tetromino. Four squares connected as one straight line; `▄▄▄▄`.
    I = 0,
    /// 'J'-Tetromino. Four squares connected in a 'J'-shape; `█▄▄`.
    J,
    /// 'L'-Tetromino. Four squares connected in an 'L'-shape; `▄▄█`.
    L,
    /// 'O'-Tetromino. Four squares connected as one big square; `██`.
    ///
    /// 'O' is the one piece whose occupied cells are invariant under rotation.
    O,
    /// 'S'-Tetromino. Four squares connected in an 'S'-snaking manner; `▄█▀`.
    S,
    /// 'T'-Tetromino. Four squares connected in a 'T'-junction shape; `▄█▄`.
    ///
    /// 'T' is the pivot piece eligible for spin bonuses.
    T,
    /// 'Z'-Tetromino. Four squares connected in a 'Z'-snaking manner; `▀█▄`.
    Z,
}

/// Represents the orientation an active piece can be in.
///
/// The engine only ever rotates clockwise, cycling `N -> E -> S -> W -> N`.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum Rotation {
    /// North, the spawn orientation.
    N = 0,
    /// East.
    E,
    /// South.
    S,
    /// West.
    W,
}

/// An active tetromino in play.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub struct Piece {
    /// Type of tetromino the active piece is.
    pub tetromino: Tetromino,
    /// In which way the tetromino is re-oriented.
    pub rotation: Rotation,
    /// The position of the piece's bounding box' top-left corner on the grid.
    pub position: Coord,
}

/// A snapshot of the piece stowed away by the hold mechanic.
///
/// The orientation the piece had when it was held is preserved and restored
/// when it is swapped back in.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub struct HeldPiece {
    /// Type of tetromino that is held.
    pub tetromino: Tetromino,
    /// The orientation the piece had at the moment it was held.
    pub rotation: Rotation,
}

/// Represents a discrete player input forwarded to the engine.
///
/// The engine does not know about keys or touch surfaces; an input dispatcher
/// translates device events into these intents.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum Intent {
    /// Move the active piece once to the left.
    MoveLeft = 0,
    /// Move the active piece once to the right.
    MoveRight,
    /// Drop the active piece down by one, locking it if it sits on a surface.
    SoftDrop,
    /// Drop the active piece all the way down and lock it there.
    HardDrop,
    /// Rotate the active piece by +90° (clockwise).
    Rotate,
    /// Stow away the active piece; swapping in the previously held piece if
    /// one exists, at most once between consecutive locks.
    Hold,
    /// Toggle the paused state, freezing all timers.
    Pause,
    /// Forfeit the round immediately.
    Quit,
}

/// Represents how a round can be lost.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum GameOver {
    /// A new piece could not spawn due to pre-existing board tiles blocking
    /// one or several of its spawn cells.
    SpawnBlocked,
    /// A survival garbage injection found occupied cells in the rows it would
    /// shift out at the top of the board.
    GarbageTopOut,
    /// The timed mode's time budget ran out.
    TimeUp,
    /// The puzzle mode's move budget ran out.
    OutOfMoves,
    /// The player quit the round.
    Forfeit,
}

/// The per-piece lifecycle state machine of a round.
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Phase {
    /// An active piece is in play and can be controlled by the player.
    PieceInPlay {
        /// The active piece.
        piece: Piece,
        /// Whether the most recent successful action on the piece was a
        /// rotation. Spin classification at lock time requires this.
        rotated_last: bool,
    },
    /// Completed rows were detected at lock time and their removal is pending
    /// behind a fixed visual delay. While this phase is active, gravity,
    /// spawning and piece input are all suppressed.
    LinesClearing {
        /// Indices of the completed rows, in ascending order.
        rows: Vec<usize>,
        /// Time left until the rows are actually cleared out.
        window: GameTime,
    },
    /// The round is irreversibly over and not playable anymore.
    GameEnd {
        /// The result of how the round ended.
        result: RoundResult,
    },
}

/// A number of feedback events that can be returned by the game.
///
/// Each variant corresponds to a moment a frontend would play an audio cue
/// and/or trigger a visual effect; messages are timestamped with in-game time
/// and returned in chronological order from [`Game::tick`] and [`Game::input`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
pub enum Feedback {
    /// The active piece moved sideways.
    Move,
    /// The active piece rotated.
    Rotate,
    /// The active piece was soft-dropped.
    SoftDrop,
    /// The active piece was quickly dropped from its original position to a new one.
    HardDrop {
        /// Information about the old state of the hard-dropped piece.
        old_piece: Piece,
        /// Information about the new state of the hard-dropped piece.
        new_piece: Piece,
    },
    /// A piece was locked down in a certain configuration.
    Lock {
        /// Information about the [`Piece`] that was locked.
        piece: Piece,
    },
    /// A piece was stowed away by the hold mechanic.
    Hold,
    /// Between one and three lines started clearing.
    ClearLine,
    /// Four (or more, during cascades) lines started clearing.
    ClearTetris,
    /// The round's level increased.
    LevelUp {
        /// The new level.
        level: u32,
    },
    /// A chained cascade clear continued a combo.
    Combo {
        /// The number of chained clears so far in this cascade sequence.
        combo: u32,
    },
    /// The paused state was toggled.
    Pause {
        /// Whether the game is now paused.
        paused: bool,
    },
    /// The player was awarded points, with stats that influenced the bonus.
    Scored {
        /// The final computed score bonus caused by the action.
        bonus: u32,
        /// How many lines were cleared by the action simultaneously.
        lines: u32,
        /// Whether the piece was spun into place.
        is_spin: bool,
        /// The cascade combo count the bonus was multiplied with (0 if none).
        combo: u32,
    },
    /// Message that the round has ended.
    GameEnded {
        /// Outcome of the round.
        result: RoundResult,
    },
}

/// Configuration options of the game, which can be modified without hurting
/// internal invariants.
#[derive(PartialEq, PartialOrd, Clone, Debug)]
pub struct Configuration {
    /// How long completed rows stay on the board before they are cleared out.
    pub line_clear_delay: Duration,
    /// How long the lock flash shown by renderers lasts.
    pub lock_flash_duration: Duration,
    /// The drop interval at level 0.
    pub base_drop_interval: Duration,
    /// By how much the drop interval shrinks per level, in modes where
    /// leveling accelerates gravity.
    pub drop_interval_step: Duration,
    /// The drop interval below which leveling cannot accelerate gravity.
    pub drop_interval_floor: Duration,
    /// How many lines must be cleared to win a sprint round.
    pub sprint_target: u32,
    /// The time budget of a timed round.
    pub time_budget: Duration,
    /// The move budget of a puzzle round.
    pub move_budget: u32,
    /// The delay before the first garbage injection of a survival round, and
    /// the starting point of the decaying injection interval.
    pub garbage_start_interval: Duration,
    /// The duration below which the garbage injection interval cannot decay.
    pub garbage_interval_floor: Duration,
    /// The multiplicative decay applied to the injection interval after every
    /// injection. Should be in the range `0.0 < .. <= 1.0`.
    pub garbage_interval_decay: f64,
    /// The maximum number of garbage rows injected at once.
    pub garbage_amount_cap: u32,
}

/// Struct storing internal game state that changes over the course of play.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct State {
    /// Current in-game time. Frozen while the game is paused.
    pub time: GameTime,
    /// The internal pseudo random number generator used.
    pub rng: GameRng,
    /// The bag randomizer pieces are drawn from.
    pub bag: TetrominoBag,
    /// The upcoming piece shown in the preview.
    pub next_piece: Tetromino,
    /// The piece stowed away by the hold mechanic, if any.
    pub held_piece: Option<HeldPiece>,
    /// Whether a hold swap is still available this lock cycle.
    pub hold_available: bool,
    /// The main playing grid storing empty (`None`) and filled tiles.
    pub board: Board,
    /// The current total score the player has achieved in this round of play.
    pub score: u32,
    /// The total number of lines that have been cleared.
    pub lines_cleared: u32,
    /// The current level. Only modes with leveling ever increase this.
    pub level: u32,
    /// Time accumulated towards the next autonomous drop step.
    pub drop_accumulated: Duration,
    /// Time left on the lock flash shown by renderers. Purely cosmetic state.
    pub lock_flash: Duration,
    /// The most recently locked piece, for the renderer's lock flash.
    pub last_locked: Option<Piece>,
    /// Whether the game is paused. [`Game::tick`] is a no-op while paused.
    pub paused: bool,
    /// Mode-specific progress of the round.
    pub mode_state: ModeState,
}

/// Main game struct representing a round of play.
///
/// All mutable round state is owned here; multiple independent rounds can
/// coexist (e.g. in tests) without any shared globals.
#[derive(Debug)]
pub struct Game {
    /// Some internal configuration options of the `Game`.
    pub config: Configuration,
    mode: GameMode,
    seed: u64,
    state: State,
    phase: Phase,
}

impl Tetromino {
    /// All `Tetromino` enum variants in order.
    ///
    /// Note that `Tetromino::VARIANTS[t as usize] == t` always holds.
    pub const VARIANTS: [Self; 7] = {
        use Tetromino::*;
        [I, J, L, O, S, T, Z]
    };

    /// Returns the mino offsets `(dx, dy)` of a tetromino shape within its
    /// bounding box, given an orientation. `dy` grows downwards.
    ///
    /// All four orientations per type are spelled out here rather than being
    /// recomputed at runtime; each table is the previous one passed through
    /// the clockwise bounding-box rotation `(dx, dy) -> (n-1-dy, dx)`.
    pub const fn minos(&self, oriented: Rotation) -> [Offset; 4] {
        use Rotation::*;
        match self {
            Tetromino::I => match oriented {
                N => [(0, 1), (1, 1), (2, 1), (3, 1)], // ▄▄▄▄
                E => [(2, 0), (2, 1), (2, 2), (2, 3)],
                S => [(0, 2), (1, 2), (2, 2), (3, 2)],
                W => [(1, 0), (1, 1), (1, 2), (1, 3)],
            },
            Tetromino::J => match oriented {
                N => [(0, 0), (0, 1), (1, 1), (2, 1)], // █▄▄
                E => [(1, 0), (2, 0), (1, 1), (1, 2)],
                S => [(0, 1), (1, 1), (2, 1), (2, 2)],
                W => [(1, 0), (1, 1), (0, 2), (1, 2)],
            },
            Tetromino::L => match oriented {
                N => [(2, 0), (0, 1), (1, 1), (2, 1)], // ▄▄█
                E => [(1, 0), (1, 1), (1, 2), (2, 2)],
                S => [(0, 1), (1, 1), (2, 1), (0, 2)],
                W => [(0, 0), (1, 0), (1, 1), (1, 2)],
            },
            Tetromino::O => [(0, 0), (1, 0), (0, 1), (1, 1)], // ██
            Tetromino::S => match oriented {
                N => [(1, 0), (2, 0), (0, 1), (1, 1)], // ▄█▀
                E => [(1, 0), (1, 1), (2, 1), (2, 2)],
                S => [(1, 1), (2, 1), (0, 2), (1, 2)],
                W => [(0, 0), (0, 1), (1, 1), (1, 2)],
            },
            Tetromino::T => match oriented {
                N => [(1, 0), (0, 1), (1, 1), (2, 1)], // ▄█▄
                E => [(1, 0), (1, 1), (2, 1), (1, 2)],
                S => [(0, 1), (1, 1), (2, 1), (1, 2)],
                W => [(1, 0), (0, 1), (1, 1), (1, 2)],
            },
            Tetromino::Z => match oriented {
                N => [(0, 0), (1, 0), (1, 1), (2, 1)], // ▀█▄
                E => [(2, 0), (1, 1), (2, 1), (1, 2)],
                S => [(0, 1), (1, 1), (1, 2), (2, 2)],
                W => [(1, 0), (0, 1), (1, 1), (0, 2)],
            },
        }
    }

    /// The side length of the square bounding box the shape rotates within.
    pub const fn box_size(&self) -> i32 {
        match self {
            Tetromino::I => 4,
            Tetromino::O => 2,
            _ => 3,
        }
    }

    /// Returns the convened-on standard tile id corresponding to the given tetromino.
    pub const fn tile_type_id(&self) -> TileTypeID {
        use Tetromino::*;
        let u8 = match self {
            I => 1,
            J => 2,
            L => 3,
            O => 4,
            S => 5,
            T => 6,
            Z => 7,
        };
        // SAFETY: Ye, `u8 > 0`;
        unsafe { NonZeroU8::new_unchecked(u8) }
    }
}

impl Rotation {
    /// All `Rotation` enum variants in order.
    ///
    /// Note that `Rotation::VARIANTS[r as usize] == r` always holds.
    pub const VARIANTS: [Self; 4] = {
        use Rotation::*;
        [N, E, S, W]
    };

    /// The orientation reached by one clockwise quarter turn.
    pub const fn clockwise(self) -> Self {
        Rotation::VARIANTS[(self as usize + 1) % 4]
    }
}

impl Piece {
    /// Returns the board coordinates and tile type for the piece's four cells.
    pub fn tiles(&self) -> [(Coord, TileTypeID); 4] {
        let Self {
            tetromino,
            rotation,
            position: (x, y),
        } = self;
        let tile_type_id = tetromino.tile_type_id();
        tetromino
            .minos(*rotation)
            .map(|(dx, dy)| ((x + dx, y + dy), tile_type_id))
    }

    /// Checks whether the piece fits at its current location onto the board.
    ///
    /// A cell fits if it is within horizontal bounds, not below the bottom,
    /// and not on an occupied board cell. Cells *above* the board (negative
    /// row) are never checked against occupancy, which lets pieces spawn and
    /// rotate partially above the visible top.
    pub fn fits(&self, board: &Board) -> bool {
        self.tiles().iter().all(|&((x, y), _)| {
            (0..Game::WIDTH as i32).contains(&x)
                && y < Game::HEIGHT as i32
                && (y < 0 || board[y as usize][x as usize].is_none())
        })
    }

    /// Checks whether the piece fits a given offset from its current location
    /// onto the board, returning the moved piece if so.
    pub fn fits_at(&self, board: &Board, (dx, dy): Offset) -> Option<Piece> {
        let mut new_piece = *self;
        new_piece.position = (self.position.0 + dx, self.position.1 + dy);
        new_piece.fits(board).then_some(new_piece)
    }

    /// Returns the position the piece would hit if it kept moving at `offset` steps.
    /// For offset `(0,0)` this function returns immediately.
    pub fn teleported(&self, board: &Board, offset: Offset) -> Piece {
        let mut piece = *self;
        if offset != (0, 0) {
            // Move piece as far as possible.
            while let Some(new_piece) = piece.fits_at(board, offset) {
                piece = new_piece;
            }
        }
        piece
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            line_clear_delay: Duration::from_millis(300),
            lock_flash_duration: Duration::from_millis(100),
            base_drop_interval: Duration::from_millis(1000),
            drop_interval_step: Duration::from_millis(75),
            drop_interval_floor: Duration::from_millis(200),
            sprint_target: 40,
            time_budget: Duration::from_secs(3 * 60),
            move_budget: 50,
            garbage_start_interval: Duration::from_secs(10),
            garbage_interval_floor: Duration::from_secs(3),
            garbage_interval_decay: 0.97,
            garbage_amount_cap: 4,
        }
    }
}

impl Phase {
    /// Read accessor to a `Phase`'s possible [`Piece`].
    pub fn piece(&self) -> Option<&Piece> {
        if let Phase::PieceInPlay { piece, .. } = self {
            Some(piece)
        } else {
            None
        }
    }
}

impl Game {
    /// The game field width.
    pub const WIDTH: usize = 10;
    /// The game field height.
    pub const HEIGHT: usize = 20;
    /// The bounding-box anchor at which every new piece spawns.
    pub const SPAWN: Coord = (Self::WIDTH as i32 / 2 - 1, 0);

    /// Creates a blank new template representing a yet-to-be-started [`Game`]
    /// ready for configuration.
    pub fn builder() -> GameBuilder {
        GameBuilder::default()
    }

    /// Read accessor for the game's mode.
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    /// Read accessor for the seed the game's PRNG was initialized with.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read accessor for the current game state.
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Read accessor for the current phase of the piece lifecycle.
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// How the round ended, or `None` while it is still running.
    pub fn result(&self) -> Option<RoundResult> {
        match &self.phase {
            Phase::GameEnd { result } => Some(*result),
            _ => None,
        }
    }

    /// Whether the round has ended; once true, [`Game::tick`] and
    /// [`Game::input`] no longer change any state.
    pub fn ended(&self) -> bool {
        matches!(self.phase, Phase::GameEnd { .. })
    }

    /// Whether the game is currently paused.
    pub const fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// The current interval between autonomous drop steps.
    ///
    /// In modes where leveling accelerates gravity this shrinks with the
    /// level down to a clamped floor; everywhere else it is constant.
    pub fn drop_interval(&self) -> Duration {
        if self.mode.gravity_accelerates() {
            self.config
                .base_drop_interval
                .saturating_sub(self.config.drop_interval_step * self.state.level)
                .max(self.config.drop_interval_floor)
        } else {
            self.config.base_drop_interval
        }
    }

    /// The projected landing position of the active piece, used by renderers
    /// to draw the ghost piece. `None` while no piece is in play.
    pub fn ghost_piece(&self) -> Option<Piece> {
        self.phase
            .piece()
            .map(|piece| piece.teleported(&self.state.board, (0, 1)))
    }

    /// The value a finished round contributes to the high-score table:
    /// elapsed milliseconds for a *won* sprint round (lower is better),
    /// the point score for every other round-ending event.
    ///
    /// Returns `None` while the round is still running, and for sprint rounds
    /// that ended without reaching the target (those record nothing).
    pub fn final_score(&self) -> Option<u64> {
        let result = self.result()?;
        if let ModeState::Sprint { elapsed, .. } = self.state.mode_state {
            result
                .is_ok()
                .then(|| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        } else {
            Some(u64::from(self.state.score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(tetromino: Tetromino, rotation: Rotation, position: Coord) -> Piece {
        Piece {
            tetromino,
            rotation,
            position,
        }
    }

    #[test]
    fn fits_rejects_cells_outside_the_grid() {
        let board = [Line::default(); Game::HEIGHT];
        // In-bounds placements fit on an empty board.
        assert!(piece(Tetromino::T, Rotation::N, (0, 0)).fits(&board));
        assert!(piece(Tetromino::T, Rotation::N, (7, 18)).fits(&board));
        // Poking out left, right or below the bottom does not.
        assert!(!piece(Tetromino::T, Rotation::N, (-1, 0)).fits(&board));
        assert!(!piece(Tetromino::T, Rotation::N, (8, 0)).fits(&board));
        assert!(!piece(Tetromino::T, Rotation::N, (4, 19)).fits(&board));
    }

    #[test]
    fn fits_allows_cells_above_the_visible_top() {
        let mut board = [Line::default(); Game::HEIGHT];
        board[0] = [Some(GARBAGE_TILE); Game::WIDTH];
        board[0][4] = None;
        board[0][5] = None;
        board[0][6] = None;
        // Only the lower row of the T pokes into the board; the upper cell
        // sits above the top and is never checked against occupancy.
        assert!(piece(Tetromino::T, Rotation::N, (4, -1)).fits(&board));
        assert!(!piece(Tetromino::T, Rotation::N, (3, -1)).fits(&board));
    }

    #[test]
    fn fits_rejects_occupied_cells() {
        let mut board = [Line::default(); Game::HEIGHT];
        board[10][5] = Some(Tetromino::L.tile_type_id());
        assert!(!piece(Tetromino::O, Rotation::N, (5, 10)).fits(&board));
        assert!(piece(Tetromino::O, Rotation::N, (6, 10)).fits(&board));
    }

    #[test]
    fn variant_tables_are_index_consistent() {
        for (i, tetromino) in Tetromino::VARIANTS.iter().enumerate() {
            assert_eq!(*tetromino as usize, i);
            assert_eq!(u8::from(tetromino.tile_type_id()), i as u8 + 1);
        }
        for (i, rotation) in Rotation::VARIANTS.iter().enumerate() {
            assert_eq!(*rotation as usize, i);
        }
        assert_eq!(Rotation::W.clockwise(), Rotation::N);
    }
}

/*!
This module handles creation / initialization / building of [`Game`]s.
*/

use rand_chacha::rand_core::SeedableRng;

use super::*;

/// This builder exposes the ability to configure a new [`Game`] to varying degrees.
///
/// Generally speaking, when using `GameBuilder`, you'll first call
/// [`GameBuilder::new`] or [`Game::builder`], then chain calls to methods to
/// set each field, then call [`GameBuilder::build`]. This will give you a
/// [`Game`] as specified that you can then use as normal. The `GameBuilder`
/// is not used up and its configuration can be re-used to initialize more
/// [`Game`]s.
#[derive(PartialEq, Clone, Default, Debug)]
pub struct GameBuilder {
    /// The game mode the round will be played in.
    pub mode: GameMode,
    /// Many of the configuration options that will be set for the game.
    pub config: Configuration,
    /// The value to seed the game's PRNG with.
    pub seed: Option<u64>,
    /// A custom starting board. Defaults to an empty grid.
    pub board: Option<Board>,
    /// Pieces the bag will deal first, before any randomly drawn ones.
    pub initial_pieces: Vec<Tetromino>,
}

impl GameBuilder {
    /// Creates a blank new template representing a yet-to-be-started [`Game`]
    /// ready for configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Game`] with the information specified by `self`.
    ///
    /// The first piece spawns immediately; on a custom starting board that
    /// blocks the spawn cells the returned round is already over.
    pub fn build(&self) -> Game {
        let config = self.config.clone();
        let seed = self.seed.unwrap_or_else(rand::random);
        let mut rng = GameRng::seed_from_u64(seed);

        let mut bag = TetrominoBag::new();
        bag.prime(self.initial_pieces.iter().copied());
        let first_piece = bag.draw(&mut rng);
        let next_piece = bag.draw(&mut rng);

        let board = self.board.unwrap_or([Line::default(); Game::HEIGHT]);
        let spawned = Piece {
            tetromino: first_piece,
            rotation: Rotation::N,
            position: Game::SPAWN,
        };
        let phase = if spawned.fits(&board) {
            Phase::PieceInPlay {
                piece: spawned,
                rotated_last: false,
            }
        } else {
            Phase::GameEnd {
                result: Err(GameOver::SpawnBlocked),
            }
        };

        let mode_state = self.mode.initial_state(&config);
        Game {
            mode: self.mode,
            seed,
            state: State {
                time: GameTime::ZERO,
                rng,
                bag,
                next_piece,
                held_piece: None,
                hold_available: true,
                board,
                score: 0,
                lines_cleared: 0,
                level: 0,
                drop_accumulated: Duration::ZERO,
                lock_flash: Duration::ZERO,
                last_locked: None,
                paused: false,
                mode_state,
            },
            phase,
            config,
        }
    }

    /// The game mode the round will be played in.
    pub fn mode(&mut self, x: GameMode) -> &mut Self {
        self.mode = x;
        self
    }
    /// Sets the [`Configuration`] that will be used by [`Game`].
    pub fn config(&mut self, x: Configuration) -> &mut Self {
        self.config = x;
        self
    }
    /// The value to seed the game's PRNG with.
    pub fn seed(&mut self, x: u64) -> &mut Self {
        self.seed = Some(x);
        self
    }
    /// A custom starting board.
    pub fn board(&mut self, x: Board) -> &mut Self {
        self.board = Some(x);
        self
    }
    /// Pieces the bag will deal first, before any randomly drawn ones.
    pub fn initial_pieces(&mut self, x: impl IntoIterator<Item = Tetromino>) -> &mut Self {
        self.initial_pieces = x.into_iter().collect();
        self
    }

    /// How long completed rows stay on the board before they are cleared out.
    pub fn line_clear_delay(&mut self, x: Duration) -> &mut Self {
        self.config.line_clear_delay = x;
        self
    }
    /// How long the lock flash shown by renderers lasts.
    pub fn lock_flash_duration(&mut self, x: Duration) -> &mut Self {
        self.config.lock_flash_duration = x;
        self
    }
    /// The drop interval at level 0.
    pub fn base_drop_interval(&mut self, x: Duration) -> &mut Self {
        self.config.base_drop_interval = x;
        self
    }
    /// By how much the drop interval shrinks per level.
    pub fn drop_interval_step(&mut self, x: Duration) -> &mut Self {
        self.config.drop_interval_step = x;
        self
    }
    /// The drop interval below which leveling cannot accelerate gravity.
    pub fn drop_interval_floor(&mut self, x: Duration) -> &mut Self {
        self.config.drop_interval_floor = x;
        self
    }
    /// How many lines must be cleared to win a sprint round.
    pub fn sprint_target(&mut self, x: u32) -> &mut Self {
        self.config.sprint_target = x;
        self
    }
    /// The time budget of a timed round.
    pub fn time_budget(&mut self, x: Duration) -> &mut Self {
        self.config.time_budget = x;
        self
    }
    /// The move budget of a puzzle round.
    pub fn move_budget(&mut self, x: u32) -> &mut Self {
        self.config.move_budget = x;
        self
    }
    /// The delay before the first garbage injection of a survival round.
    pub fn garbage_start_interval(&mut self, x: Duration) -> &mut Self {
        self.config.garbage_start_interval = x;
        self
    }
    /// The duration below which the garbage injection interval cannot decay.
    pub fn garbage_interval_floor(&mut self, x: Duration) -> &mut Self {
        self.config.garbage_interval_floor = x;
        self
    }
    /// The multiplicative decay applied to the injection interval.
    pub fn garbage_interval_decay(&mut self, x: f64) -> &mut Self {
        self.config.garbage_interval_decay = x;
        self
    }
    /// The maximum number of garbage rows injected at once.
    pub fn garbage_amount_cap(&mut self, x: u32) -> &mut Self {
        self.config.garbage_amount_cap = x;
        self
    }
}

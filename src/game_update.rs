/*!
This module handles what happens when [`Game::tick`] or [`Game::input`] is called.
*/

use rand::Rng;

use super::*;

/// Base points for a normal clear, indexed by number of lines.
const NORMAL_POINTS: [u32; 5] = [0, 100, 300, 500, 800];
/// Base points for a spin clear, indexed by number of lines.
const SPIN_POINTS: [u32; 5] = [0, 400, 800, 1200, 1600];
/// Points for a spin lock that clears no lines.
const SPIN_LOCK_BONUS: u32 = 400;

impl Game {
    /// The main function used to advance the game state autonomously.
    ///
    /// This moves in-game time forward by `delta`: mode timers run, a pending
    /// line clear counts down (and resolves once its window elapses), and the
    /// active piece accumulates gravity. Any [`Feedback`] caused in the
    /// process is returned in chronological order.
    ///
    /// Calling this after the round ended, or while paused, is a no-op.
    pub fn tick(&mut self, delta: Duration) -> FeedbackMsgs {
        let mut feedback_msgs = FeedbackMsgs::new();
        if self.ended() || self.state.paused {
            return feedback_msgs;
        }

        self.state.time += delta;
        self.state.lock_flash = self.state.lock_flash.saturating_sub(delta);

        // Mode timers run even while a clear is pending; survival garbage in
        // particular can land mid-clear.
        self.advance_mode_timers(delta, &mut feedback_msgs);
        if self.ended() {
            return feedback_msgs;
        }

        if let Phase::LinesClearing { rows, window } = &mut self.phase {
            *window = window.saturating_sub(delta);
            if window.is_zero() {
                let rows = std::mem::take(rows);
                if self.mode == GameMode::Cascade {
                    self.cascade_pass(rows, &mut feedback_msgs);
                } else {
                    self.finish_line_clears(rows, &mut feedback_msgs);
                }
            }
        } else if let Phase::PieceInPlay {
            piece,
            rotated_last,
        } = self.phase
        {
            self.state.drop_accumulated += delta;
            if self.state.drop_accumulated > self.drop_interval() {
                self.state.drop_accumulated = Duration::ZERO;
                self.descend_or_lock(piece, rotated_last, &mut feedback_msgs);
            }
        }

        feedback_msgs
    }

    /// The main function used to apply a discrete player intent.
    ///
    /// Placement-affecting intents either succeed (committing state) or are
    /// silent no-ops; there is no error channel. Movement, rotation, hold and
    /// the drops are only handled while a piece is actually in play: during a
    /// pending clear or cascade settle the current piece no longer exists.
    /// [`Intent::Pause`] and [`Intent::Quit`] are handled in any phase.
    pub fn input(&mut self, intent: Intent) -> FeedbackMsgs {
        let mut feedback_msgs = FeedbackMsgs::new();
        if self.ended() {
            return feedback_msgs;
        }
        let now = self.state.time;

        match intent {
            Intent::Pause => {
                // No pausing in the middle of a clear animation.
                if !matches!(self.phase, Phase::LinesClearing { .. }) {
                    self.state.paused = !self.state.paused;
                    feedback_msgs.push((
                        now,
                        Feedback::Pause {
                            paused: self.state.paused,
                        },
                    ));
                }
                return feedback_msgs;
            }
            Intent::Quit => {
                self.end_round(Err(GameOver::Forfeit), &mut feedback_msgs);
                return feedback_msgs;
            }
            _ => {}
        }

        if self.state.paused {
            return feedback_msgs;
        }
        let (piece, rotated_last) = match &self.phase {
            Phase::PieceInPlay {
                piece,
                rotated_last,
            } => (*piece, *rotated_last),
            _ => return feedback_msgs,
        };

        match intent {
            Intent::MoveLeft | Intent::MoveRight => {
                let dx = if intent == Intent::MoveLeft { -1 } else { 1 };
                if let Some(moved) = piece.fits_at(&self.state.board, (dx, 0)) {
                    self.phase = Phase::PieceInPlay {
                        piece: moved,
                        rotated_last: false,
                    };
                    feedback_msgs.push((now, Feedback::Move));
                    self.charge_move(&mut feedback_msgs);
                }
            }
            Intent::SoftDrop => {
                feedback_msgs.push((now, Feedback::SoftDrop));
                self.state.drop_accumulated = Duration::ZERO;
                self.descend_or_lock(piece, rotated_last, &mut feedback_msgs);
            }
            Intent::HardDrop => {
                let dropped = piece.teleported(&self.state.board, (0, 1));
                feedback_msgs.push((
                    now,
                    Feedback::HardDrop {
                        old_piece: piece,
                        new_piece: dropped,
                    },
                ));
                // Note: a rotation immediately followed by a hard drop keeps
                // its spin eligibility.
                self.lock_piece(dropped, rotated_last, &mut feedback_msgs);
            }
            Intent::Rotate => {
                // The square piece is rotationally symmetric at this
                // granularity; don't let it eat into a move budget.
                if piece.tetromino == Tetromino::O && self.mode.tracks_moves() {
                    return feedback_msgs;
                }
                if let Some(rotated) = rotation::try_rotate(&piece, &self.state.board) {
                    self.phase = Phase::PieceInPlay {
                        piece: rotated,
                        rotated_last: true,
                    };
                    feedback_msgs.push((now, Feedback::Rotate));
                    self.charge_move(&mut feedback_msgs);
                }
            }
            Intent::Hold => self.try_hold(piece, &mut feedback_msgs),
            Intent::Pause | Intent::Quit => unreachable!(),
        }

        feedback_msgs
    }

    /// Immediately ends the round by player forfeit.
    pub fn forfeit(&mut self) -> FeedbackMsgs {
        let mut feedback_msgs = FeedbackMsgs::new();
        self.end_round(Err(GameOver::Forfeit), &mut feedback_msgs);
        feedback_msgs
    }

    /// The single round-ending transition; idempotent.
    fn end_round(&mut self, result: RoundResult, feedback_msgs: &mut FeedbackMsgs) {
        if self.ended() {
            return;
        }
        self.phase = Phase::GameEnd { result };
        feedback_msgs.push((self.state.time, Feedback::GameEnded { result }));
    }

    fn advance_mode_timers(&mut self, delta: Duration, feedback_msgs: &mut FeedbackMsgs) {
        match &mut self.state.mode_state {
            ModeState::Classic | ModeState::Cascade { .. } | ModeState::Puzzle { .. } => {}
            ModeState::Sprint {
                lines_to_go,
                elapsed,
            } => {
                *elapsed += delta;
                let target_reached = *lines_to_go == 0;
                if target_reached {
                    self.end_round(Ok(()), feedback_msgs);
                }
            }
            ModeState::Timed { remaining } => {
                *remaining = remaining.saturating_sub(delta);
                let expired = remaining.is_zero();
                if expired {
                    self.end_round(Err(GameOver::TimeUp), feedback_msgs);
                }
            }
            ModeState::Survival {
                injection_timer,
                injection_interval,
                garbage_rows,
            } => {
                *injection_timer = injection_timer.saturating_sub(delta);
                if !injection_timer.is_zero() {
                    return;
                }
                let rows = *garbage_rows as usize;
                // Schedule the next injection before performing this one.
                *injection_interval = self
                    .config
                    .garbage_interval_floor
                    .max(injection_interval.mul_f64(self.config.garbage_interval_decay));
                if self.state.lines_cleared > 30 && self.state.lines_cleared % 10 == 0 {
                    *garbage_rows = (*garbage_rows + 1).min(self.config.garbage_amount_cap);
                }
                *injection_timer = *injection_interval;
                self.inject_garbage(rows, feedback_msgs);
            }
        }
    }

    /// Inserts `n` garbage rows at the bottom by shifting the whole grid up,
    /// after verifying the top `n` rows are entirely empty. Each garbage row
    /// is full except for one independently random hole column.
    fn inject_garbage(&mut self, n: usize, feedback_msgs: &mut FeedbackMsgs) {
        for y in 0..n {
            if self.state.board[y].iter().any(|tile| tile.is_some()) {
                self.end_round(Err(GameOver::GarbageTopOut), feedback_msgs);
                return;
            }
        }
        self.state.board.rotate_left(n);
        for y in Game::HEIGHT - n..Game::HEIGHT {
            let hole = self.state.rng.random_range(0..Game::WIDTH);
            let mut line = [Some(GARBAGE_TILE); Game::WIDTH];
            line[hole] = None;
            self.state.board[y] = line;
        }
    }

    /// One autonomous or soft-drop step: descend if possible, lock otherwise.
    fn descend_or_lock(
        &mut self,
        piece: Piece,
        rotated_last: bool,
        feedback_msgs: &mut FeedbackMsgs,
    ) {
        if let Some(fallen) = piece.fits_at(&self.state.board, (0, 1)) {
            self.phase = Phase::PieceInPlay {
                piece: fallen,
                rotated_last: false,
            };
        } else {
            self.lock_piece(piece, rotated_last, feedback_msgs);
        }
    }

    /// Writes the piece into the grid (unconditionally - no re-validation),
    /// classifies the lock as spin/non-spin against the pre-lock grid, scores
    /// any completed rows, and either enters the pending-clear window or
    /// spawns the next piece.
    fn lock_piece(&mut self, piece: Piece, rotated_last: bool, feedback_msgs: &mut FeedbackMsgs) {
        let now = self.state.time;
        let is_spin = self.mode.spin_bonus()
            && rotated_last
            && rotation::is_spin_position(&piece, &self.state.board);

        for ((x, y), tile_type_id) in piece.tiles() {
            // Cells above the visible top are simply not written.
            if y >= 0 {
                self.state.board[y as usize][x as usize] = Some(tile_type_id);
            }
        }
        self.state.last_locked = Some(piece);
        self.state.lock_flash = self.config.lock_flash_duration;
        feedback_msgs.push((now, Feedback::Lock { piece }));

        let rows = completed_rows(&self.state.board);
        if rows.is_empty() {
            if is_spin {
                let bonus = SPIN_LOCK_BONUS * (self.state.level + 1);
                self.state.score += bonus;
                feedback_msgs.push((
                    now,
                    Feedback::Scored {
                        bonus,
                        lines: 0,
                        is_spin: true,
                        combo: 0,
                    },
                ));
            }
            self.charge_move(feedback_msgs);
            if self.ended() {
                return;
            }
            self.spawn_piece(feedback_msgs);
        } else {
            let lines = rows.len() as u32;
            let bonus = clear_award(lines, is_spin, self.state.level, 0);
            self.state.score += bonus;
            feedback_msgs.push((
                now,
                Feedback::Scored {
                    bonus,
                    lines,
                    is_spin,
                    combo: 0,
                },
            ));
            feedback_msgs.push((
                now,
                if lines >= 4 {
                    Feedback::ClearTetris
                } else {
                    Feedback::ClearLine
                },
            ));
            self.phase = Phase::LinesClearing {
                rows,
                window: self.config.line_clear_delay,
            };
            self.charge_move(feedback_msgs);
        }
    }

    /// Resolves an elapsed clear window in the standard modes: the completed
    /// rows are spliced out, an equal number of empty rows appears on top,
    /// counters update and the next piece spawns.
    fn finish_line_clears(&mut self, rows: Vec<usize>, feedback_msgs: &mut FeedbackMsgs) {
        for &y in &rows {
            // Drop all rows above the completed one down by a single row.
            self.state.board[..=y].rotate_right(1);
            self.state.board[0] = Line::default();
        }
        self.apply_cleared_lines(rows.len() as u32, feedback_msgs);
        self.spawn_piece(feedback_msgs);
    }

    /// Resolves an elapsed clear window in cascade mode: rows are zeroed in
    /// place, columns compact downwards, and the board is re-scanned. Newly
    /// completed rows chain another (combo-multiplied) pass; otherwise the
    /// combo ends and the next piece spawns.
    fn cascade_pass(&mut self, rows: Vec<usize>, feedback_msgs: &mut FeedbackMsgs) {
        let now = self.state.time;
        let combo = {
            let ModeState::Cascade { combo } = &mut self.state.mode_state else {
                unreachable!()
            };
            *combo += 1;
            *combo
        };

        for &y in &rows {
            self.state.board[y] = Line::default();
        }
        settle_columns(&mut self.state.board);
        self.apply_cleared_lines(rows.len() as u32, feedback_msgs);

        let next_rows = completed_rows(&self.state.board);
        if next_rows.is_empty() {
            if let ModeState::Cascade { combo } = &mut self.state.mode_state {
                *combo = 0;
            }
            self.spawn_piece(feedback_msgs);
        } else {
            let lines = next_rows.len() as u32;
            let bonus = clear_award(lines, false, self.state.level, combo);
            self.state.score += bonus;
            feedback_msgs.push((now, Feedback::Combo { combo }));
            feedback_msgs.push((
                now,
                Feedback::Scored {
                    bonus,
                    lines,
                    is_spin: false,
                    combo,
                },
            ));
            feedback_msgs.push((
                now,
                if lines >= 4 {
                    Feedback::ClearTetris
                } else {
                    Feedback::ClearLine
                },
            ));
            self.phase = Phase::LinesClearing {
                rows: next_rows,
                window: self.config.line_clear_delay,
            };
        }
    }

    /// Updates the line counter, sprint progress and (where applicable) the
    /// level after `n` rows finished clearing.
    fn apply_cleared_lines(&mut self, n: u32, feedback_msgs: &mut FeedbackMsgs) {
        self.state.lines_cleared += n;
        if let ModeState::Sprint { lines_to_go, .. } = &mut self.state.mode_state {
            *lines_to_go = lines_to_go.saturating_sub(n);
        }
        if self.mode.levels_up() {
            let new_level = self.state.lines_cleared / 10;
            if new_level > self.state.level {
                self.state.level = new_level;
                feedback_msgs.push((self.state.time, Feedback::LevelUp { level: new_level }));
            }
        }
    }

    /// Takes the preview piece into play and refills the preview from the
    /// bag. A spawn position blocked by existing tiles ends the round.
    fn spawn_piece(&mut self, feedback_msgs: &mut FeedbackMsgs) {
        let tetromino = self.state.next_piece;
        self.state.next_piece = self.state.bag.draw(&mut self.state.rng);
        self.state.hold_available = true;
        self.state.drop_accumulated = Duration::ZERO;

        let piece = Piece {
            tetromino,
            rotation: Rotation::N,
            position: Game::SPAWN,
        };
        if piece.fits(&self.state.board) {
            self.phase = Phase::PieceInPlay {
                piece,
                rotated_last: false,
            };
        } else {
            self.end_round(Err(GameOver::SpawnBlocked), feedback_msgs);
        }
    }

    /// Stows the active piece away, swapping in the held one (at the active
    /// piece's position, in its remembered orientation) or a fresh draw from
    /// the bag (at the spawn position). At most once per lock cycle; a swap
    /// whose replacement would not fit changes nothing.
    fn try_hold(&mut self, piece: Piece, feedback_msgs: &mut FeedbackMsgs) {
        if !self.state.hold_available {
            return;
        }
        feedback_msgs.push((self.state.time, Feedback::Hold));

        let replacement = match self.state.held_piece {
            Some(held) => Piece {
                tetromino: held.tetromino,
                rotation: held.rotation,
                position: piece.position,
            },
            None => Piece {
                tetromino: self.state.bag.peek(&mut self.state.rng),
                rotation: Rotation::N,
                position: Game::SPAWN,
            },
        };
        if !replacement.fits(&self.state.board) {
            return;
        }

        if self.state.held_piece.is_none() {
            // Actually consume the peeked piece.
            self.state.bag.draw(&mut self.state.rng);
        }
        self.state.held_piece = Some(HeldPiece {
            tetromino: piece.tetromino,
            rotation: piece.rotation,
        });
        self.state.hold_available = false;
        self.phase = Phase::PieceInPlay {
            piece: replacement,
            rotated_last: false,
        };
        self.charge_move(feedback_msgs);
    }

    /// Counts one placing action against the puzzle move budget; exhausting
    /// the budget ends the round. No-op in every other mode.
    fn charge_move(&mut self, feedback_msgs: &mut FeedbackMsgs) {
        let ModeState::Puzzle { moves_left } = &mut self.state.mode_state else {
            return;
        };
        *moves_left = moves_left.saturating_sub(1);
        let exhausted = *moves_left == 0;
        if exhausted {
            self.end_round(Err(GameOver::OutOfMoves), feedback_msgs);
        }
    }
}

/// Indices of all fully occupied rows, in ascending order.
fn completed_rows(board: &Board) -> Vec<usize> {
    (0..Game::HEIGHT)
        .filter(|&y| board[y].iter().all(|tile| tile.is_some()))
        .collect()
}

/// Per-column stable downwards compaction: non-empty cells slide down to fill
/// zeroed gaps, preserving their relative vertical order.
fn settle_columns(board: &mut Board) {
    for x in 0..Game::WIDTH {
        let mut write_y = Game::HEIGHT as i32 - 1;
        for y in (0..Game::HEIGHT as i32).rev() {
            if board[y as usize][x].is_some() {
                if y != write_y {
                    board[write_y as usize][x] = board[y as usize][x];
                    board[y as usize][x] = None;
                }
                write_y -= 1;
            }
        }
    }
}

/// The score bonus for clearing `lines` rows at once.
///
/// Chained cascade clears pass their combo count to multiply the award by
/// `1 + combo/2`, rounded to the nearest integer.
fn clear_award(lines: u32, is_spin: bool, level: u32, combo: u32) -> u32 {
    let idx = lines.min(4) as usize;
    let base = if is_spin {
        SPIN_POINTS[idx]
    } else {
        NORMAL_POINTS[idx]
    } * (level + 1);
    if combo > 0 {
        (f64::from(base) * (1.0 + f64::from(combo) * 0.5)).round() as u32
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_award_follows_the_point_tables() {
        assert_eq!(clear_award(1, false, 0, 0), 100);
        assert_eq!(clear_award(2, false, 0, 0), 300);
        assert_eq!(clear_award(3, false, 0, 0), 500);
        assert_eq!(clear_award(4, false, 0, 0), 800);
        assert_eq!(clear_award(1, true, 0, 0), 400);
        assert_eq!(clear_award(4, true, 0, 0), 1600);
        // Level multiplies the base award.
        assert_eq!(clear_award(1, false, 2, 0), 300);
        // Cascade chains multiply by 1 + combo/2, rounded.
        assert_eq!(clear_award(1, false, 0, 1), 150);
        assert_eq!(clear_award(1, false, 0, 3), 250);
    }

    #[test]
    fn settle_columns_preserves_relative_order() {
        let mut board = [Line::default(); Game::HEIGHT];
        let a = Tetromino::I.tile_type_id();
        let b = Tetromino::J.tile_type_id();
        board[3][0] = Some(a);
        board[10][0] = Some(b);
        settle_columns(&mut board);
        assert_eq!(board[18][0], Some(a));
        assert_eq!(board[19][0], Some(b));
        assert_eq!(board[3][0], None);
        assert_eq!(board[10][0], None);
    }

    #[test]
    fn completed_rows_requires_all_ten_cells() {
        let mut board = [Line::default(); Game::HEIGHT];
        board[19] = [Some(GARBAGE_TILE); Game::WIDTH];
        board[18] = [Some(GARBAGE_TILE); Game::WIDTH];
        board[18][3] = None;
        assert_eq!(completed_rows(&board), vec![19]);
    }
}

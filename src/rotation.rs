/*!
This module handles rotation of [`Piece`]s against the board.

Rotation is clockwise-only. A raw rotation that does not fit is retried at a
short, fixed list of "kick" offsets; the first offset at which the rotated
piece fits is committed atomically, and a piece whose rotation fails at every
offset is left untouched. The kick list is deliberately the simple 7-entry
one this engine has always used, not a full standard-rotation-system table.

The corner rule used to classify spin locks also lives here.
*/

use crate::{Board, Game, Offset, Piece, Tetromino};

/// The offsets tried, in order, when rotating a piece.
pub const KICKS: [Offset; 7] = [(0, 0), (1, 0), (-1, 0), (2, 0), (-2, 0), (0, 1), (0, -1)];

/// Tries to rotate a piece clockwise on the given board.
///
/// This will return `None` if the rotation is not possible at any kick
/// offset, and `Some(p)` with `p` as the new state of the piece otherwise.
pub fn try_rotate(piece: &Piece, board: &Board) -> Option<Piece> {
    let mut rotated = *piece;
    rotated.rotation = piece.rotation.clockwise();
    KICKS
        .iter()
        .find_map(|&offset| rotated.fits_at(board, offset))
}

/// Checks whether a piece in its current location counts as "spun in".
///
/// Only the 'T' piece supports this rule. The four diagonal neighbours of the
/// center of its 3x3 bounding box are examined against the (pre-lock) board;
/// a corner counts as occupied when it lies outside the grid in any direction
/// or holds a non-empty cell. At least 3 of 4 occupied corners make a spin.
///
/// The caller is responsible for only applying this to locks whose most
/// recent successful action was a rotation.
pub fn is_spin_position(piece: &Piece, board: &Board) -> bool {
    if piece.tetromino != Tetromino::T {
        return false;
    }
    let (cx, cy) = (piece.position.0 + 1, piece.position.1 + 1);
    let corners = [
        (cx - 1, cy - 1),
        (cx + 1, cy - 1),
        (cx - 1, cy + 1),
        (cx + 1, cy + 1),
    ];
    let occupied = corners
        .iter()
        .filter(|&&(x, y)| {
            !(0..Game::WIDTH as i32).contains(&x)
                || !(0..Game::HEIGHT as i32).contains(&y)
                || board[y as usize][x as usize].is_some()
        })
        .count();
    occupied >= 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Line, Rotation};

    fn empty_board() -> Board {
        [Line::default(); Game::HEIGHT]
    }

    fn occupied_cells(piece: &Piece) -> Vec<(i32, i32)> {
        let mut cells: Vec<_> = piece.tiles().iter().map(|&(coord, _)| coord).collect();
        cells.sort_unstable();
        cells
    }

    #[test]
    fn o_piece_rotation_never_changes_occupied_cells() {
        let board = empty_board();
        let piece = Piece {
            tetromino: Tetromino::O,
            rotation: Rotation::N,
            position: (4, 10),
        };
        let rotated = try_rotate(&piece, &board).unwrap();
        assert_eq!(occupied_cells(&piece), occupied_cells(&rotated));
        assert_eq!(rotated.position, piece.position);
    }

    #[test]
    fn rotation_commits_first_fitting_kick() {
        let board = empty_board();
        // Vertical I hugging the left wall: the raw rotation pokes out of
        // bounds, so a horizontal kick has to move it back in.
        let piece = Piece {
            tetromino: Tetromino::I,
            rotation: Rotation::E,
            position: (-2, 10),
        };
        let rotated = try_rotate(&piece, &board).unwrap();
        assert_eq!(rotated.rotation, Rotation::S);
        assert!(rotated.fits(&board));
        assert_ne!(rotated.position, piece.position);
    }

    #[test]
    fn rotation_failure_leaves_piece_untouched() {
        let mut board = empty_board();
        // Fill everything except an exactly S-shaped pocket, so no kick can help.
        for line in board.iter_mut() {
            *line = [Some(crate::GARBAGE_TILE); Game::WIDTH];
        }
        let piece = Piece {
            tetromino: Tetromino::S,
            rotation: Rotation::N,
            position: (3, 10),
        };
        for ((x, y), _) in piece.tiles() {
            board[y as usize][x as usize] = None;
        }
        assert!(piece.fits(&board));
        assert!(try_rotate(&piece, &board).is_none());
    }

    #[test]
    fn spin_rule_counts_walls_floor_and_tiles() {
        let mut board = empty_board();
        // T box anchored at (4, 17): center (5, 18), corners at
        // (4,17), (6,17), (4,19), (6,19).
        board[19][4] = Some(crate::GARBAGE_TILE);
        board[19][6] = Some(crate::GARBAGE_TILE);
        let piece = Piece {
            tetromino: Tetromino::T,
            rotation: Rotation::S,
            position: (4, 17),
        };
        // Two corners so far.
        assert!(!is_spin_position(&piece, &board));
        board[17][4] = Some(crate::GARBAGE_TILE);
        assert!(is_spin_position(&piece, &board));

        // In the bottom corner of the board two corners are out of bounds.
        let cornered = Piece {
            tetromino: Tetromino::T,
            rotation: Rotation::E,
            position: (-1, 17),
        };
        let mut wall_board = empty_board();
        wall_board[19][1] = Some(crate::GARBAGE_TILE);
        assert!(is_spin_position(&cornered, &wall_board));
    }

    #[test]
    fn spin_rule_only_applies_to_t() {
        let mut board = empty_board();
        for x in 0..Game::WIDTH {
            board[19][x] = Some(crate::GARBAGE_TILE);
        }
        let piece = Piece {
            tetromino: Tetromino::S,
            rotation: Rotation::N,
            position: (4, 17),
        };
        assert!(!is_spin_position(&piece, &board));
    }
}

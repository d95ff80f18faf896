/*!
This module handles random generation of [`Tetromino`]s.

Pieces are dealt from the standard "7-bag": a shuffled permutation of all
seven tetromino types is queued up, handed out front to back, and replaced
with a freshly shuffled permutation once exhausted. Within any run of seven
consecutive draws aligned to a bag boundary, every type therefore appears
exactly once; across a boundary no type can repeat more than twice in a row.
*/

use std::collections::VecDeque;

use rand::{seq::SliceRandom, Rng};

use crate::Tetromino;

/// Handles the information of which pieces to spawn during a game.
///
/// The bag holds no RNG of its own; the game's PRNG is passed into
/// [`TetrominoBag::draw`] so that rounds stay reproducible from their seed.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct TetrominoBag {
    /// Remaining pieces of the current (and any primed) permutation.
    queue: VecDeque<Tetromino>,
}

impl TetrominoBag {
    /// Creates an empty bag; the first draw triggers the first refill.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::with_capacity(Tetromino::VARIANTS.len()),
        }
    }

    /// Returns and removes the bag's front piece, refilling first if the bag
    /// is empty.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Tetromino {
        if self.queue.is_empty() {
            self.refill(rng);
        }
        // INVARIANT: `refill` pushed seven pieces.
        self.queue.pop_front().expect("tetromino bag empty after refill")
    }

    /// Returns the bag's front piece without removing it, refilling first if
    /// the bag is empty.
    pub fn peek<R: Rng>(&mut self, rng: &mut R) -> Tetromino {
        if self.queue.is_empty() {
            self.refill(rng);
        }
        // INVARIANT: `refill` pushed seven pieces.
        *self.queue.front().expect("tetromino bag empty after refill")
    }

    /// Pushes a fixed run of pieces to the front of the bag, to be drawn
    /// before any random ones. Intended for scripted openings and tests.
    pub fn prime(&mut self, pieces: impl IntoIterator<Item = Tetromino>) {
        let primed: Vec<_> = pieces.into_iter().collect();
        for piece in primed.into_iter().rev() {
            self.queue.push_front(piece);
        }
    }

    /// How many pieces are left before the next refill.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the next draw will trigger a refill.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Appends a uniformly-random permutation of the seven piece types.
    fn refill<R: Rng>(&mut self, rng: &mut R) {
        let mut pieces = Tetromino::VARIANTS;
        pieces.shuffle(rng);
        self.queue.extend(pieces);
    }
}

impl Default for TetrominoBag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand_chacha::{rand_core::SeedableRng, ChaCha12Rng};

    use super::*;

    #[test]
    fn seven_consecutive_draws_cover_all_types() {
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let mut bag = TetrominoBag::new();
        for _ in 0..4 {
            let drawn: HashSet<_> = (0..7).map(|_| bag.draw(&mut rng)).collect();
            assert_eq!(drawn.len(), 7);
        }
    }

    #[test]
    fn draws_are_reproducible_from_the_seed() {
        let sequence = |seed| {
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let mut bag = TetrominoBag::new();
            (0..21).map(|_| bag.draw(&mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(sequence(123), sequence(123));
    }

    #[test]
    fn primed_pieces_come_out_first_in_order() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let mut bag = TetrominoBag::new();
        bag.prime([Tetromino::T, Tetromino::I, Tetromino::O]);
        assert_eq!(bag.peek(&mut rng), Tetromino::T);
        assert_eq!(bag.draw(&mut rng), Tetromino::T);
        assert_eq!(bag.draw(&mut rng), Tetromino::I);
        assert_eq!(bag.draw(&mut rng), Tetromino::O);
        // The run after the primed pieces is again a full permutation.
        let drawn: HashSet<_> = (0..7).map(|_| bag.draw(&mut rng)).collect();
        assert_eq!(drawn.len(), 7);
    }

    #[test]
    fn peek_matches_the_following_draw() {
        let mut rng = ChaCha12Rng::seed_from_u64(99);
        let mut bag = TetrominoBag::new();
        for _ in 0..10 {
            let peeked = bag.peek(&mut rng);
            assert_eq!(bag.draw(&mut rng), peeked);
        }
    }
}

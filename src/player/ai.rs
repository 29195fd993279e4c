use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::core::{common::Move, game::GameState};
use crate::player::Player;

/// Picks uniformly among moves that stay on the board and land on an empty
/// or food square. With no such move it goes up.
pub struct RandomSafePlayer {
    rng: SmallRng,
}

impl RandomSafePlayer {
    #[cfg(feature = "std")]
    pub fn new() -> Self {
        let mut seed_rng = rand::rng();
        Self {
            rng: SmallRng::from_rng(&mut seed_rng),
        }
    }

    /// Reproducible move sequence for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

#[cfg(feature = "std")]
impl Default for RandomSafePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for RandomSafePlayer {
    fn select_move(&mut self, state: &GameState) -> Move {
        let moves = state.safe_moves();
        if moves.is_empty() {
            return Move::Up;
        }
        moves[self.rng.random_range(0..moves.len())]
    }
}

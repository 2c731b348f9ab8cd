use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::agent::Agent;
use crate::game::{Board, Player, Successor};

/// An agent that selects uniformly at random from the candidate successors.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        RandomAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomAgent {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn select_successor(
        &mut self,
        _board: &Board,
        _player: Player,
        successors: &[Successor],
        _training: bool,
    ) -> usize {
        assert!(!successors.is_empty(), "No legal moves available");
        self.rng.random_range(0..successors.len())
    }

    fn name(&self) -> &str {
        "Random"
    }
}

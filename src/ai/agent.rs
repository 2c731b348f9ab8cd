use crate::game::{Board, Player, Successor};

/// Universal interface for computer players.
pub trait Agent {
    /// Pick one of `successors` (the boards reachable by `player` from `board`)
    /// and return its index. `successors` is never empty.
    /// When `training` is true, the agent may explore; otherwise it exploits.
    fn select_successor(
        &mut self,
        board: &Board,
        player: Player,
        successors: &[Successor],
        training: bool,
    ) -> usize;

    /// Return the agent's display name.
    fn name(&self) -> &str;

    /// Called once at the start of every game.
    fn new_game(&mut self) {}
}

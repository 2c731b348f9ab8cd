//! Checkers rules: pieces, the board with move generation, and the match
//! controller that drives turns and detects the end of a game.

mod board;
mod piece;
mod player;
mod state;

pub use board::{Board, LegalMoves, Move, Successor};
pub use piece::{Piece, Square};
pub use player::Player;
pub use state::{
    GameOutcome, GameState, GameSummary, MatchResult, MoveEvent, Phase, RulesConfig,
};

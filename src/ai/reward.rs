use serde::{Deserialize, Serialize};

use crate::game::{Board, GameOutcome, Player};

/// Weights of the shaped reward handed to the learning agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub material_weight: f64,
    pub king_weight: f64,
    pub capture_bonus: f64,
    /// Extra capture bonus while the no-capture counter is below `pressure_window`.
    pub pressure_bonus: f64,
    pub pressure_window: usize,
    /// Moves without capture tolerated before the inactivity penalty kicks in.
    pub inactivity_grace: usize,
    pub inactivity_penalty: f64,
    pub advancement_weight: f64,
    pub near_promotion_rows: usize,
    pub near_promotion_bonus: f64,
    pub central_king_bonus: f64,
    pub win_bonus: f64,
    pub fast_win_moves: usize,
    pub fast_win_weight: f64,
    pub dominant_win_pieces: usize,
    pub dominant_win_weight: f64,
    pub loss_penalty: f64,
    pub loss_per_opponent_piece: f64,
    pub draw_tendency_start: usize,
    pub draw_tendency_weight: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            material_weight: 25.0,
            king_weight: 40.0,
            capture_bonus: 50.0,
            pressure_bonus: 30.0,
            pressure_window: 5,
            inactivity_grace: 5,
            inactivity_penalty: 10.0,
            advancement_weight: 5.0,
            near_promotion_rows: 2,
            near_promotion_bonus: 20.0,
            central_king_bonus: 15.0,
            win_bonus: 200.0,
            fast_win_moves: 20,
            fast_win_weight: 5.0,
            dominant_win_pieces: 2,
            dominant_win_weight: 20.0,
            loss_penalty: 200.0,
            loss_per_opponent_piece: 10.0,
            draw_tendency_start: 10,
            draw_tendency_weight: 15.0,
        }
    }
}

/// What happened around the board being scored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardContext {
    /// The learner's own move captured.
    pub captured: bool,
    pub moves_without_capture: usize,
    /// Set once the game is over.
    pub outcome: Option<GameOutcome>,
}

/// Shaped reward of `board` for `perspective`; higher is better for that side.
pub fn calc_reward(
    board: &Board,
    perspective: Player,
    ctx: &RewardContext,
    config: &RewardConfig,
) -> f64 {
    let opponent = perspective.other();
    let own = board.pieces_left(perspective);
    let opp = board.pieces_left(opponent);
    let n = ctx.moves_without_capture;
    let mut reward = 0.0;

    reward += (own as f64 - opp as f64) * config.material_weight;
    reward += (board.kings(perspective) as f64 - board.kings(opponent) as f64) * config.king_weight;

    if ctx.captured {
        reward += config.capture_bonus;
        if n < config.pressure_window {
            reward += config.pressure_bonus;
        }
    }

    if n > config.inactivity_grace {
        reward -= (n - config.inactivity_grace) as f64 * config.inactivity_penalty;
    }

    let rows = board.rows();
    let cols = board.cols();
    for piece in board.pieces_of(perspective) {
        if piece.king {
            if (1..rows - 1).contains(&piece.row) && (1..cols - 1).contains(&piece.col) {
                reward += config.central_king_bonus;
            }
        } else {
            let advanced = perspective.rows_advanced(piece.row, rows);
            reward += advanced as f64 * config.advancement_weight;
            if advanced + config.near_promotion_rows >= rows {
                reward += config.near_promotion_bonus;
            }
        }
    }

    let winner = match ctx.outcome {
        Some(outcome) => outcome.winner(),
        None => board.winner(),
    };
    match winner {
        Some(w) if w == perspective => {
            reward += config.win_bonus;
            if n < config.fast_win_moves {
                reward += (config.fast_win_moves - n) as f64 * config.fast_win_weight;
            }
            if own >= config.dominant_win_pieces {
                reward += own as f64 * config.dominant_win_weight;
            }
        }
        Some(_) => {
            reward -= config.loss_penalty;
            reward -= opp as f64 * config.loss_per_opponent_piece;
        }
        None => {}
    }

    if n >= config.draw_tendency_start {
        reward -= (n + 1 - config.draw_tendency_start) as f64 * config.draw_tendency_weight;
    }

    reward
}

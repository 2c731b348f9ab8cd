use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use crate::game::{Board, Player, Successor};

/// Search and evaluation settings for [`MinimaxAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimaxConfig {
    pub man_value: f64,
    /// Added on top of `man_value` for a king.
    pub king_bonus: f64,
    /// Per row advanced from the home row.
    pub advancement_weight: f64,
    /// Per legal move of the piece.
    pub mobility_weight: f64,
    /// Score of a decided game.
    pub win_score: f64,
    pub min_depth: usize,
    pub max_depth: usize,
    pub pruning: bool,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        MinimaxConfig {
            man_value: 1.0,
            king_bonus: 2.0,
            advancement_weight: 0.1,
            mobility_weight: 0.05,
            win_score: 100.0,
            min_depth: 1,
            max_depth: 3,
            pruning: true,
        }
    }
}

/// Trait for evaluating a board position from a player's perspective.
pub trait Heuristic {
    fn evaluate(&self, board: &Board, player: Player) -> f64;
}

/// Material, king, advancement and mobility terms.
pub struct CheckersHeuristic {
    man_value: f64,
    king_bonus: f64,
    advancement_weight: f64,
    mobility_weight: f64,
    win_score: f64,
}

impl CheckersHeuristic {
    pub fn new(config: &MinimaxConfig) -> Self {
        CheckersHeuristic {
            man_value: config.man_value,
            king_bonus: config.king_bonus,
            advancement_weight: config.advancement_weight,
            mobility_weight: config.mobility_weight,
            win_score: config.win_score,
        }
    }
}

impl Default for CheckersHeuristic {
    fn default() -> Self {
        Self::new(&MinimaxConfig::default())
    }
}

impl Heuristic for CheckersHeuristic {
    fn evaluate(&self, board: &Board, player: Player) -> f64 {
        if let Some(winner) = board.winner() {
            return if winner == player {
                self.win_score
            } else {
                -self.win_score
            };
        }

        let mut score = 0.0;
        for piece in board.pieces() {
            let mut value = self.man_value;
            if piece.king {
                value += self.king_bonus;
            }
            value += self.advancement_weight
                * piece.color.rows_advanced(piece.row, board.rows()) as f64;
            value += self.mobility_weight * board.legal_moves(piece).len() as f64;

            if piece.color == player {
                score += value;
            } else {
                score -= value;
            }
        }
        score
    }
}

/// Depth-limited minimax over successor boards, optionally with alpha-beta.
pub struct MinimaxAgent {
    depth: usize,
    min_depth: usize,
    max_depth: usize,
    pruning: bool,
    win_score: f64,
    chain_captures: bool,
    heuristic: Box<dyn Heuristic>,
    rng: StdRng,
}

impl MinimaxAgent {
    pub fn new(config: &MinimaxConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: &MinimaxConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Fixed search depth, never re-drawn between games.
    pub fn with_depth(config: &MinimaxConfig, depth: usize) -> Self {
        let config = MinimaxConfig {
            min_depth: depth,
            max_depth: depth,
            ..config.clone()
        };
        Self::new(&config)
    }

    pub fn with_heuristic(mut self, heuristic: Box<dyn Heuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Search capture chains the way `RulesConfig::chain_captures` plays them:
    /// after a jump that can continue, the same side moves again.
    pub fn with_chain_captures(mut self, chain_captures: bool) -> Self {
        self.chain_captures = chain_captures;
        self
    }

    fn with_rng(config: &MinimaxConfig, rng: StdRng) -> Self {
        assert!(
            config.min_depth <= config.max_depth,
            "min_depth {} exceeds max_depth {}",
            config.min_depth,
            config.max_depth
        );
        MinimaxAgent {
            depth: config.max_depth,
            min_depth: config.min_depth,
            max_depth: config.max_depth,
            pruning: config.pruning,
            win_score: config.win_score,
            chain_captures: false,
            heuristic: Box::new(CheckersHeuristic::new(config)),
            rng,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn evaluate(&self, board: &Board, player: Player) -> f64 {
        self.heuristic.evaluate(board, player)
    }

    /// Index of the best successor of `board` for `player`; the first one
    /// wins ties.
    pub fn choose(&self, board: &Board, player: Player, successors: &[Successor]) -> usize {
        assert!(!successors.is_empty(), "No legal moves available");

        let mut best_idx = 0;
        let mut best_score = f64::NEG_INFINITY;
        let mut alpha = f64::NEG_INFINITY;

        for (idx, succ) in successors.iter().enumerate() {
            let score = self.score_successor(
                board,
                succ,
                self.depth,
                player,
                player,
                alpha,
                f64::INFINITY,
            );
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
            if self.pruning && score > alpha {
                alpha = score;
            }
        }

        best_idx
    }

    /// The chosen successor snapshot for `player` on `board`.
    pub fn best_move(&self, board: &Board, player: Player) -> Successor {
        let mut successors = board.successors(player);
        let idx = self.choose(board, player, &successors);
        successors.swap_remove(idx)
    }

    /// Value of `succ`, just played by `mover` on `parent`, with `depth`
    /// plies left below it. Each jump of a chain counts as a ply.
    #[allow(clippy::too_many_arguments)]
    fn score_successor(
        &self,
        parent: &Board,
        succ: &Successor,
        depth: usize,
        mover: Player,
        maximizer: Player,
        alpha: f64,
        beta: f64,
    ) -> f64 {
        if self.chain_captures {
            let jumps = succ.board.chain_jumps(&succ.mv, parent.crowns(&succ.mv));
            if !jumps.is_empty() {
                if depth == 0 {
                    return self.heuristic.evaluate(&succ.board, maximizer);
                }
                let continuations: Vec<Successor> = jumps
                    .iter()
                    .map(|mv| Successor {
                        board: succ.board.apply(mv),
                        mv: mv.clone(),
                    })
                    .collect();
                return self.search(
                    &succ.board,
                    &continuations,
                    depth,
                    mover,
                    maximizer,
                    alpha,
                    beta,
                );
            }
        }
        self.minimax(&succ.board, depth, mover.other(), maximizer, alpha, beta)
    }

    fn minimax(
        &self,
        board: &Board,
        depth: usize,
        to_move: Player,
        maximizer: Player,
        alpha: f64,
        beta: f64,
    ) -> f64 {
        if depth == 0 || board.winner().is_some() {
            return self.heuristic.evaluate(board, maximizer);
        }
        let successors = board.successors(to_move);
        self.search(board, &successors, depth, to_move, maximizer, alpha, beta)
    }

    /// Best value over `successors` for `to_move`; `depth` is at least 1.
    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        board: &Board,
        successors: &[Successor],
        depth: usize,
        to_move: Player,
        maximizer: Player,
        mut alpha: f64,
        mut beta: f64,
    ) -> f64 {
        let maximizing = to_move == maximizer;
        if successors.is_empty() {
            // Blocked side loses.
            return if maximizing {
                -self.win_score
            } else {
                self.win_score
            };
        }

        let mut best = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for succ in successors {
            let score =
                self.score_successor(board, succ, depth - 1, to_move, maximizer, alpha, beta);
            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }
            if self.pruning && alpha >= beta {
                break;
            }
        }

        best
    }
}

impl Agent for MinimaxAgent {
    fn select_successor(
        &mut self,
        board: &Board,
        player: Player,
        successors: &[Successor],
        _training: bool,
    ) -> usize {
        self.choose(board, player, successors)
    }

    fn name(&self) -> &str {
        "Minimax"
    }

    fn new_game(&mut self) {
        self.depth = self.rng.random_range(self.min_depth..=self.max_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::RandomAgent;
    use crate::game::{GameOutcome, GameState, Piece, RulesConfig, Square};

    // --- Heuristic tests ---

    #[test]
    fn heuristic_initial_board_is_balanced() {
        let h = CheckersHeuristic::default();
        let board = Board::standard();
        assert!(h.evaluate(&board, Player::White).abs() < 1e-9);
        assert!(h.evaluate(&board, Player::Red).abs() < 1e-9);
    }

    #[test]
    fn heuristic_is_zero_sum() {
        let h = CheckersHeuristic::default();
        let mut board = Board::empty(4, 4);
        board.place(Piece::king(1, 2, Player::White));
        board.place(Piece::new(3, 0, Player::Red));
        board.place(Piece::new(3, 2, Player::Red));
        let white = h.evaluate(&board, Player::White);
        let red = h.evaluate(&board, Player::Red);
        assert!((white + red).abs() < 1e-9, "{white} vs {red}");
    }

    #[test]
    fn heuristic_prefers_king() {
        let h = CheckersHeuristic::default();
        let mut man = Board::empty(4, 4);
        man.place(Piece::new(1, 2, Player::White));
        man.place(Piece::new(3, 0, Player::Red));
        let mut king = Board::empty(4, 4);
        king.place(Piece::king(1, 2, Player::White));
        king.place(Piece::new(3, 0, Player::Red));
        assert!(h.evaluate(&king, Player::White) > h.evaluate(&man, Player::White) + 1.5);
    }

    #[test]
    fn heuristic_scores_decided_game() {
        let h = CheckersHeuristic::default();
        let mut board = Board::empty(4, 4);
        board.place(Piece::new(1, 2, Player::White));
        assert_eq!(h.evaluate(&board, Player::White), 100.0);
        assert_eq!(h.evaluate(&board, Player::Red), -100.0);
    }

    // --- Search tests ---

    #[test]
    fn takes_winning_capture() {
        let mut board = Board::empty(4, 4);
        board.place(Piece::new(0, 1, Player::White));
        board.place(Piece::new(1, 2, Player::Red));
        let agent = MinimaxAgent::with_depth(&MinimaxConfig::default(), 1);
        let best = agent.best_move(&board, Player::White);
        assert_eq!(best.mv.to, Square::new(2, 3));
        assert_eq!(best.board.winner(), Some(Player::White));
    }

    #[test]
    fn avoids_hanging_last_piece() {
        // Stepping to (1, 2) lets Red jump back to (0, 3).
        let mut board = Board::empty(6, 6);
        board.place(Piece::new(0, 3, Player::White));
        board.place(Piece::new(2, 1, Player::Red));
        let agent = MinimaxAgent::with_depth(&MinimaxConfig::default(), 1);
        let successors = board.successors(Player::White);
        assert_eq!(successors[0].mv.to, Square::new(1, 2));

        let best = agent.best_move(&board, Player::White);
        assert_eq!(best.mv.to, Square::new(1, 4));
    }

    #[test]
    fn ties_keep_first_successor() {
        struct Flat;
        impl Heuristic for Flat {
            fn evaluate(&self, _board: &Board, _player: Player) -> f64 {
                0.0
            }
        }
        let agent =
            MinimaxAgent::with_depth(&MinimaxConfig::default(), 2).with_heuristic(Box::new(Flat));
        let board = Board::standard();
        let successors = board.successors(Player::White);
        assert_eq!(agent.choose(&board, Player::White, &successors), 0);
    }

    struct Material;

    impl Heuristic for Material {
        fn evaluate(&self, board: &Board, player: Player) -> f64 {
            board.pieces_left(player) as f64 - board.pieces_left(player.other()) as f64
        }
    }

    fn chain_position() -> Board {
        // The jump from (0, 1) over (1, 2) can go on over (3, 4). Stopped
        // after the first jump, Red recaptures from (3, 4).
        let mut board = Board::empty(6, 6);
        board.place(Piece::new(0, 1, Player::White));
        board.place(Piece::new(0, 5, Player::White));
        board.place(Piece::new(1, 2, Player::Red));
        board.place(Piece::new(3, 4, Player::Red));
        board.place(Piece::new(5, 0, Player::Red));
        board
    }

    #[test]
    fn search_follows_capture_chains() {
        let board = chain_position();
        let successors = board.successors(Player::White);
        assert_eq!(successors[1].mv.to, Square::new(2, 3));

        let single = MinimaxAgent::with_depth(&MinimaxConfig::default(), 1)
            .with_heuristic(Box::new(Material));
        assert_eq!(single.choose(&board, Player::White, &successors), 0);

        let chained = MinimaxAgent::with_depth(&MinimaxConfig::default(), 1)
            .with_heuristic(Box::new(Material))
            .with_chain_captures(true);
        assert_eq!(chained.choose(&board, Player::White, &successors), 1);
    }

    #[test]
    fn agent_finishes_chain_through_controller() {
        let rules = RulesConfig {
            rows: 6,
            cols: 6,
            chain_captures: true,
            ..RulesConfig::default()
        };
        let mut state = GameState::from_board(chain_position(), Player::White, rules.clone());
        let mut agent = MinimaxAgent::with_depth(&MinimaxConfig::default(), 1)
            .with_heuristic(Box::new(Material))
            .with_chain_captures(rules.chain_captures);

        let first = state.request_computer_move(&mut agent, false).unwrap();
        assert_eq!((first.from, first.to), (Square::new(0, 1), Square::new(2, 3)));
        assert!(first.continues_chain);
        assert_eq!(state.turn(), Player::White);

        let continuations = state.candidate_successors();
        assert_eq!(continuations.len(), 1);
        assert_eq!(continuations[0].mv.from, Square::new(2, 3));

        let second = state.request_computer_move(&mut agent, false).unwrap();
        assert_eq!(second.to, Square::new(4, 5));
        assert_eq!(second.captured, vec![Square::new(3, 4)]);
        assert_eq!(state.turn(), Player::Red);
        assert_eq!(state.board().pieces_left(Player::Red), 1);
    }

    #[test]
    fn pruning_does_not_change_choice() {
        let mut random = RandomAgent::with_seed(11);
        for depth in 1..=3 {
            let pruned = MinimaxAgent::with_depth(&MinimaxConfig::default(), depth);
            let plain = MinimaxAgent::with_depth(
                &MinimaxConfig {
                    pruning: false,
                    ..MinimaxConfig::default()
                },
                depth,
            );

            for _ in 0..5 {
                let mut state = GameState::default();
                while !state.is_terminal() {
                    let successors = state.candidate_successors();
                    let player = state.turn();
                    assert_eq!(
                        pruned.choose(state.board(), player, &successors),
                        plain.choose(state.board(), player, &successors),
                        "depth {depth} diverged on\n{}",
                        state.board()
                    );
                    state.request_computer_move(&mut random, false);
                }
            }
        }
    }

    #[test]
    fn new_game_draws_depth_in_range() {
        let config = MinimaxConfig::default();
        let mut agent = MinimaxAgent::with_seed(&config, 3);
        let mut seen = [false; 4];
        for _ in 0..100 {
            agent.new_game();
            let depth = agent.depth();
            assert!((1..=3).contains(&depth), "depth {depth} out of range");
            seen[depth] = true;
        }
        assert!(seen[1] && seen[2] && seen[3]);
    }

    #[test]
    #[should_panic(expected = "exceeds max_depth")]
    fn rejects_inverted_depth_range() {
        MinimaxAgent::new(&MinimaxConfig {
            min_depth: 3,
            max_depth: 1,
            ..MinimaxConfig::default()
        });
    }

    // --- Integration tests ---

    #[test]
    fn does_not_lose_more_than_it_wins_against_random() {
        let mut wins = 0;
        let mut losses = 0;
        for seed in 0..20 {
            let mut minimax = MinimaxAgent::with_depth(&MinimaxConfig::default(), 3);
            let mut random = RandomAgent::with_seed(seed);
            let mut state = GameState::new(RulesConfig::default());
            while !state.is_terminal() {
                let agent: &mut dyn Agent = match state.turn() {
                    Player::White => &mut minimax,
                    Player::Red => &mut random,
                };
                state.request_computer_move(agent, false);
            }
            match state.outcome().and_then(|o: GameOutcome| o.winner()) {
                Some(Player::White) => wins += 1,
                Some(Player::Red) => losses += 1,
                None => {}
            }
        }
        assert!(wins >= losses, "minimax won {wins} and lost {losses}");
    }

    #[test]
    fn name_is_minimax() {
        let agent = MinimaxAgent::new(&MinimaxConfig::default());
        assert_eq!(agent.name(), "Minimax");
    }
}

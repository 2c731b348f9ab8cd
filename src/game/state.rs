use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{Board, LegalMoves, Move, Player, Square, Successor};
use crate::ai::Agent;

/// Board geometry and draw rule for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub rows: usize,
    pub cols: usize,
    pub home_rows: usize,
    /// Consecutive moves without a capture that end the game in a draw.
    pub no_capture_limit: usize,
    /// Keep the turn after a capture while the capturing piece can jump again.
    pub chain_captures: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            rows: 4,
            cols: 4,
            home_rows: 1,
            no_capture_limit: 64,
            chain_captures: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// The other side has no pieces left.
    Winner(Player),
    /// The side to move had no legal move.
    Blocked { loser: Player },
    Draw,
}

impl GameOutcome {
    pub fn winner(&self) -> Option<Player> {
        match *self {
            GameOutcome::Winner(p) => Some(p),
            GameOutcome::Blocked { loser } => Some(loser.other()),
            GameOutcome::Draw => None,
        }
    }

    /// Classify the outcome from `player`'s point of view.
    pub fn result_for(&self, player: Player) -> MatchResult {
        match *self {
            GameOutcome::Winner(w) if w == player => MatchResult::Win,
            GameOutcome::Winner(_) => MatchResult::Loss,
            GameOutcome::Blocked { loser } if loser == player => MatchResult::BlockedLoss,
            GameOutcome::Blocked { .. } => MatchResult::BlockedWin,
            GameOutcome::Draw => MatchResult::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Win,
    Loss,
    BlockedWin,
    BlockedLoss,
    Draw,
}

impl MatchResult {
    pub fn is_win(self) -> bool {
        matches!(self, MatchResult::Win | MatchResult::BlockedWin)
    }

    pub fn is_loss(self) -> bool {
        matches!(self, MatchResult::Loss | MatchResult::BlockedLoss)
    }

    pub fn name(self) -> &'static str {
        match self {
            MatchResult::Win => "win",
            MatchResult::Loss => "loss",
            MatchResult::BlockedWin => "blocked-win",
            MatchResult::BlockedLoss => "blocked-loss",
            MatchResult::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingSelection,
    PieceSelected(Square),
    GameOver(GameOutcome),
}

/// Emitted for every committed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEvent {
    pub player: Player,
    pub from: Square,
    pub to: Square,
    pub captured: Vec<Square>,
    pub promoted: bool,
    /// The same side moves again to continue a capture chain.
    pub continues_chain: bool,
}

impl MoveEvent {
    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }
}

/// End-of-game (or current) statistics for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub game_id: u64,
    pub outcome: Option<GameOutcome>,
    pub total_moves: usize,
    pub elapsed: Duration,
    pub white_left: usize,
    pub red_left: usize,
    pub white_kings: usize,
    pub red_kings: usize,
    pub captured_by_white: usize,
    pub captured_by_red: usize,
}

/// Turn-based match controller around a live [`Board`].
#[derive(Debug, Clone)]
pub struct GameState {
    id: u64,
    rules: RulesConfig,
    board: Board,
    turn: Player,
    phase: Phase,
    legal_moves: LegalMoves,
    chain_from: Option<Square>,
    moves_without_capture: usize,
    total_moves: usize,
    initial_pieces: [usize; 2],
    started: Instant,
}

impl GameState {
    /// Create the initial game state; White moves first.
    pub fn new(rules: RulesConfig) -> Self {
        let board = Board::new(rules.rows, rules.cols, rules.home_rows);
        Self::from_board(board, Player::White, rules)
    }

    /// Start a game from an arbitrary position.
    pub fn from_board(board: Board, turn: Player, rules: RulesConfig) -> Self {
        let initial_pieces = [
            board.pieces_left(Player::White),
            board.pieces_left(Player::Red),
        ];
        let mut state = GameState {
            id: rand::random(),
            rules,
            board,
            turn,
            phase: Phase::AwaitingSelection,
            legal_moves: LegalMoves::new(),
            chain_from: None,
            moves_without_capture: 0,
            total_moves: 0,
            initial_pieces,
            started: Instant::now(),
        };
        state.update_terminal();
        state
    }

    /// Discard the current game and set up a fresh one with the same rules.
    pub fn reset(&mut self) {
        *self = GameState::new(self.rules.clone());
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.phase {
            Phase::GameOver(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn moves_without_capture(&self) -> usize {
        self.moves_without_capture
    }

    pub fn total_moves(&self) -> usize {
        self.total_moves
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Destinations for the selected piece; empty when nothing is selected.
    pub fn legal_moves_for_selection(&self) -> &LegalMoves {
        &self.legal_moves
    }

    /// Handle a click on `sq`. With a piece selected, a legal destination
    /// plays the move; any other cell is retried as a new selection.
    pub fn select(&mut self, sq: Square) -> bool {
        match self.phase {
            Phase::GameOver(_) => return false,
            Phase::PieceSelected(_) => {
                if self.move_to(sq).is_some() {
                    return true;
                }
                if self.chain_from.is_some() {
                    // The capturing piece has to finish its chain.
                    return false;
                }
                self.phase = Phase::AwaitingSelection;
                self.legal_moves.clear();
            }
            Phase::AwaitingSelection => {}
        }

        if !self.board.in_bounds(sq) {
            return false;
        }
        match self.board.piece_at(sq) {
            Some(piece) if piece.color == self.turn => {
                let moves = self.board.legal_moves(piece);
                if moves.is_empty() {
                    return false;
                }
                self.phase = Phase::PieceSelected(sq);
                self.legal_moves = moves;
                true
            }
            _ => false,
        }
    }

    /// Move the selected piece to `to` if that is one of its legal moves.
    pub fn move_to(&mut self, to: Square) -> Option<MoveEvent> {
        let Phase::PieceSelected(from) = self.phase else {
            return None;
        };
        self.legal_moves = self.moves_for(from);
        let mv = self.legal_moves.get(to)?.clone();

        let promoted = self.board.move_piece(mv.from, mv.to);
        self.board.remove_pieces(&mv.captured);
        Some(self.finish_move(mv, promoted))
    }

    /// Successor boards available to the side to move.
    pub fn candidate_successors(&self) -> Vec<Successor> {
        if self.is_terminal() {
            return Vec::new();
        }
        match self.chain_from {
            Some(from) => self
                .moves_for(from)
                .iter()
                .map(|mv| Successor {
                    board: self.board.apply(mv),
                    mv: mv.clone(),
                })
                .collect(),
            None => self.board.successors(self.turn),
        }
    }

    /// Adopt a successor chosen by a computer player as the live board.
    pub fn commit(&mut self, successor: Successor) -> MoveEvent {
        assert!(!self.is_terminal(), "cannot move after the game is over");
        let Successor { mv, board } = successor;
        let piece = *self
            .board
            .piece_at(mv.from)
            .unwrap_or_else(|| panic!("no piece on {}", mv.from));
        assert_eq!(piece.color, self.turn, "successor moves the wrong side");
        assert!(
            self.moves_for(mv.from).get(mv.to) == Some(&mv),
            "successor move {} -> {} is not legal",
            mv.from,
            mv.to
        );

        let promoted = !piece.king && board.piece_at(mv.to).is_some_and(|p| p.king);
        self.board = board;
        self.finish_move(mv, promoted)
    }

    /// Ask `agent` for a move for the side to move and play it.
    pub fn request_computer_move(
        &mut self,
        agent: &mut dyn Agent,
        training: bool,
    ) -> Option<MoveEvent> {
        if self.is_terminal() {
            return None;
        }
        let mut successors = self.candidate_successors();
        if successors.is_empty() {
            self.update_terminal();
            return None;
        }
        let idx = agent.select_successor(&self.board, self.turn, &successors, training);
        assert!(
            idx < successors.len(),
            "{} picked successor {idx} of {}",
            agent.name(),
            successors.len()
        );
        Some(self.commit(successors.swap_remove(idx)))
    }

    pub fn summary(&self) -> GameSummary {
        let white_left = self.board.pieces_left(Player::White);
        let red_left = self.board.pieces_left(Player::Red);
        GameSummary {
            game_id: self.id,
            outcome: self.outcome(),
            total_moves: self.total_moves,
            elapsed: self.elapsed(),
            white_left,
            red_left,
            white_kings: self.board.kings(Player::White),
            red_kings: self.board.kings(Player::Red),
            captured_by_white: self.initial_pieces[Player::Red.idx()].saturating_sub(red_left),
            captured_by_red: self.initial_pieces[Player::White.idx()].saturating_sub(white_left),
        }
    }

    /// Fresh legal moves for the piece on `from`, jumps only mid-chain.
    fn moves_for(&self, from: Square) -> LegalMoves {
        let moves = self.board.legal_moves_from(from);
        if self.chain_from.is_some() {
            moves.captures_only()
        } else {
            moves
        }
    }

    fn finish_move(&mut self, mv: Move, promoted: bool) -> MoveEvent {
        let player = self.turn;
        self.total_moves += 1;
        if mv.is_capture() {
            self.moves_without_capture = 0;
        } else {
            self.moves_without_capture += 1;
        }

        let continues_chain =
            self.rules.chain_captures && !self.board.chain_jumps(&mv, promoted).is_empty();

        if continues_chain {
            self.chain_from = Some(mv.to);
            self.phase = Phase::PieceSelected(mv.to);
            self.legal_moves = self.moves_for(mv.to);
        } else {
            self.change_turn();
        }

        debug!(
            "{} {} -> {} captured {:?}{}",
            player.name(),
            mv.from,
            mv.to,
            mv.captured,
            if promoted { " (crowned)" } else { "" }
        );

        self.update_terminal();

        MoveEvent {
            player,
            from: mv.from,
            to: mv.to,
            captured: mv.captured,
            promoted,
            continues_chain,
        }
    }

    fn change_turn(&mut self) {
        self.turn = self.turn.other();
        self.chain_from = None;
        self.phase = Phase::AwaitingSelection;
        self.legal_moves.clear();
    }

    fn update_terminal(&mut self) {
        if self.is_terminal() {
            return;
        }

        let outcome = if let Some(winner) = self.board.winner() {
            Some(GameOutcome::Winner(winner))
        } else if self.chain_from.is_none() && self.board.is_blocked(self.turn) {
            Some(GameOutcome::Blocked { loser: self.turn })
        } else if self.moves_without_capture >= self.rules.no_capture_limit {
            Some(GameOutcome::Draw)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            info!(
                "game {:016x} over after {} moves: {:?}",
                self.id, self.total_moves, outcome
            );
            self.phase = Phase::GameOver(outcome);
            self.chain_from = None;
            self.legal_moves.clear();
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}

use std::fmt;

use super::{Piece, Player, Square};

/// A single legal step: the piece on `from` lands on `to`, removing the
/// pieces on `captured`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub captured: Vec<Square>,
}

impl Move {
    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }
}

/// Legal moves of one piece keyed by destination, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegalMoves {
    moves: Vec<Move>,
}

impl LegalMoves {
    pub fn new() -> Self {
        LegalMoves { moves: Vec::new() }
    }

    /// Insert a move, replacing any earlier move to the same destination.
    pub fn insert(&mut self, mv: Move) {
        match self.moves.iter_mut().find(|m| m.to == mv.to) {
            Some(existing) => *existing = mv,
            None => self.moves.push(mv),
        }
    }

    pub fn get(&self, to: Square) -> Option<&Move> {
        self.moves.iter().find(|m| m.to == to)
    }

    /// Captured cells implied by moving to `to`.
    pub fn captured(&self, to: Square) -> Option<&[Square]> {
        self.get(to).map(|m| m.captured.as_slice())
    }

    pub fn destinations(&self) -> impl Iterator<Item = Square> + '_ {
        self.moves.iter().map(|m| m.to)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }

    /// Keep only the jumps.
    pub fn captures_only(&self) -> LegalMoves {
        LegalMoves {
            moves: self.moves.iter().filter(|m| m.is_capture()).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }
}

impl<'a> IntoIterator for &'a LegalMoves {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

/// A detached board reached by playing `mv`, captures already resolved.
#[derive(Debug, Clone)]
pub struct Successor {
    pub mv: Move,
    pub board: Board,
}

impl Successor {
    pub fn is_capture(&self) -> bool {
        self.mv.is_capture()
    }
}

/// Checkers board. Owns its pieces; cloning yields an independent snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Piece>>,
    left: [usize; 2],
    kings: [usize; 2],
}

impl Board {
    /// Create a board with `home_rows` rows of men per side on the dark cells.
    pub fn new(rows: usize, cols: usize, home_rows: usize) -> Self {
        assert!(
            rows > 2 * home_rows,
            "{home_rows} home rows per side do not fit on {rows} rows"
        );
        let mut board = Board::empty(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let sq = Square::new(row, col);
                if !board.is_playable(sq) {
                    continue;
                }
                if row < home_rows {
                    board.place(Piece::new(row, col, Player::White));
                } else if row >= rows - home_rows {
                    board.place(Piece::new(row, col, Player::Red));
                }
            }
        }
        board
    }

    /// The reference 4x4 board with one home row per side.
    pub fn standard() -> Self {
        Board::new(4, 4, 1)
    }

    /// Create a board with no pieces.
    pub fn empty(rows: usize, cols: usize) -> Self {
        assert!(rows >= 2 && cols >= 2, "board must be at least 2x2");
        Board {
            rows,
            cols,
            cells: vec![None; rows * cols],
            left: [0; 2],
            kings: [0; 2],
        }
    }

    /// Put a piece on its own square. The square must be empty.
    pub fn place(&mut self, piece: Piece) {
        let idx = self.index(piece.square());
        assert!(
            self.cells[idx].is_none(),
            "cell {} is already occupied",
            piece.square()
        );
        self.left[piece.color.idx()] += 1;
        if piece.king {
            self.kings[piece.color.idx()] += 1;
        }
        self.cells[idx] = Some(piece);
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, sq: Square) -> bool {
        sq.row < self.rows && sq.col < self.cols
    }

    /// Dark cells, the only ones pieces ever occupy.
    pub fn is_playable(&self, sq: Square) -> bool {
        (sq.row + sq.col) % 2 == 1
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Piece> {
        self.piece_at(Square::new(row, col))
    }

    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.cells[self.index(sq)].as_ref()
    }

    pub fn pieces_left(&self, player: Player) -> usize {
        self.left[player.idx()]
    }

    pub fn kings(&self, player: Player) -> usize {
        self.kings[player.idx()]
    }

    /// All pieces in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.cells.iter().flatten()
    }

    pub fn pieces_of(&self, player: Player) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces().filter(move |p| p.color == player)
    }

    /// Moves available to `piece`, one entry per destination. Each jump is its
    /// own entry with exactly one captured cell.
    pub fn legal_moves(&self, piece: &Piece) -> LegalMoves {
        let mut moves = LegalMoves::new();
        let from = piece.square();

        for dir in piece.directions() {
            let Some(adjacent) = from.offset(dir, 1, self.rows, self.cols) else {
                continue;
            };
            match self.piece_at(adjacent) {
                None => moves.insert(Move {
                    from,
                    to: adjacent,
                    captured: Vec::new(),
                }),
                Some(other) if other.color != piece.color => {
                    if let Some(landing) = from.offset(dir, 2, self.rows, self.cols) {
                        if self.piece_at(landing).is_none() {
                            moves.insert(Move {
                                from,
                                to: landing,
                                captured: vec![adjacent],
                            });
                        }
                    }
                }
                Some(_) => {}
            }
        }

        moves
    }

    /// Legal moves of whatever occupies `sq`; empty for an empty cell.
    pub fn legal_moves_from(&self, sq: Square) -> LegalMoves {
        self.piece_at(sq)
            .map(|piece| self.legal_moves(piece))
            .unwrap_or_default()
    }

    /// Whether `mv` crowns the man it moves.
    pub fn crowns(&self, mv: &Move) -> bool {
        self.piece_at(mv.from)
            .is_some_and(|p| !p.king && mv.to.row == p.color.promotion_row(self.rows))
    }

    /// Further jumps for the piece that just landed with `mv`. Empty unless
    /// `mv` captured without crowning and the game is still open.
    pub fn chain_jumps(&self, mv: &Move, crowned: bool) -> LegalMoves {
        if !mv.is_capture() || crowned || self.winner().is_some() {
            return LegalMoves::new();
        }
        self.legal_moves_from(mv.to).captures_only()
    }

    /// Relocate the piece on `from` to the empty cell `to`, crowning it on its
    /// promotion row. Returns whether the piece was crowned by this move.
    pub fn move_piece(&mut self, from: Square, to: Square) -> bool {
        let from_idx = self.index(from);
        let to_idx = self.index(to);
        assert!(self.cells[to_idx].is_none(), "destination {to} is occupied");

        let mut piece = self.cells[from_idx]
            .take()
            .unwrap_or_else(|| panic!("no piece to move on {from}"));
        piece.move_to(to);

        let promoted = to.row == piece.color.promotion_row(self.rows) && piece.make_king();
        if promoted {
            self.kings[piece.color.idx()] += 1;
        }
        self.cells[to_idx] = Some(piece);
        promoted
    }

    /// Clear the given cells. Empty cells are skipped.
    pub fn remove_pieces(&mut self, cells: &[Square]) {
        for &sq in cells {
            let idx = self.index(sq);
            if let Some(piece) = self.cells[idx].take() {
                let color = piece.color.idx();
                assert!(self.left[color] > 0, "live piece count underflow");
                self.left[color] -= 1;
                if piece.king {
                    assert!(self.kings[color] > 0, "king count underflow");
                    self.kings[color] -= 1;
                }
            }
        }
    }

    /// The side whose opponent has no pieces left.
    pub fn winner(&self) -> Option<Player> {
        if self.pieces_left(Player::Red) == 0 {
            Some(Player::White)
        } else if self.pieces_left(Player::White) == 0 {
            Some(Player::Red)
        } else {
            None
        }
    }

    /// True iff no piece of `player` can move.
    pub fn is_blocked(&self, player: Player) -> bool {
        self.pieces_of(player)
            .all(|piece| self.legal_moves(piece).is_empty())
    }

    /// Independent deep copy for lookahead.
    pub fn snapshot(&self) -> Board {
        self.clone()
    }

    /// Snapshot with `mv` played and its captures removed.
    pub fn apply(&self, mv: &Move) -> Board {
        let mut next = self.snapshot();
        next.move_piece(mv.from, mv.to);
        next.remove_pieces(&mv.captured);
        next
    }

    /// One successor per legal move of `player`: pieces row-major, then
    /// direction order.
    pub fn successors(&self, player: Player) -> Vec<Successor> {
        let mut successors = Vec::new();
        for piece in self.pieces_of(player) {
            for mv in &self.legal_moves(piece) {
                successors.push(Successor {
                    board: self.apply(mv),
                    mv: mv.clone(),
                });
            }
        }
        successors
    }

    fn index(&self, sq: Square) -> usize {
        assert!(
            self.in_bounds(sq),
            "square {sq} outside {}x{} board",
            self.rows,
            self.cols
        );
        sq.row * self.cols + sq.col
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let symbol = match self.get(row, col) {
                    None if self.is_playable(Square::new(row, col)) => '.',
                    None => ' ',
                    Some(p) => match (p.color, p.king) {
                        (Player::White, false) => 'w',
                        (Player::White, true) => 'W',
                        (Player::Red, false) => 'r',
                        (Player::Red, true) => 'R',
                    },
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

use std::fmt;

use super::Player;

/// A board coordinate. Row 0 is White's back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub const fn new(row: usize, col: usize) -> Self {
        Square { row, col }
    }

    /// Step `steps` times along a diagonal, or `None` if that leaves the
    /// `rows` x `cols` board.
    pub fn offset(self, dir: (isize, isize), steps: isize, rows: usize, cols: usize) -> Option<Square> {
        let row = self.row as isize + dir.0 * steps;
        let col = self.col as isize + dir.1 * steps;
        if row < 0 || col < 0 || row >= rows as isize || col >= cols as isize {
            return None;
        }
        Some(Square::new(row as usize, col as usize))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A game token. Its position mirrors the cell the board stores it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub row: usize,
    pub col: usize,
    pub color: Player,
    pub king: bool,
}

impl Piece {
    pub fn new(row: usize, col: usize, color: Player) -> Self {
        Piece {
            row,
            col,
            color,
            king: false,
        }
    }

    pub fn king(row: usize, col: usize, color: Player) -> Self {
        Piece {
            king: true,
            ..Piece::new(row, col, color)
        }
    }

    pub fn square(&self) -> Square {
        Square::new(self.row, self.col)
    }

    /// Crown the piece. Returns `true` only the first time.
    pub fn make_king(&mut self) -> bool {
        if self.king {
            return false;
        }
        self.king = true;
        true
    }

    pub(crate) fn move_to(&mut self, to: Square) {
        self.row = to.row;
        self.col = to.col;
    }

    /// Diagonal directions this piece may travel, in generation order.
    pub fn directions(&self) -> Vec<(isize, isize)> {
        if self.king {
            return vec![(-1, -1), (-1, 1), (1, -1), (1, 1)];
        }
        let forward = self.color.forward();
        vec![(forward, -1), (forward, 1)]
    }
}

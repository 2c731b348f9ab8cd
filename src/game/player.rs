use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    White,
    Red,
}

impl Player {
    /// Get the other player
    pub fn other(self) -> Player {
        match self {
            Player::White => Player::Red,
            Player::Red => Player::White,
        }
    }

    /// Index into per-player counters
    pub fn idx(self) -> usize {
        match self {
            Player::White => 0,
            Player::Red => 1,
        }
    }

    /// Row step of a man moving forward. White starts at the top.
    pub fn forward(self) -> isize {
        match self {
            Player::White => 1,
            Player::Red => -1,
        }
    }

    /// Row on which a man of this color is crowned.
    pub fn promotion_row(self, rows: usize) -> usize {
        match self {
            Player::White => rows - 1,
            Player::Red => 0,
        }
    }

    /// Number of rows a piece on `row` has advanced from its own back rank.
    pub fn rows_advanced(self, row: usize, rows: usize) -> usize {
        match self {
            Player::White => row,
            Player::Red => rows - 1 - row,
        }
    }

    /// Get player name for display
    pub fn name(self) -> &'static str {
        match self {
            Player::White => "White",
            Player::Red => "Red",
        }
    }
}

use crate::game::{Board, Player};

/// Encode a board layout as a learning-table key.
///
/// Cells are visited row-major and joined with `,`:
/// `0` for empty, `1` for White, `2` for Red, followed by `N` (man) or `K` (king).
pub fn state_key(board: &Board) -> String {
    let mut tokens = Vec::with_capacity(board.rows() * board.cols());
    for row in 0..board.rows() {
        for col in 0..board.cols() {
            let token = match board.get(row, col) {
                None => "0",
                Some(p) => match (p.color, p.king) {
                    (Player::White, false) => "1N",
                    (Player::White, true) => "1K",
                    (Player::Red, false) => "2N",
                    (Player::Red, true) => "2K",
                },
            };
            tokens.push(token);
        }
    }
    tokens.join(",")
}

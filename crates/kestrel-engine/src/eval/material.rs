//! Material balance with a few positional nudges.
//!
//! All scores are returned from White's perspective (positive = White ahead).

use kestrel_core::{Board, Color, Piece, Square};

use crate::eval::Evaluator;

const PAWN_VALUE: i32 = 100;
const KNIGHT_VALUE: i32 = 295;
const BISHOP_VALUE: i32 = 315;
const ROOK_VALUE: i32 = 500;
const QUEEN_VALUE: i32 = 900;

/// Per rank advanced from the pawn's own back rank.
const PAWN_ADVANCE_BONUS: i32 = 2;
/// Pawn on the d- or e-file.
const PAWN_CENTRE_BONUS: i32 = 2;
/// Knight inside c3-f6.
const KNIGHT_CENTRE_BONUS: i32 = 5;
/// Knight on d4, e4, d5 or e5, on top of [`KNIGHT_CENTRE_BONUS`].
const KNIGHT_CORE_BONUS: i32 = 5;
/// Bishop that has left its back rank.
const BISHOP_DEVELOPED_BONUS: i32 = 10;

/// Hand-written material evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        side_score(board, Color::White) - side_score(board, Color::Black)
    }
}

/// Rank index counted from `color`'s own back rank.
fn relative_rank(sq: Square, color: Color) -> usize {
    let rank = sq.get_rank().to_index();
    match color {
        Color::White => rank,
        Color::Black => 7 - rank,
    }
}

fn side_score(board: &Board, color: Color) -> i32 {
    let own = *board.color_combined(color);
    let mut score = 0;

    for sq in *board.pieces(Piece::Pawn) & own {
        let file = sq.get_file().to_index();
        score += PAWN_VALUE + PAWN_ADVANCE_BONUS * relative_rank(sq, color) as i32;
        if file == 3 || file == 4 {
            score += PAWN_CENTRE_BONUS;
        }
    }

    for sq in *board.pieces(Piece::Knight) & own {
        let file = sq.get_file().to_index();
        let rank = sq.get_rank().to_index();
        score += KNIGHT_VALUE;
        if (2..=5).contains(&file) && (2..=5).contains(&rank) {
            score += KNIGHT_CENTRE_BONUS;
        }
        if (3..=4).contains(&file) && (3..=4).contains(&rank) {
            score += KNIGHT_CORE_BONUS;
        }
    }

    for sq in *board.pieces(Piece::Bishop) & own {
        score += BISHOP_VALUE;
        if relative_rank(sq, color) != 0 {
            score += BISHOP_DEVELOPED_BONUS;
        }
    }

    score += ROOK_VALUE * (*board.pieces(Piece::Rook) & own).popcnt() as i32;
    score += QUEEN_VALUE * (*board.pieces(Piece::Queen) & own).popcnt() as i32;
    score
}

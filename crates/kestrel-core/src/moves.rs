//! Move classification used by move ordering and quiescence search.

use chess::{Board, ChessMove, Piece};

/// The piece standing on the move's origin square.
pub fn moving_piece(board: &Board, mv: ChessMove) -> Option<Piece> {
    board.piece_on(mv.get_source())
}

/// A pawn moving diagonally onto an empty square.
pub fn is_en_passant(board: &Board, mv: ChessMove) -> bool {
    moving_piece(board, mv) == Some(Piece::Pawn)
        && mv.get_source().get_file() != mv.get_dest().get_file()
        && board.piece_on(mv.get_dest()).is_none()
}

/// The piece removed by `mv`, if any. En passant captures a pawn.
pub fn captured_piece(board: &Board, mv: ChessMove) -> Option<Piece> {
    board
        .piece_on(mv.get_dest())
        .or_else(|| is_en_passant(board, mv).then_some(Piece::Pawn))
}

/// Whether `mv` captures, including en passant.
pub fn is_capture(board: &Board, mv: ChessMove) -> bool {
    captured_piece(board, mv).is_some()
}

/// Whether `mv` promotes a pawn.
pub fn is_promotion(mv: ChessMove) -> bool {
    mv.get_promotion().is_some()
}

/// Captures and promotions: the moves quiescence search explores.
pub fn is_tactical(board: &Board, mv: ChessMove) -> bool {
    is_promotion(mv) || is_capture(board, mv)
}

/// Whether the opponent is in check after `mv`.
pub fn gives_check(board: &Board, mv: ChessMove) -> bool {
    board.make_move_new(mv).checkers().popcnt() > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Game;

    fn setup(fen: &str, uci: &str) -> (Board, ChessMove) {
        let game = Game::from_fen(fen).unwrap();
        let mv = game.parse_uci(uci).unwrap();
        (*game.board(), mv)
    }

    #[test]
    fn quiet_move_is_not_tactical() {
        let game = Game::startpos();
        let mv = game.parse_uci("g1f3").unwrap();
        assert!(!is_capture(game.board(), mv));
        assert!(!is_tactical(game.board(), mv));
        assert_eq!(moving_piece(game.board(), mv), Some(Piece::Knight));
    }

    #[test]
    fn capture_reports_victim() {
        let (board, mv) = setup("4k3/8/8/4p3/3Q4/8/8/4K3 w - - 0 1", "d4e5");
        assert!(is_capture(&board, mv));
        assert_eq!(captured_piece(&board, mv), Some(Piece::Pawn));
    }

    #[test]
    fn en_passant_is_a_pawn_capture() {
        let (board, mv) = setup(
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
            "e5d6",
        );
        assert!(is_en_passant(&board, mv));
        assert_eq!(captured_piece(&board, mv), Some(Piece::Pawn));
        assert!(is_tactical(&board, mv));
    }

    #[test]
    fn promotion_is_tactical() {
        let (board, mv) = setup("7k/4P3/8/8/8/8/8/4K3 w - - 0 1", "e7e8q");
        assert!(is_promotion(mv));
        assert!(!is_capture(&board, mv));
        assert!(is_tactical(&board, mv));
    }

    #[test]
    fn rook_check_detected() {
        let (board, mv) = setup("6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1", "d1d8");
        assert!(gives_check(&board, mv));
    }

    #[test]
    fn castling_is_quiet() {
        let (board, mv) = setup("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1g1");
        assert!(!is_capture(&board, mv));
        assert!(!is_en_passant(&board, mv));
    }
}

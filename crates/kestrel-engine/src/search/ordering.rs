//! Move ordering: score every legal move once, then hand them out lazily.
//!
//! Score bands, highest first. Bands are additive, so a checking capture
//! outranks a quiet check:
//! - TT move: 1,000,000,000
//! - Gives check: 400,000,000
//! - Capture (incl. en passant): 100,000,100 plus a victim bonus
//! - Queen promotion: 90,000,000
//! - Killer moves: 80,000,000 / 79,999,999
//! - Every move: its history score

use kestrel_core::moves::{captured_piece, gives_check};
use kestrel_core::{Board, ChessMove, Piece};

use crate::search::heuristics::{HistoryTable, KillerTable};

const TT_MOVE_SCORE: i64 = 1_000_000_000;
const CHECK_SCORE: i64 = 400_000_000;
const CAPTURE_SCORE: i64 = 100_000_100;
const QUEEN_PROMOTION_SCORE: i64 = 90_000_000;
const FIRST_KILLER_SCORE: i64 = 80_000_000;
const SECOND_KILLER_SCORE: i64 = 79_999_999;

/// Tie-break between captures: bigger victims first.
fn victim_bonus(victim: Piece) -> i64 {
    match victim {
        Piece::Queen => 8_000_000,
        Piece::Rook => 4_000_000,
        Piece::Bishop => 2_350_000,
        Piece::Knight => 2_250_000,
        Piece::Pawn | Piece::King => 0,
    }
}

/// A move with its ordering score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredMove {
    pub mv: ChessMove,
    pub score: i64,
}

/// Ordering inputs that live outside the position.
pub struct OrderingContext<'a> {
    pub tt_move: Option<ChessMove>,
    pub killers: &'a KillerTable,
    pub history: &'a HistoryTable,
    pub ply: usize,
}

/// Score `mv` in `board` for ordering purposes.
pub fn score_move(board: &Board, mv: ChessMove, ctx: &OrderingContext<'_>) -> i64 {
    let mut score = i64::from(ctx.history.score(board.side_to_move(), mv));

    if ctx.tt_move == Some(mv) {
        score += TT_MOVE_SCORE;
    }
    if gives_check(board, mv) {
        score += CHECK_SCORE;
    }
    if let Some(victim) = captured_piece(board, mv) {
        score += CAPTURE_SCORE + victim_bonus(victim);
    }
    if mv.get_promotion() == Some(Piece::Queen) {
        score += QUEEN_PROMOTION_SCORE;
    }
    match ctx.killers.slot(ctx.ply, mv) {
        Some(0) => score += FIRST_KILLER_SCORE,
        Some(_) => score += SECOND_KILLER_SCORE,
        None => {}
    }
    score
}

/// Incremental move picker using selection sort.
///
/// Yields moves in descending score order. Only the remaining tail is
/// scanned on each call, so a node that cuts off after one or two moves
/// never pays for sorting the rest.
pub struct MovePicker {
    moves: Vec<ScoredMove>,
    cursor: usize,
}

impl MovePicker {
    /// Score `moves` and prepare to hand them out best-first.
    pub fn new(board: &Board, moves: Vec<ChessMove>, ctx: &OrderingContext<'_>) -> Self {
        let moves = moves
            .into_iter()
            .map(|mv| ScoredMove {
                mv,
                score: score_move(board, mv, ctx),
            })
            .collect();
        Self { moves, cursor: 0 }
    }

    /// Yield the next highest-scored move, or `None` when exhausted.
    pub fn pick_next(&mut self) -> Option<ChessMove> {
        let remaining = self.moves.get(self.cursor..)?;
        let best = remaining
            .iter()
            .enumerate()
            // Earliest wins ties, keeping generation order for equal scores.
            .rev()
            .max_by_key(|(_, scored)| scored.score)?
            .0;
        self.moves.swap(self.cursor, self.cursor + best);
        let mv = self.moves[self.cursor].mv;
        self.cursor += 1;
        Some(mv)
    }

    /// Number of moves not yet yielded.
    pub fn remaining(&self) -> usize {
        self.moves.len() - self.cursor
    }
}

impl Iterator for MovePicker {
    type Item = ChessMove;

    fn next(&mut self) -> Option<ChessMove> {
        self.pick_next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::moves::is_capture;
    use kestrel_core::{Game, Square};

    fn picker(game: &Game, tt_move: Option<ChessMove>, killers: &KillerTable) -> MovePicker {
        let history = HistoryTable::new();
        let ctx = OrderingContext {
            tt_move,
            killers,
            history: &history,
            ply: 0,
        };
        MovePicker::new(game.board(), game.legal_moves(), &ctx)
    }

    #[test]
    fn picker_yields_all_moves_in_starting_position() {
        let game = Game::startpos();
        let killers = KillerTable::new();
        assert_eq!(picker(&game, None, &killers).count(), 20);
    }

    #[test]
    fn tt_move_comes_first() {
        let game = Game::startpos();
        let killers = KillerTable::new();
        let tt_move = game.parse_uci("b1a3").unwrap();
        let mut p = picker(&game, Some(tt_move), &killers);
        assert_eq!(p.pick_next(), Some(tt_move));
        assert_eq!(p.remaining(), 19);
    }

    #[test]
    fn captures_precede_quiet_moves() {
        // White queen on d4, black pawn on e5.
        let game = Game::from_fen("4k3/8/8/4p3/3Q4/8/8/4K3 w - - 0 1").unwrap();
        let killers = KillerTable::new();
        let first = picker(&game, None, &killers).pick_next().unwrap();
        // Checks rank above plain captures, so accept either.
        assert!(
            is_capture(game.board(), first) || gives_check(game.board(), first),
            "first move {first} should be tactical"
        );
    }

    #[test]
    fn bigger_victim_first() {
        // The knight on d4 can take the queen on c6 or the rook on e6. Neither gives check.
        let game = Game::from_fen("7k/8/2q1r3/8/3N4/8/8/K7 w - - 0 1").unwrap();
        let killers = KillerTable::new();
        let order: Vec<String> = picker(&game, None, &killers)
            .take(2)
            .map(|mv| mv.to_string())
            .collect();
        assert_eq!(order, ["d4c6", "d4e6"]);
    }

    #[test]
    fn checking_move_outranks_capture() {
        // Rook can take the knight on a1 or give a back-rank check.
        let game = Game::from_fen("6k1/5ppp/8/8/8/8/8/nR4K1 w - - 0 1").unwrap();
        let killers = KillerTable::new();
        let first = picker(&game, None, &killers).pick_next().unwrap();
        assert_eq!(first.to_string(), "b1b8");
    }

    #[test]
    fn queen_promotion_before_killer() {
        let game = Game::from_fen("8/4P3/7k/8/8/8/8/K7 w - - 0 1").unwrap();
        let mut killers = KillerTable::new();
        killers.store(0, game.parse_uci("a1b1").unwrap());
        let order: Vec<String> = picker(&game, None, &killers)
            .take(2)
            .map(|mv| mv.to_string())
            .collect();
        assert_eq!(order, ["e7e8q", "a1b1"]);
    }

    #[test]
    fn first_killer_before_second() {
        let game = Game::startpos();
        let mut killers = KillerTable::new();
        let older = game.parse_uci("a2a3").unwrap();
        let newer = game.parse_uci("h2h3").unwrap();
        killers.store(0, older);
        killers.store(0, newer);
        let order: Vec<ChessMove> = picker(&game, None, &killers).take(2).collect();
        assert_eq!(order, vec![newer, older]);
    }

    #[test]
    fn history_orders_quiet_moves() {
        let game = Game::startpos();
        let killers = KillerTable::new();
        let mut history = HistoryTable::new();
        let favourite = ChessMove::new(Square::G1, Square::F3, None);
        history.reward(game.side_to_move(), favourite, 5);
        let ctx = OrderingContext {
            tt_move: None,
            killers: &killers,
            history: &history,
            ply: 0,
        };
        let mut p = MovePicker::new(game.board(), game.legal_moves(), &ctx);
        assert_eq!(p.pick_next(), Some(favourite));
    }

    #[test]
    fn empty_list_yields_nothing() {
        let game = Game::startpos();
        let killers = KillerTable::new();
        let history = HistoryTable::new();
        let ctx = OrderingContext {
            tt_move: None,
            killers: &killers,
            history: &history,
            ply: 0,
        };
        let mut p = MovePicker::new(game.board(), Vec::new(), &ctx);
        assert_eq!(p.pick_next(), None);
        assert_eq!(p.remaining(), 0);
    }
}

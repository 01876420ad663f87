//! A game: the current board plus the history of positions that led to it.

use std::fmt;
use std::str::FromStr;

use chess::{Board, ChessMove, MoveGen, Piece};
use tracing::debug;

use crate::error::GameError;
use crate::moves::{is_capture, moving_piece};

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One entry of the position stack.
#[derive(Debug, Clone, Copy)]
struct State {
    board: Board,
    /// Plies since the last capture or pawn move.
    halfmove_clock: u16,
    /// Whether this state was reached by a null move.
    null: bool,
}

/// Position oracle consumed by the search.
///
/// Every applied move pushes a new [`State`]; reverting pops it. The stack is
/// what makes repetition detection and the fifty-move rule possible, since
/// [`Board`] itself carries no history.
#[derive(Debug, Clone)]
pub struct Game {
    states: Vec<State>,
}

impl Game {
    /// Start a game from `board` with a zero halfmove clock.
    pub fn new(board: Board) -> Self {
        Self::with_clock(board, 0)
    }

    fn with_clock(board: Board, halfmove_clock: u16) -> Self {
        let mut states = Vec::with_capacity(256);
        states.push(State {
            board,
            halfmove_clock,
            null: false,
        });
        Self { states }
    }

    /// The standard starting position.
    pub fn startpos() -> Self {
        Self::new(Board::default())
    }

    /// Parse a FEN string, keeping its halfmove clock.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let board = Board::from_str(fen).map_err(|e| GameError::InvalidFen {
            fen: fen.to_string(),
            reason: e.to_string(),
        })?;
        let halfmove_clock = fen
            .split_whitespace()
            .nth(4)
            .and_then(|field| field.parse().ok())
            .unwrap_or(0);
        Ok(Self::with_clock(board, halfmove_clock))
    }

    fn current(&self) -> &State {
        // The stack is never empty: the root state is pushed at construction
        // and `with_move` pops only what it pushed.
        &self.states[self.states.len() - 1]
    }

    /// The current board.
    pub fn board(&self) -> &Board {
        &self.current().board
    }

    /// Zobrist fingerprint of the current position.
    pub fn hash(&self) -> u64 {
        self.current().board.get_hash()
    }

    /// Side to move in the current position.
    pub fn side_to_move(&self) -> chess::Color {
        self.current().board.side_to_move()
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u16 {
        self.current().halfmove_clock
    }

    /// Number of plies applied on top of the root position.
    pub fn ply_count(&self) -> usize {
        self.states.len() - 1
    }

    /// All legal moves in the current position.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(self.board()).collect()
    }

    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.board().checkers().popcnt() > 0
    }

    fn push(&mut self, mv: ChessMove) {
        let state = self.current();
        let resets_clock =
            moving_piece(&state.board, mv) == Some(Piece::Pawn) || is_capture(&state.board, mv);
        let next = State {
            board: state.board.make_move_new(mv),
            halfmove_clock: if resets_clock {
                0
            } else {
                state.halfmove_clock.saturating_add(1)
            },
            null: false,
        };
        self.states.push(next);
    }

    /// Apply `mv` permanently. The move must be legal.
    pub fn make_move(&mut self, mv: ChessMove) {
        debug_assert!(self.board().legal(mv), "make_move called with illegal move {mv}");
        self.push(mv);
    }

    /// Apply `mv`, run `f` on the resulting game, then revert the move.
    pub fn with_move<R>(&mut self, mv: ChessMove, f: impl FnOnce(&mut Game) -> R) -> R {
        self.push(mv);
        let result = f(self);
        self.states.pop();
        result
    }

    /// Pass the turn, run `f`, then revert.
    ///
    /// Returns `None` without calling `f` when the side to move is in check.
    pub fn with_null_move<R>(&mut self, f: impl FnOnce(&mut Game) -> R) -> Option<R> {
        let state = *self.current();
        let board = state.board.null_move()?;
        self.states.push(State {
            board,
            halfmove_clock: state.halfmove_clock.saturating_add(1),
            null: true,
        });
        let result = f(self);
        self.states.pop();
        Some(result)
    }

    /// Parse a move in long algebraic notation and apply it.
    ///
    /// On error the game is left unchanged.
    pub fn play_uci(&mut self, uci_move: &str) -> Result<(), GameError> {
        let mv = self.parse_uci(uci_move)?;
        self.push(mv);
        Ok(())
    }

    /// Find the legal move matching `uci_move` (e.g. `e2e4`, `e7e8q`).
    pub fn parse_uci(&self, uci_move: &str) -> Result<ChessMove, GameError> {
        MoveGen::new_legal(self.board())
            .find(|mv| mv.to_string() == uci_move)
            .ok_or_else(|| GameError::IllegalMove {
                uci_move: uci_move.to_string(),
            })
    }

    /// Threefold repetition inside the reversible part of the history.
    ///
    /// The scan never crosses a null move: positions on the other side of a
    /// pass were not actually reachable in the game.
    pub fn is_draw_by_repetition(&self) -> bool {
        let last = self.states.len() - 1;
        let current = &self.states[last];
        let hash = current.board.get_hash();
        let window = (current.halfmove_clock as usize).min(last);

        let mut seen = 0;
        for back in 1..=window {
            if self.states[last - back + 1].null {
                break;
            }
            if back % 2 == 0 && self.states[last - back].board.get_hash() == hash {
                seen += 1;
                if seen >= 2 {
                    debug!(hash, "threefold repetition");
                    return true;
                }
            }
        }
        false
    }

    /// Fifty full moves without a capture or pawn move.
    pub fn is_draw_by_fifty_moves(&self) -> bool {
        self.halfmove_clock() >= 100
    }

    /// Neither side can possibly deliver mate.
    ///
    /// Covers bare kings, a single minor piece, and any number of bishops
    /// that all stand on squares of one colour.
    pub fn is_insufficient_material(&self) -> bool {
        let board = self.board();
        let heavy =
            *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if heavy.popcnt() > 0 {
            return false;
        }

        let knights = board.pieces(Piece::Knight).popcnt();
        let bishops = *board.pieces(Piece::Bishop);
        if knights + bishops.popcnt() <= 1 {
            return true;
        }
        if knights > 0 {
            return false;
        }

        let mut colours =
            bishops.map(|sq| (sq.get_rank().to_index() + sq.get_file().to_index()) % 2);
        match colours.next() {
            Some(first) => colours.all(|c| c == first),
            None => true,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Game {
    /// Writes the current position as FEN.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(game: &mut Game, moves: &[&str]) {
        for mv in moves {
            game.play_uci(mv).unwrap();
        }
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let game = Game::startpos();
        assert_eq!(game.legal_moves().len(), 20);
        assert!(!game.in_check());
    }

    #[test]
    fn from_fen_reads_halfmove_clock() {
        let game = Game::from_fen("8/8/8/4k3/8/8/3PK3/8 w - - 37 80").unwrap();
        assert_eq!(game.halfmove_clock(), 37);
    }

    #[test]
    fn from_fen_rejects_garbage() {
        assert!(matches!(
            Game::from_fen("not a fen"),
            Err(GameError::InvalidFen { .. })
        ));
    }

    #[test]
    fn with_move_restores_position() {
        let mut game = Game::startpos();
        let before = game.hash();
        let mv = game.parse_uci("e2e4").unwrap();
        let inner = game.with_move(mv, |g| g.hash());
        assert_ne!(inner, before);
        assert_eq!(game.hash(), before);
        assert_eq!(game.ply_count(), 0);
    }

    #[test]
    fn null_move_refused_in_check() {
        // Black king on e8 in check from the rook on e1.
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/K3R3 b - - 0 1").unwrap();
        assert!(game.in_check());
        assert!(game.with_null_move(|_| ()).is_none());
    }

    #[test]
    fn null_move_flips_side() {
        let mut game = Game::startpos();
        let side = game.with_null_move(|g| g.side_to_move()).unwrap();
        assert_eq!(side, chess::Color::Black);
        assert_eq!(game.side_to_move(), chess::Color::White);
    }

    #[test]
    fn illegal_uci_leaves_game_unchanged() {
        let mut game = Game::startpos();
        let before = game.hash();
        assert_eq!(
            game.play_uci("e2e5"),
            Err(GameError::IllegalMove {
                uci_move: "e2e5".to_string()
            })
        );
        assert_eq!(game.hash(), before);
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_move_and_capture() {
        let mut game = Game::startpos();
        play(&mut game, &["g1f3", "g8f6"]);
        assert_eq!(game.halfmove_clock(), 2);
        play(&mut game, &["e2e4"]);
        assert_eq!(game.halfmove_clock(), 0);
        play(&mut game, &["f6e4"]);
        assert_eq!(game.halfmove_clock(), 0);
    }

    #[test]
    fn knight_shuffle_repeats_three_times() {
        let mut game = Game::startpos();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        play(&mut game, &shuffle);
        assert!(!game.is_draw_by_repetition(), "second occurrence is not a draw");
        play(&mut game, &shuffle);
        assert!(game.is_draw_by_repetition(), "third occurrence is a draw");
    }

    #[test]
    fn repetition_does_not_cross_irreversible_moves() {
        let mut game = Game::startpos();
        play(&mut game, &["g1f3", "g8f6", "f3g1", "f6g8", "e2e4", "e7e5"]);
        play(&mut game, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        assert!(!game.is_draw_by_repetition());
    }

    #[test]
    fn fifty_move_rule() {
        let game = Game::from_fen("8/8/8/4k3/8/8/4K3/4R3 w - - 100 120").unwrap();
        assert!(game.is_draw_by_fifty_moves());
        let game = Game::from_fen("8/8/8/4k3/8/8/4K3/4R3 w - - 99 120").unwrap();
        assert!(!game.is_draw_by_fifty_moves());
    }

    #[test]
    fn insufficient_material_cases() {
        let bare = Game::from_fen("8/8/8/4k3/8/8/4K3/8 w - - 0 1").unwrap();
        assert!(bare.is_insufficient_material());

        let knight = Game::from_fen("8/8/8/4k3/8/8/4K3/6N1 w - - 0 1").unwrap();
        assert!(knight.is_insufficient_material());

        // Bishops on c1 and f8: both dark squares.
        let same_colour = Game::from_fen("5b2/8/8/4k3/8/8/4K3/2B5 w - - 0 1").unwrap();
        assert!(same_colour.is_insufficient_material());

        // Bishops on c1 (dark) and c8 (light).
        let opposite = Game::from_fen("2b5/8/8/4k3/8/8/4K3/2B5 w - - 0 1").unwrap();
        assert!(!opposite.is_insufficient_material());

        let rook = Game::from_fen("8/8/8/4k3/8/8/4K3/4R3 w - - 0 1").unwrap();
        assert!(!rook.is_insufficient_material());
    }

    #[test]
    fn display_writes_fen() {
        let game = Game::startpos();
        assert!(game.to_string().starts_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"));
    }
}

//! Errors raised while building or advancing a [`Game`](crate::Game).

/// Errors from FEN parsing and move application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The FEN string was rejected by the board parser.
    #[error("invalid FEN \"{fen}\": {reason}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
        /// Why the parser rejected it.
        reason: String,
    },

    /// A move string is malformed or not legal in the current position.
    #[error("illegal move: {uci_move}")]
    IllegalMove {
        /// The move in long algebraic (UCI) notation.
        uci_move: String,
    },
}

//! Game state, draw rules, and move classification for kestrel.
//!
//! Board representation, legal move generation and Zobrist hashing come from
//! the [`chess`] crate. This crate layers the history the search needs on top
//! of it: a state stack for scoped make/unmake, the fifty-move clock,
//! repetition and insufficient-material detection.

mod error;
mod game;
pub mod moves;

pub use chess::{BitBoard, Board, ChessMove, Color, File, Piece, Rank, Square};
pub use error::GameError;
pub use game::{Game, STARTING_FEN};

//! Static evaluation.
//!
//! Evaluators score a board from White's perspective; the search flips the
//! sign for Black.

mod material;

pub use material::MaterialEvaluator;

use kestrel_core::Board;

/// Maps a position to a heuristic score in centipawns, White-relative.
pub trait Evaluator: Send + Sync {
    /// Score `board`; positive favours White.
    fn evaluate(&self, board: &Board) -> i32;
}

/// Scores every position as 0, leaving only mates and draws to the search.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroEvaluator;

impl Evaluator for ZeroEvaluator {
    fn evaluate(&self, _board: &Board) -> i32 {
        0
    }
}

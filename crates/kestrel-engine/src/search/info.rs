//! Progress reporting for the surrounding protocol layer.

use std::fmt;
use std::time::Duration;

use kestrel_core::ChessMove;

use crate::search::negamax::{MATE, MATE_BOUND};

/// A search value as a protocol reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Full moves to mate; negative when the side to move is being mated.
    Mate(i32),
}

impl Score {
    /// Classify a raw search value.
    pub fn from_value(value: i32) -> Self {
        if value > MATE_BOUND {
            Score::Mate((MATE - value + 1) / 2)
        } else if value < -MATE_BOUND {
            Score::Mate(-((MATE + value + 1) / 2))
        } else {
            Score::Centipawns(value)
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns(cp) => write!(f, "cp {cp}"),
            Score::Mate(moves) => write!(f, "mate {moves}"),
        }
    }
}

/// One progress report, emitted whenever the root best move improves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: i32,
    /// Raw search value from the side to move's perspective.
    pub score: i32,
    pub nodes: u64,
    /// Nodes visited inside quiescence search (included in `nodes`).
    pub qnodes: u64,
    pub elapsed: Duration,
    pub tt_hits: u64,
    /// Best line, starting with the root move.
    pub pv: Vec<ChessMove>,
}

impl SearchInfo {
    /// Nodes per second over the elapsed time.
    pub fn nps(&self) -> u64 {
        let micros = self.elapsed.as_micros().max(1);
        (u128::from(self.nodes) * 1_000_000 / micros) as u64
    }
}

impl fmt::Display for SearchInfo {
    /// Renders a UCI `info` line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "info depth {} score {} nodes {} qnodes {} nps {} time {} tthit {}",
            self.depth,
            Score::from_value(self.score),
            self.nodes,
            self.qnodes,
            self.nps(),
            self.elapsed.as_millis(),
            self.tt_hits,
        )?;
        if !self.pv.is_empty() {
            write!(f, " pv")?;
            for mv in &self.pv {
                write!(f, " {mv}")?;
            }
        }
        Ok(())
    }
}

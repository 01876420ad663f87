//! Killer move table and history heuristic for quiet move ordering.
//!
//! Both tables live on the [`Engine`](crate::search::Engine) and persist
//! between searches; [`KillerTable::shift_left`] and [`HistoryTable::decay`]
//! age them at the start of every new search.

use kestrel_core::{ChessMove, Color};

use crate::search::negamax::MAX_PLY;

/// Two killer moves per ply: quiet moves that caused beta cutoffs.
pub struct KillerTable {
    slots: [[Option<ChessMove>; 2]; MAX_PLY],
}

impl KillerTable {
    /// Create an empty killer table.
    pub fn new() -> Self {
        Self {
            slots: [[None; 2]; MAX_PLY],
        }
    }

    /// Store a killer move at the given ply.
    ///
    /// Shifts slot 0 to slot 1 if the new move differs from slot 0.
    pub fn store(&mut self, ply: usize, mv: ChessMove) {
        if ply >= MAX_PLY {
            return;
        }
        let slots = &mut self.slots[ply];
        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }

    /// Which slot holds `mv` at `ply`: 0 for the most recent killer.
    pub fn slot(&self, ply: usize, mv: ChessMove) -> Option<usize> {
        self.slots
            .get(ply)?
            .iter()
            .position(|killer| *killer == Some(mv))
    }

    /// Check if a move is a killer at the given ply.
    pub fn is_killer(&self, ply: usize, mv: ChessMove) -> bool {
        self.slot(ply, mv).is_some()
    }

    /// Move every ply's killers one ply closer to the root.
    ///
    /// After a move is played the previous search's ply 2 becomes the new
    /// search's ply 1, and so on. The deepest ply is emptied.
    pub fn shift_left(&mut self) {
        self.slots.copy_within(1.., 0);
        self.slots[MAX_PLY - 1] = [None; 2];
    }

    /// Forget every killer.
    pub fn clear(&mut self) {
        self.slots = [[None; 2]; MAX_PLY];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// History heuristic table, indexed by `[side][from][to]`.
///
/// Rewards quiet moves that cause beta cutoffs. Scores only grow during a
/// search and are divided down between searches.
pub struct HistoryTable {
    table: Box<[[[i32; 64]; 64]; 2]>,
}

impl HistoryTable {
    /// Create a zeroed history table.
    pub fn new() -> Self {
        Self {
            table: Box::new([[[0; 64]; 64]; 2]),
        }
    }

    fn entry(&mut self, side: Color, mv: ChessMove) -> &mut i32 {
        &mut self.table[side.to_index()][mv.get_source().to_index()][mv.get_dest().to_index()]
    }

    /// Reward a quiet move that caused a beta cutoff by `depth²`.
    pub fn reward(&mut self, side: Color, mv: ChessMove, depth: i32) {
        let entry = self.entry(side, mv);
        *entry = entry.saturating_add(depth.saturating_mul(depth));
    }

    /// Get the history score for a move.
    pub fn score(&self, side: Color, mv: ChessMove) -> i32 {
        self.table[side.to_index()][mv.get_source().to_index()][mv.get_dest().to_index()]
    }

    /// Divide every score by `divisor`.
    pub fn decay(&mut self, divisor: i32) {
        for value in self.table.iter_mut().flatten().flatten() {
            *value /= divisor;
        }
    }

    /// Reset every score to zero.
    pub fn clear(&mut self) {
        for value in self.table.iter_mut().flatten().flatten() {
            *value = 0;
        }
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

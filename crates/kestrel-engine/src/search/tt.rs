//! Transposition table: a fixed-capacity, direct-mapped cache of search results.
//!
//! Each position maps to exactly one slot (`key % capacity`). There is no
//! chaining; a different position landing in an occupied slot overwrites it.
//! The same position is only overwritten when the incoming result dominates
//! the stored one (see [`TranspositionTable::save`]).
//!
//! Mate scores are stored relative to the node rather than the root, so a
//! cached "mate in 3 from here" stays correct when the position is reached at
//! a different ply.
//!
//! The table is owned by one search at a time and mutated through `&mut self`.
//! Sharing it between search threads would need per-slot atomics or sharding.

use kestrel_core::{Board, ChessMove};
use tracing::debug;

use crate::search::negamax::{MATE, MATE_BOUND};

/// Depth recorded for positions whose value no deeper search can change:
/// checkmate, stalemate, rule draws and proven short mates.
pub const TERMINAL_DEPTH: i32 = i32::MAX;

/// Exact values this far from `MATE` are neither evaluations nor mates.
const IMPLAUSIBLE_MATE_DISTANCE: i32 = 1_000;

/// Bound type stored in a TT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The stored value is exact (a move raised alpha without failing high).
    Exact,
    /// The stored value is a lower bound (beta cutoff).
    Lower,
    /// The stored value is an upper bound (no move raised alpha).
    Upper,
}

/// One cached search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    /// Full 64-bit fingerprint of the position.
    pub key: u64,
    /// Remaining depth the value was searched to.
    pub depth: i32,
    /// Value in node-relative form; see [`score_from_tt`].
    pub value: i32,
    pub bound: Bound,
    /// `None` only for terminal entries.
    pub best_move: Option<ChessMove>,
}

impl TtEntry {
    /// Whether `value` settles a node searched with the window `(alpha, beta)`.
    fn usable(bound: Bound, value: i32, alpha: i32, beta: i32) -> bool {
        match bound {
            Bound::Exact => true,
            Bound::Lower => value >= beta,
            Bound::Upper => value <= alpha,
        }
    }
}

/// Convert a root-relative score into the node-relative form stored in the table.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score > MATE_BOUND {
        score + ply
    } else if score < -MATE_BOUND {
        score - ply
    } else {
        score
    }
}

/// Reverse [`score_to_tt`] for a node at `ply`.
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score > MATE_BOUND {
        score - ply
    } else if score < -MATE_BOUND {
        score + ply
    } else {
        score
    }
}

/// Direct-mapped transposition table.
pub struct TranspositionTable {
    slots: Vec<Option<TtEntry>>,
}

impl TranspositionTable {
    /// Allocate a table of roughly `mb` megabytes.
    pub fn new(mb: usize) -> Self {
        let bytes = mb.max(1) * 1024 * 1024;
        Self::with_capacity(bytes / std::mem::size_of::<Option<TtEntry>>())
    }

    /// Allocate a table with exactly `capacity` slots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Empty every slot, keeping the allocation.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    fn index(&self, key: u64) -> usize {
        (key % self.slots.len() as u64) as usize
    }

    /// Depth- and window-agnostic lookup, used to seed move ordering.
    pub fn probe(&self, key: u64) -> Option<&TtEntry> {
        self.slots[self.index(key)]
            .as_ref()
            .filter(|entry| entry.key == key)
    }

    /// Lookup that only succeeds when the entry can stand in for a search of
    /// `min_depth` plies with window `(alpha, beta)` at `ply`.
    ///
    /// The returned entry's `value` is already converted back to the
    /// root-relative form for `ply`.
    pub fn load(
        &self,
        key: u64,
        min_depth: i32,
        alpha: i32,
        beta: i32,
        ply: usize,
    ) -> Option<TtEntry> {
        let entry = self.probe(key)?;
        if entry.depth < min_depth {
            return None;
        }
        let value = score_from_tt(entry.value, ply);
        TtEntry::usable(entry.bound, value, alpha, beta).then_some(TtEntry { value, ..*entry })
    }

    /// Store a result for the node at `ply`.
    ///
    /// An entry for the same position is kept when it was searched deeper, or
    /// to the same depth with an exact value while the incoming one is only a
    /// bound. A `None` move is only valid for terminal exact entries.
    pub fn save(
        &mut self,
        key: u64,
        depth: i32,
        value: i32,
        bound: Bound,
        best_move: Option<ChessMove>,
        ply: usize,
    ) {
        debug_assert!(
            best_move.is_some() || (bound == Bound::Exact && depth == TERMINAL_DEPTH),
            "moveless TT entry must be terminal and exact (depth {depth}, bound {bound:?})"
        );

        let value = score_to_tt(value, ply);
        let distance = MATE - value.abs();
        if bound == Bound::Exact
            && distance > MATE - MATE_BOUND
            && distance < IMPLAUSIBLE_MATE_DISTANCE
        {
            debug!(key, value, "rejected implausible exact value");
            return;
        }

        let index = self.index(key);
        if let Some(existing) = &self.slots[index]
            && existing.key == key
            && (existing.depth > depth
                || (existing.depth == depth
                    && existing.bound == Bound::Exact
                    && bound != Bound::Exact))
        {
            return;
        }

        self.slots[index] = Some(TtEntry {
            key,
            depth,
            value,
            bound,
            best_move,
        });
    }

    /// Follow stored best moves from the position after `first`.
    ///
    /// Stops at the first missing entry, illegal move (a slot overwritten by
    /// another position with a matching key is possible only in theory) or
    /// after `max_len` moves.
    pub fn principal_variation(
        &self,
        board: &Board,
        first: ChessMove,
        max_len: usize,
    ) -> Vec<ChessMove> {
        let mut pv = vec![first];
        let mut board = board.make_move_new(first);
        while pv.len() < max_len {
            let Some(mv) = self.probe(board.get_hash()).and_then(|entry| entry.best_move) else {
                break;
            };
            if !board.legal(mv) {
                break;
            }
            pv.push(mv);
            board = board.make_move_new(mv);
        }
        pv
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("capacity", &self.slots.len())
            .finish()
    }
}

//! Tunable search parameters.

/// Knobs for one [`Engine`](crate::Engine).
///
/// The pruning margins are empirical; they shape search speed, not
/// correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Transposition table size in megabytes.
    pub hash_mb: usize,
    /// Default iterative-deepening depth cap.
    pub max_depth: i32,
    /// Half-width of the aspiration window around the previous score.
    pub aspiration_margin: i32,
    /// Reverse futility margin, per ply of remaining depth.
    pub futility_margin: i32,
    /// Plies removed (including the pass itself) by a null move.
    pub null_move_reduction: i32,
    /// Null-move reduction used when more than 6 plies remain.
    pub deep_null_move_reduction: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hash_mb: 16,
            max_depth: 30,
            aspiration_margin: 50,
            futility_margin: 120,
            null_move_reduction: 3,
            deep_null_move_reduction: 4,
        }
    }
}

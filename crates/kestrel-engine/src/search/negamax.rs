//! Negamax alpha-beta search with principal variation search and quiescence.
//!
//! All scores are from the side to move's perspective. A search that sees the
//! stop flag unwinds by returning 0; callers check the flag after every child
//! and never cache or trust a value produced after it was set.

use kestrel_core::moves::is_tactical;
use kestrel_core::{ChessMove, Color, Game};

use crate::config::SearchConfig;
use crate::eval::Evaluator;
use crate::search::control::SearchControl;
use crate::search::heuristics::{HistoryTable, KillerTable};
use crate::search::info::SearchInfo;
use crate::search::ordering::{MovePicker, OrderingContext};
use crate::search::tt::{Bound, TERMINAL_DEPTH, TranspositionTable};

/// Score representing an unreachable upper/lower bound.
pub const INF: i32 = 32_001;

/// Score of a checkmate at the root; a mate `n` plies away scores `MATE - n`.
pub const MATE: i32 = 32_000;

/// Scores above this magnitude indicate a forced mate.
pub const MATE_BOUND: i32 = MATE - 100;

/// Maximum search depth (in plies) for array sizing and recursion limits.
pub const MAX_PLY: usize = 128;

/// Principal-variation node or null-window scout node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NodeType {
    Pv,
    Scout,
}

/// Counters reported in progress lines and the final result.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct SearchStats {
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_hits: u64,
}

/// Search state threaded through negamax calls.
pub(super) struct SearchContext<'a> {
    pub evaluator: &'a dyn Evaluator,
    pub config: &'a SearchConfig,
    pub control: &'a SearchControl,
    pub tt: &'a mut TranspositionTable,
    pub killers: &'a mut KillerTable,
    pub history: &'a mut HistoryTable,
    pub stats: SearchStats,
    /// Cleared while searching below a null move.
    pub null_move_allowed: bool,
    /// Best root move of the iteration in progress.
    pub root_best: Option<ChessMove>,
    pub report: &'a mut dyn FnMut(&SearchInfo),
}

impl SearchContext<'_> {
    pub(super) fn picker(
        &self,
        game: &Game,
        moves: Vec<ChessMove>,
        tt_move: Option<ChessMove>,
        ply: usize,
    ) -> MovePicker {
        let ordering = OrderingContext {
            tt_move,
            killers: &*self.killers,
            history: &*self.history,
            ply,
        };
        MovePicker::new(game.board(), moves, &ordering)
    }
}

/// Static evaluation from the side to move's perspective.
pub(super) fn static_eval(game: &Game, evaluator: &dyn Evaluator) -> i32 {
    let score = evaluator.evaluate(game.board());
    match game.side_to_move() {
        Color::White => score,
        Color::Black => -score,
    }
}

/// Depth to record for `value`: mates proven within the searched depth
/// never go stale.
fn store_depth(value: i32, bound: Bound, depth: i32, ply: usize) -> i32 {
    if bound == Bound::Exact && value >= MATE_BOUND && MATE - (value + ply as i32) <= depth {
        TERMINAL_DEPTH
    } else {
        depth
    }
}

/// Value of a position without legal moves: mated or stalemate.
fn terminal_value(in_check: bool, ply: usize) -> i32 {
    if in_check { -(MATE - ply as i32) } else { 0 }
}

/// Negamax alpha-beta search below the root.
pub(super) fn search(
    game: &mut Game,
    node: NodeType,
    mut depth: i32,
    ply: usize,
    mut alpha: i32,
    mut beta: i32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    if ctx.control.should_stop() {
        return 0;
    }

    // Mate distance pruning: no line from here can beat a mate on the next
    // move or lose faster than being mated right now.
    let mate_value = MATE - ply as i32;
    alpha = alpha.max(-mate_value);
    beta = beta.min(mate_value);
    if alpha >= beta {
        return alpha;
    }

    if game.is_draw_by_repetition() || game.is_draw_by_fifty_moves() {
        return 0;
    }

    if ply >= MAX_PLY {
        return static_eval(game, ctx.evaluator);
    }

    let key = game.hash();
    let mut tt_move = None;
    if let Some(entry) = ctx.tt.load(key, depth, alpha, beta, ply) {
        ctx.stats.tt_hits += 1;
        if node == NodeType::Scout || (entry.value > alpha && entry.value < beta) {
            return entry.value;
        }
        tt_move = entry.best_move;
    }
    if tt_move.is_none() {
        tt_move = ctx.tt.probe(key).and_then(|entry| entry.best_move);
    }

    if game.is_insufficient_material() {
        ctx.tt.save(key, TERMINAL_DEPTH, 0, Bound::Exact, None, ply);
        return 0;
    }

    let in_check = game.in_check();
    if in_check {
        depth += 1;
    }
    if depth <= 0 {
        return qsearch(game, ply, alpha, beta, ctx);
    }

    ctx.stats.nodes += 1;

    let moves = game.legal_moves();
    if moves.is_empty() {
        let value = terminal_value(in_check, ply);
        ctx.tt.save(key, TERMINAL_DEPTH, value, Bound::Exact, None, ply);
        return value;
    }

    if node == NodeType::Scout && !in_check {
        let eval = static_eval(game, ctx.evaluator);

        // Reverse futility pruning
        if depth < 3 && beta.abs() < MATE_BOUND {
            let estimate = eval - ctx.config.futility_margin * depth;
            if estimate >= beta {
                return estimate;
            }
        }

        // Null move pruning
        if depth > 2 && ctx.null_move_allowed && eval >= beta {
            let reduction = if depth > 6 {
                ctx.config.deep_null_move_reduction
            } else {
                ctx.config.null_move_reduction
            };
            ctx.null_move_allowed = false;
            let score = game.with_null_move(|g| {
                -search(g, NodeType::Scout, depth - reduction, ply + 1, -beta, -beta + 1, ctx)
            });
            ctx.null_move_allowed = true;

            if ctx.control.is_stopped() {
                return 0;
            }
            if let Some(score) = score
                && score >= beta
            {
                // A mate seen only after passing is not a real mate.
                return if score >= MATE_BOUND { beta } else { score };
            }
        }
    }

    let board = *game.board();
    let side = game.side_to_move();
    let mut picker = ctx.picker(game, moves, tt_move, ply);
    let mut bound = Bound::Upper;
    let mut best_move = None;
    let mut first_move = None;

    while let Some(mv) = picker.pick_next() {
        let is_first = first_move.is_none();
        let score = game.with_move(mv, |g| {
            if is_first {
                return -search(g, node, depth - 1, ply + 1, -beta, -alpha, ctx);
            }
            let scout = -search(g, NodeType::Scout, depth - 1, ply + 1, -alpha - 1, -alpha, ctx);
            if scout > alpha && scout < beta {
                -search(g, NodeType::Pv, depth - 1, ply + 1, -beta, -alpha, ctx)
            } else {
                scout
            }
        });
        first_move.get_or_insert(mv);

        if ctx.control.is_stopped() {
            return 0;
        }

        if score >= beta {
            if !is_tactical(&board, mv) {
                ctx.killers.store(ply, mv);
                ctx.history.reward(side, mv, depth);
            }
            ctx.tt.save(key, depth, beta, Bound::Lower, Some(mv), ply);
            return beta;
        }

        if score > alpha {
            alpha = score;
            bound = Bound::Exact;
            best_move = Some(mv);
            if score >= mate_value - 1 {
                break;
            }
        }
    }

    let stored_move = best_move.or(tt_move).or(first_move);
    ctx.tt.save(key, store_depth(alpha, bound, depth, ply), alpha, bound, stored_move, ply);
    alpha
}

/// Quiescence search: resolve captures and promotions before trusting the
/// static evaluation.
pub(super) fn qsearch(
    game: &mut Game,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    if ctx.control.should_stop() {
        return 0;
    }

    if game.is_draw_by_repetition() || game.is_draw_by_fifty_moves() {
        return 0;
    }

    ctx.stats.nodes += 1;
    ctx.stats.qnodes += 1;

    if ply >= MAX_PLY {
        return static_eval(game, ctx.evaluator);
    }

    let key = game.hash();
    if let Some(entry) = ctx.tt.load(key, 0, alpha, beta, ply) {
        ctx.stats.tt_hits += 1;
        return entry.value;
    }
    let tt_move = ctx.tt.probe(key).and_then(|entry| entry.best_move);

    let stand_pat = static_eval(game, ctx.evaluator);
    if stand_pat >= beta {
        return stand_pat;
    }
    alpha = alpha.max(stand_pat);

    if game.is_insufficient_material() {
        ctx.tt.save(key, TERMINAL_DEPTH, 0, Bound::Exact, None, ply);
        return 0;
    }

    let moves = game.legal_moves();
    if moves.is_empty() {
        let value = terminal_value(game.in_check(), ply);
        ctx.tt.save(key, TERMINAL_DEPTH, value, Bound::Exact, None, ply);
        return value;
    }

    let board = *game.board();
    let tactical = moves.into_iter().filter(|&mv| is_tactical(&board, mv)).collect();
    let mut picker = ctx.picker(game, tactical, tt_move, ply);
    let mut best_move = None;

    while let Some(mv) = picker.pick_next() {
        let score = game.with_move(mv, |g| -qsearch(g, ply + 1, -beta, -alpha, ctx));

        if ctx.control.is_stopped() {
            return 0;
        }

        if score >= beta {
            ctx.tt.save(key, 0, beta, Bound::Lower, Some(mv), ply);
            return beta;
        }
        if score > alpha {
            alpha = score;
            best_move = Some(mv);
        }
    }

    // Only move-backed results are cached; a fail-low keeps the table move.
    match (best_move, tt_move) {
        (Some(mv), _) => ctx.tt.save(key, 0, alpha, Bound::Exact, Some(mv), ply),
        (None, Some(mv)) => ctx.tt.save(key, 0, alpha, Bound::Upper, Some(mv), ply),
        (None, None) => {}
    }
    alpha
}

/// Search the root position to `depth` with window `(alpha, beta)`.
///
/// Every move that raises alpha becomes `ctx.root_best` and is reported with
/// its principal variation. `hint` orders the previous iteration's best move
/// first when the table has nothing better.
pub(super) fn search_root(
    game: &mut Game,
    depth: i32,
    mut alpha: i32,
    beta: i32,
    hint: Option<ChessMove>,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    ctx.root_best = None;
    ctx.stats.nodes += 1;

    let key = game.hash();
    let tt_move = ctx.tt.probe(key).and_then(|entry| entry.best_move).or(hint);
    let moves = game.legal_moves();
    let board = *game.board();
    let mut picker = ctx.picker(game, moves, tt_move, 0);
    let mut bound = Bound::Upper;
    let mut first_move = None;

    while let Some(mv) = picker.pick_next() {
        let is_first = first_move.is_none();
        let score = game.with_move(mv, |g| {
            if is_first {
                return -search(g, NodeType::Pv, depth - 1, 1, -beta, -alpha, ctx);
            }
            let scout = -search(g, NodeType::Scout, depth - 1, 1, -alpha - 1, -alpha, ctx);
            if scout > alpha && scout < beta {
                -search(g, NodeType::Pv, depth - 1, 1, -beta, -alpha, ctx)
            } else {
                scout
            }
        });
        first_move.get_or_insert(mv);

        if ctx.control.is_stopped() {
            return 0;
        }

        if score <= alpha {
            continue;
        }

        alpha = score;
        ctx.root_best = Some(mv);

        if score >= beta {
            ctx.tt.save(key, depth, beta, Bound::Lower, Some(mv), 0);
            return beta;
        }

        bound = Bound::Exact;
        let pv = ctx.tt.principal_variation(&board, mv, depth.max(1) as usize);
        let info = SearchInfo {
            depth,
            score,
            nodes: ctx.stats.nodes,
            qnodes: ctx.stats.qnodes,
            elapsed: ctx.control.elapsed(),
            tt_hits: ctx.stats.tt_hits,
            pv,
        };
        (ctx.report)(&info);

        if score >= MATE - 1 {
            break;
        }
    }

    let stored_move = ctx.root_best.or(first_move);
    ctx.tt.save(key, store_depth(alpha, bound, depth, 0), alpha, bound, stored_move, 0);
    alpha
}

/// Root search inside a window around the previous iteration's score,
/// widened to the full range when the result lands on or outside it.
pub(super) fn aspiration_search(
    game: &mut Game,
    depth: i32,
    previous: i32,
    hint: Option<ChessMove>,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    let margin = ctx.config.aspiration_margin;
    let alpha = (previous - margin).max(-INF);
    let beta = (previous + margin).min(INF);

    let score = search_root(game, depth, alpha, beta, hint, ctx);
    if ctx.control.is_stopped() || (score > alpha && score < beta) {
        return score;
    }

    tracing::debug!(depth, score, alpha, beta, "aspiration window missed, re-searching");
    search_root(game, depth, -INF, INF, hint, ctx)
}

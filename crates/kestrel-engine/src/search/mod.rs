//! Search algorithms and move ordering.

pub mod control;
pub mod heuristics;
pub mod info;
pub mod negamax;
pub mod ordering;
pub mod tt;

use std::time::Duration;

use kestrel_core::{ChessMove, Game};
use tracing::debug;

use crate::config::SearchConfig;
use crate::eval::Evaluator;
use control::{SearchControl, StopHandle};
use heuristics::{HistoryTable, KillerTable};
use info::SearchInfo;
use negamax::{INF, MATE, SearchContext, SearchStats, aspiration_search, search_root};
use tt::TranspositionTable;

/// History scores are divided by this at the start of every search.
const HISTORY_DECAY: i32 = 8;

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move of the deepest completed iteration; `None` only when the
    /// root has no legal moves.
    pub best_move: Option<ChessMove>,
    /// Score in centipawns (or a mate score) from the side to move's view.
    pub score: i32,
    /// Deepest completed iteration, 0 if none completed.
    pub depth: i32,
    /// Total nodes visited during the search.
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_hits: u64,
    /// Principal variation of the deepest completed iteration.
    pub pv: Vec<ChessMove>,
}

/// Iterative-deepening searcher.
///
/// Owns the transposition table and the move-ordering heuristics, which
/// persist from one search to the next until [`Engine::clear`].
pub struct Engine {
    evaluator: Box<dyn Evaluator>,
    config: SearchConfig,
    tt: TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
    stop: StopHandle,
}

impl Engine {
    /// Create an engine with a table sized from `config.hash_mb`.
    pub fn new(evaluator: impl Evaluator + 'static, config: SearchConfig) -> Self {
        Self {
            evaluator: Box::new(evaluator),
            tt: TranspositionTable::new(config.hash_mb),
            config,
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            stop: StopHandle::new(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Change the default depth cap used by [`iterate`](Self::iterate) and
    /// [`timed_search`](Self::timed_search).
    pub fn set_max_depth(&mut self, depth: i32) {
        self.config.max_depth = depth.max(1);
    }

    /// Forget everything learned: table entries, killers and history.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.history.clear();
    }

    /// Reallocate the transposition table with `mb` megabytes.
    pub fn resize_tt(&mut self, mb: usize) {
        self.config.hash_mb = mb;
        self.tt = TranspositionTable::new(mb);
    }

    /// Handle that stops the next (or current) search started through
    /// [`iterate`](Self::iterate) or [`timed_search`](Self::timed_search).
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Search until the configured depth cap, without a time limit.
    pub fn iterate(&mut self, game: &Game) -> SearchResult {
        let control = SearchControl::new_infinite(&self.stop);
        let result = self.search(game, self.config.max_depth, &control, |_| {});
        self.stop = StopHandle::new();
        result
    }

    /// Search under a time budget on a background thread and wait for it.
    ///
    /// A zero budget searches to the depth cap. `on_info` receives every
    /// progress report.
    pub fn timed_search<F>(&mut self, game: &Game, budget: Duration, on_info: F) -> SearchResult
    where
        F: FnMut(&SearchInfo) + Send,
    {
        self.timed_search_to_depth(game, budget, self.config.max_depth, on_info)
    }

    /// [`timed_search`](Self::timed_search) with an explicit depth cap.
    pub fn timed_search_to_depth<F>(
        &mut self,
        game: &Game,
        budget: Duration,
        max_depth: i32,
        on_info: F,
    ) -> SearchResult
    where
        F: FnMut(&SearchInfo) + Send,
    {
        let control = SearchControl::new_timed(&self.stop, budget);
        let engine = &mut *self;
        let outcome = std::thread::scope(|s| {
            s.spawn(move || engine.search(game, max_depth, &control, on_info))
                .join()
        });
        self.stop = StopHandle::new();
        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Run iterative deepening up to `max_depth` under `control`.
    ///
    /// Only fully completed iterations update the result: a search stopped
    /// part-way through depth `n` returns depth `n - 1`'s move. If even
    /// depth 1 is interrupted, the first move in ordering is returned.
    pub fn search<F>(
        &mut self,
        game: &Game,
        max_depth: i32,
        control: &SearchControl,
        mut on_info: F,
    ) -> SearchResult
    where
        F: FnMut(&SearchInfo),
    {
        let mut game = game.clone();
        let moves = game.legal_moves();
        if moves.is_empty() {
            let score = if game.in_check() { -MATE } else { 0 };
            tracing::info!(score, "no legal moves at the root");
            return SearchResult {
                best_move: None,
                score,
                depth: 0,
                nodes: 0,
                qnodes: 0,
                tt_hits: 0,
                pv: Vec::new(),
            };
        }

        self.history.decay(HISTORY_DECAY);
        self.killers.shift_left();

        let mut ctx = SearchContext {
            evaluator: self.evaluator.as_ref(),
            config: &self.config,
            control,
            tt: &mut self.tt,
            killers: &mut self.killers,
            history: &mut self.history,
            stats: SearchStats::default(),
            null_move_allowed: true,
            root_best: None,
            report: &mut on_info,
        };

        let tt_move = ctx.tt.probe(game.hash()).and_then(|entry| entry.best_move);
        let fallback = ctx.picker(&game, moves, tt_move, 0).pick_next();
        let mut result = SearchResult {
            best_move: fallback,
            score: 0,
            depth: 0,
            nodes: 0,
            qnodes: 0,
            tt_hits: 0,
            pv: fallback.into_iter().collect(),
        };

        for depth in 1..=max_depth.max(1) {
            if depth > 1 && (result.score.abs() > MATE - depth || control.should_stop()) {
                break;
            }

            let score = if depth == 1 {
                search_root(&mut game, 1, -INF, INF, result.best_move, &mut ctx)
            } else {
                aspiration_search(&mut game, depth, result.score, result.best_move, &mut ctx)
            };

            if control.is_stopped() {
                debug!(depth, "iteration aborted, keeping depth {}", result.depth);
                break;
            }

            if let Some(best) = ctx.root_best {
                result.best_move = Some(best);
                result.pv = ctx.tt.principal_variation(game.board(), best, depth as usize);
            }
            result.score = score;
            result.depth = depth;

            let elapsed_ms = control.elapsed().as_millis() as u64;
            debug!(
                depth,
                score,
                nodes = ctx.stats.nodes,
                elapsed_ms,
                best = ?result.best_move.map(|mv| mv.to_string()),
                "iteration complete"
            );
        }

        result.nodes = ctx.stats.nodes;
        result.qnodes = ctx.stats.qnodes;
        result.tt_hits = ctx.stats.tt_hits;

        tracing::info!(
            depth = result.depth,
            score = result.score,
            nodes = result.nodes,
            best = ?result.best_move.map(|mv| mv.to_string()),
            "search finished"
        );
        result
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("tt", &self.tt)
            .finish()
    }
}

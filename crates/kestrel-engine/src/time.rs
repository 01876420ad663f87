//! Time management: convert clock parameters to a search budget.

use std::time::Duration;

use kestrel_core::Color;

/// Moves assumed left in the game when the GUI does not say.
const DEFAULT_MOVES_TO_GO: f64 = 30.0;

/// Milliseconds held back for communication lag.
const OVERHEAD_MS: f64 = 10.0;

/// Budget for one move from the remaining clock time and increment.
///
/// | Parameter           | No increment | With increment      |
/// |---------------------|--------------|---------------------|
/// | Per-move base       | `usable / mtg` | `usable / mtg + inc * 0.75` |
/// | Cap (% of usable)   | 12%          | 25%                 |
pub fn compute_budget(remaining: Duration, increment: Duration, moves_to_go: Option<u32>) -> Duration {
    let remaining_ms = remaining.as_millis() as f64;
    if remaining_ms < OVERHEAD_MS {
        return Duration::from_millis(1);
    }

    let usable = (remaining_ms - OVERHEAD_MS).max(1.0);
    let inc_ms = increment.as_millis() as f64;
    let has_increment = inc_ms > 0.0;

    let mtg = moves_to_go.map_or(DEFAULT_MOVES_TO_GO, |x| x.max(1) as f64);
    let base = usable / mtg;
    let budget = if has_increment { base + inc_ms * 0.75 } else { base };

    let cap_pct = if has_increment { 0.25 } else { 0.12 };
    // A single move left may use the whole usable time.
    let cap = if moves_to_go == Some(1) { usable } else { usable * cap_pct };

    Duration::from_millis(budget.min(cap).max(1.0) as u64)
}

/// Pick the search budget for UCI `go` parameters.
///
/// Priority order:
/// 1. `infinite` -> unlimited
/// 2. `movetime` -> exactly that long
/// 3. clock for the side to move -> [`compute_budget`]
/// 4. `depth` only / bare `go` -> unlimited
///
/// Unlimited is reported as [`Duration::ZERO`].
#[allow(clippy::too_many_arguments)]
pub fn budget_from_go(
    wtime: Option<Duration>,
    btime: Option<Duration>,
    winc: Option<Duration>,
    binc: Option<Duration>,
    movestogo: Option<u32>,
    movetime: Option<Duration>,
    infinite: bool,
    side: Color,
) -> Duration {
    if infinite {
        return Duration::ZERO;
    }
    if let Some(movetime) = movetime {
        return movetime.max(Duration::from_millis(1));
    }

    let (remaining, increment) = match side {
        Color::White => (wtime, winc),
        Color::Black => (btime, binc),
    };
    match remaining {
        Some(remaining) => {
            compute_budget(remaining, increment.unwrap_or(Duration::ZERO), movestogo)
        }
        None => Duration::ZERO,
    }
}

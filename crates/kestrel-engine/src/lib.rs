//! Search and evaluation for kestrel.

pub mod config;
pub mod eval;
pub mod search;
pub mod time;

pub use config::SearchConfig;
pub use eval::{Evaluator, MaterialEvaluator, ZeroEvaluator};
pub use search::control::{SearchControl, StopHandle};
pub use search::info::{Score, SearchInfo};
pub use search::negamax::{INF, MATE, MATE_BOUND};
pub use search::{Engine, SearchResult};
pub use time::budget_from_go;

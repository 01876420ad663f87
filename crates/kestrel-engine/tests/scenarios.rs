//! End-to-end search scenarios: known mates, terminal roots, cancellation.

use std::time::Duration;

use kestrel_core::Game;
use kestrel_engine::{
    Engine, MATE, MaterialEvaluator, SearchConfig, SearchControl, SearchResult, StopHandle,
    ZeroEvaluator,
};

fn material_engine() -> Engine {
    Engine::new(MaterialEvaluator, SearchConfig::default())
}

fn search_to(fen: &str, depth: i32) -> SearchResult {
    let game = Game::from_fen(fen).unwrap();
    let control = SearchControl::new_infinite(&StopHandle::new());
    material_engine().search(&game, depth, &control, |_| {})
}

fn best(result: &SearchResult) -> String {
    result.best_move.map(|mv| mv.to_string()).unwrap_or_default()
}

const BACK_RANK: &str = "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1";
const EN_PASSANT_MATE: &str = "r1qr1b2/1R3pkp/3p2pN/ppnPp1Q1/bn2P3/4P2P/PBBP2P1/5RK1 w - e6 0 1";
const MATE_IN_3_PLY: &str = "r1qr1b2/1R3pkp/3p2pN/ppnPp1Q1/bn2P3/4P2P/PBBP2P1/5RK1 w - - 0 1";
const MATE_IN_5_PLY: &str = "r1qr1b2/1R3pkp/3p2pN/ppnPp1Q1/bn2P3/4P2P/PBBP1PP1/5RK1 w - - 0 1";

#[test]
fn back_rank_mate_found_at_depth_one() {
    let result = search_to(BACK_RANK, 1);
    assert_eq!(best(&result), "d1d8");
    assert_eq!(result.score, MATE - 1);
    assert_eq!(result.depth, 1);
}

#[test]
fn en_passant_discovered_mate() {
    let result = search_to(EN_PASSANT_MATE, 3);
    assert_eq!(best(&result), "d5e6");
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn mate_in_three_plies_is_stable_across_depths() {
    for depth in 3..=5 {
        let result = search_to(MATE_IN_3_PLY, depth);
        assert_eq!(best(&result), "f1f7", "depth cap {depth}");
        assert_eq!(result.score, MATE - 3, "depth cap {depth}");
    }
}

#[test]
fn mate_in_five_plies() {
    let result = search_to(MATE_IN_5_PLY, 6);
    assert_eq!(best(&result), "b7f7");
    assert!(
        result.score > MATE - 6 && result.score < MATE - 4,
        "score {} is not mate in 5 plies",
        result.score
    );
}

#[test]
fn reported_mate_line_starts_with_best_move() {
    let game = Game::from_fen(MATE_IN_3_PLY).unwrap();
    let control = SearchControl::new_infinite(&StopHandle::new());
    let mut lines = Vec::new();
    let result = material_engine().search(&game, 4, &control, |info| lines.push(info.to_string()));
    assert_eq!(result.pv[0].to_string(), "f1f7");
    let last = lines.last().unwrap();
    assert!(last.contains("score mate 2"), "{last}");
    assert!(last.contains(" pv f1f7"), "{last}");
}

#[test]
fn stalemate_root_returns_no_move() {
    let result = search_to("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1", 5);
    assert_eq!(result.best_move, None);
    assert_eq!(result.score, 0);
}

#[test]
fn startpos_depth_one_is_level_and_legal() {
    let game = Game::startpos();
    let control = SearchControl::new_infinite(&StopHandle::new());
    let mut engine = Engine::new(ZeroEvaluator, SearchConfig::default());
    let result = engine.search(&game, 1, &control, |_| {});
    assert_eq!(result.score, 0);
    assert!(game.legal_moves().contains(&result.best_move.unwrap()));
}

#[test]
fn cancellation_keeps_last_completed_iteration() {
    let game = Game::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4")
        .unwrap();
    let mut engine = material_engine();
    let stop = StopHandle::new();
    let control = SearchControl::new_infinite(&stop);

    let mut last_report = None;
    let mut expected = None;
    let result = engine.search(&game, 30, &control, |info| {
        if info.depth == 4 && expected.is_none() {
            expected = last_report;
            stop.stop();
        }
        if info.depth < 4 {
            last_report = Some(info.pv[0]);
        }
    });

    assert_eq!(result.depth, 3);
    assert_eq!(result.best_move, expected);
}

#[test]
fn timed_search_honours_budget() {
    let game = Game::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4")
        .unwrap();
    let mut engine = material_engine();
    let start = std::time::Instant::now();
    let result = engine.timed_search(&game, Duration::from_millis(150), |_| {});
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(game.legal_moves().contains(&result.best_move.unwrap()));
}

#[test]
fn stop_from_another_thread() {
    let game = Game::startpos();
    let mut engine = material_engine();
    engine.set_max_depth(64);
    let handle = engine.stop_handle();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        handle.stop();
    });
    let result = engine.timed_search(&game, Duration::ZERO, |_| {});
    stopper.join().unwrap();
    assert!(result.best_move.is_some());
    assert!(result.depth < 64);
}

#[test]
fn searching_a_game_line_continues_after_each_move() {
    let mut game = Game::startpos();
    let mut engine = material_engine();
    for _ in 0..4 {
        let control = SearchControl::new_infinite(&StopHandle::new());
        let result = engine.search(&game, 3, &control, |_| {});
        let mv = result.best_move.expect("game is not over");
        game.make_move(mv);
    }
    assert_eq!(game.ply_count(), 4);
}

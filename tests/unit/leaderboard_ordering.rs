use pretty_assertions::assert_eq;
use test_log::test;

use stock_elo::analysis::{build_leaderboard, LeaderboardStatus};
use stock_elo::models::{DataField, DataIssue, ScoreRecord};

fn scored(symbol: &str, score: f64) -> ScoreRecord {
    ScoreRecord {
        symbol: symbol.to_string(),
        fundamental_score: Some(score),
        technical_score: Some(score),
        time_score: None,
        final_score: Some(score),
        last_close: None,
        issues: Vec::new(),
    }
}

fn failed(symbol: &str) -> ScoreRecord {
    ScoreRecord::unavailable(symbol, vec![DataIssue::MissingData { field: DataField::PriceHistory }])
}

#[test]
fn test_sorted_best_first_with_stable_ties() {
    let board = build_leaderboard(vec![
        scored("B", 1010.0),
        failed("X"),
        scored("A", 1050.0),
        scored("C", 1010.0),
        scored("D", 990.5),
    ]);

    assert_eq!(board.symbols(), vec!["A", "B", "C", "D", "X"]);
    let ranks: Vec<Option<usize>> = board.entries().iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![Some(1), Some(2), Some(3), Some(4), None]);
    assert_eq!(board.status(), LeaderboardStatus::Ranked);
    assert_eq!(board.leader().map(|r| r.symbol.as_str()), Some("A"));
}

#[test]
fn test_scores_are_non_increasing() {
    let records: Vec<ScoreRecord> = (0..25)
        .map(|i| scored(&format!("S{}", i), 1000.0 + ((i * 37) % 17) as f64))
        .collect();
    let board = build_leaderboard(records);

    let scores: Vec<f64> = board.entries().iter().filter_map(|e| e.record.final_score).collect();
    assert_eq!(scores.len(), 25);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_empty_input_is_not_an_error() {
    let board = build_leaderboard(Vec::new());
    assert!(board.is_empty());
    assert_eq!(board.status(), LeaderboardStatus::NoData);
    assert!(board.leader().is_none());
}

#[test]
fn test_only_failures_is_no_data() {
    let board = build_leaderboard(vec![failed("X"), failed("Y")]);
    assert_eq!(board.len(), 2);
    assert_eq!(board.scored_count(), 0);
    assert_eq!(board.status(), LeaderboardStatus::NoData);
    assert_eq!(board.symbols(), vec!["X", "Y"]);
}

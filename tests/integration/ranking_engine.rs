//! Ranking engine over a mocked market data provider

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::common::fixtures::{blue_chip_fundamentals, falling_series, rising_series};
use crate::common::logging::{log_test_data, log_test_step};
use crate::common::MockProvider;
use stock_elo::analysis::scoring::SENTINEL_RATING;
use stock_elo::analysis::{LeaderboardStatus, ScoringConfig};
use stock_elo::api::{FetchError, OutputSize};
use stock_elo::models::{DataField, DataIssue, PriceSeries, TimeFrame};
use stock_elo::ranking_engine::{RankingEngine, RankingRequest};

fn request(inputs: &[&str], frame: TimeFrame) -> RankingRequest {
    RankingRequest::new(inputs.iter().map(|s| s.to_string()).collect(), frame)
}

#[test_log::test(tokio::test)]
async fn test_failures_are_isolated_per_symbol() {
    log_test_step("Ranking a batch with one broken symbol");
    let mut provider = MockProvider::new();

    provider.expect_daily_series().returning(|symbol, _| match symbol {
        "AAPL" | "MSFT" => Ok(rising_series(60)),
        other => Err(FetchError::NotFound(other.to_string())),
    });
    provider.expect_fundamentals().returning(|symbol| match symbol {
        "AAPL" => Ok(blue_chip_fundamentals()),
        _ => Err(FetchError::RateLimited("slow down".to_string())),
    });
    provider.expect_exchange_rate().never();

    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let report = engine
        .rank(&request(&["BAD", "MSFT", "AAPL"], TimeFrame::OneMonth))
        .await;
    log_test_data("leaderboard", &report.leaderboard);

    assert_eq!(report.leaderboard.symbols(), vec!["AAPL", "MSFT", "BAD"]);
    assert_eq!(report.leaderboard.status(), LeaderboardStatus::Ranked);

    let entries = report.leaderboard.entries();
    assert_eq!(entries[0].rank, Some(1));
    assert!(entries[0].record.final_score.unwrap() > SENTINEL_RATING);
    assert!(entries[0].record.issues.is_empty());

    // fundamentals missing: sentinel rating, other sub-scores still reported
    assert_eq!(entries[1].rank, Some(2));
    assert_eq!(entries[1].record.final_score, Some(SENTINEL_RATING));
    assert!(entries[1].record.time_score.is_some());
    assert_eq!(
        entries[1].record.issues,
        vec![DataIssue::MissingData { field: DataField::Fundamentals }]
    );

    assert_eq!(entries[2].rank, None);
    assert_eq!(entries[2].record.final_score, None);
    assert_eq!(report.fx_rate, Some(1.0));
}

#[tokio::test]
async fn test_price_history_missing_but_fundamentals_present() {
    let mut provider = MockProvider::new();
    provider
        .expect_daily_series()
        .returning(|_, _| Ok(PriceSeries::default()));
    provider
        .expect_fundamentals()
        .returning(|_| Ok(blue_chip_fundamentals()));

    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let report = engine.rank(&request(&["EMPTY"], TimeFrame::OneWeek)).await;

    let record = &report.leaderboard.entries()[0].record;
    assert_eq!(record.fundamental_score, Some(1090.0));
    // indicators default to 50 / 0 / 0
    assert_eq!(record.technical_score, Some(1000.0));
    assert_eq!(record.time_score, None);
    assert_eq!(record.final_score, Some(1045.0));
    assert_eq!(record.last_close, None);
    assert_eq!(
        record.issues,
        vec![
            DataIssue::MissingData { field: DataField::PriceHistory },
            DataIssue::MissingData { field: DataField::TimeWindow },
        ]
    );
}

#[tokio::test]
async fn test_failed_price_fetch_keeps_fundamental_score() {
    let mut provider = MockProvider::new();
    provider
        .expect_daily_series()
        .returning(|symbol, _| Err(FetchError::NotFound(symbol.to_string())));
    provider
        .expect_fundamentals()
        .returning(|_| Ok(blue_chip_fundamentals()));

    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let report = engine.rank(&request(&["HALF"], TimeFrame::OneMonth)).await;

    let entry = &report.leaderboard.entries()[0];
    assert_eq!(entry.rank, Some(1));
    assert_eq!(entry.record.technical_score, Some(1000.0));
    assert_eq!(entry.record.final_score, Some(1045.0));
    assert!(entry
        .record
        .issues
        .contains(&DataIssue::MissingData { field: DataField::PriceHistory }));
}

#[tokio::test]
async fn test_short_history_is_flagged() {
    let mut provider = MockProvider::new();
    provider
        .expect_daily_series()
        .returning(|_, _| Ok(rising_series(20)));
    provider
        .expect_fundamentals()
        .returning(|_| Ok(blue_chip_fundamentals()));

    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let report = engine.rank(&request(&["NEW"], TimeFrame::OneWeek)).await;

    let record = &report.leaderboard.entries()[0].record;
    assert!(record.is_scored());
    assert_matches!(
        record.issues.as_slice(),
        [
            DataIssue::InsufficientHistory { required: 26, actual: 20, .. },
            DataIssue::InsufficientHistory { required: 50, actual: 20, .. }
        ]
    );
}

#[tokio::test]
async fn test_name_resolution() {
    let mut provider = MockProvider::new();

    provider.expect_search_symbol().returning(|query| match query {
        "Apple" => Ok(Some("aapl".to_string())),
        "Apple Inc" => Ok(Some("AAPL".to_string())),
        "Nope Corp" => Ok(None),
        _ => Err(FetchError::Api("search failed".to_string())),
    });
    provider
        .expect_daily_series()
        .times(1)
        .returning(|_, _| Ok(rising_series(60)));
    provider
        .expect_fundamentals()
        .times(1)
        .returning(|_| Ok(blue_chip_fundamentals()));

    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let mut req = request(&["Apple", "Nope Corp", "Apple Inc", "Broken"], TimeFrame::OneMonth);
    req.resolve_names = true;
    let report = engine.rank(&req).await;

    assert_eq!(report.leaderboard.symbols(), vec!["AAPL"]);
    assert_eq!(
        report.unresolved,
        vec![
            DataIssue::SymbolUnresolved { input: "Nope Corp".to_string() },
            DataIssue::SymbolUnresolved { input: "Broken".to_string() },
        ]
    );
}

#[tokio::test]
async fn test_long_frames_request_full_history() {
    let mut provider = MockProvider::new();
    provider
        .expect_daily_series()
        .withf(|_, size| *size == OutputSize::Full)
        .times(1)
        .returning(|_, _| Ok(rising_series(400)));
    provider
        .expect_fundamentals()
        .returning(|_| Ok(blue_chip_fundamentals()));

    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let report = engine.rank(&request(&["LONG"], TimeFrame::OneYear)).await;

    // 100 + 34 -> 100 + 399 over the year window
    let record = &report.leaderboard.entries()[0].record;
    assert_eq!(record.last_close, Some(499.0));
    assert!(record.time_score.unwrap() > 1000.0);
}

#[tokio::test]
async fn test_display_currency() {
    let mut provider = MockProvider::new();
    provider
        .expect_daily_series()
        .returning(|_, _| Ok(falling_series(60)));
    provider
        .expect_fundamentals()
        .returning(|_| Ok(blue_chip_fundamentals()));
    provider
        .expect_exchange_rate()
        .withf(|from, to| from.eq_ignore_ascii_case("USD") && to.eq_ignore_ascii_case("EUR"))
        .times(1)
        .returning(|_, _| Ok(0.5));

    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let mut req = request(&["DOWN"], TimeFrame::OneMonth);
    req.currency = "EUR".to_string();
    let report = engine.rank(&req).await;

    let record = &report.leaderboard.entries()[0].record;
    assert_eq!(report.fx_rate, Some(0.5));
    assert_eq!(record.last_close, Some(141.0));
    assert_eq!(report.display_price(record), Some(70.5));
}

#[tokio::test]
async fn test_missing_exchange_rate_keeps_scores() {
    let mut provider = MockProvider::new();
    provider
        .expect_daily_series()
        .returning(|_, _| Ok(rising_series(60)));
    provider
        .expect_fundamentals()
        .returning(|_| Ok(blue_chip_fundamentals()));
    provider
        .expect_exchange_rate()
        .returning(|_, to| Err(FetchError::Api(format!("no rate for {}", to))));

    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let mut req = request(&["AAPL"], TimeFrame::OneMonth);
    req.currency = "XYZ".to_string();
    let report = engine.rank(&req).await;

    let record = &report.leaderboard.entries()[0].record;
    assert!(record.is_scored());
    assert_eq!(report.fx_rate, None);
    assert_eq!(report.display_price(record), None);
}

#[tokio::test]
async fn test_concurrent_fetch_keeps_input_order_on_ties() {
    let mut provider = MockProvider::new();
    provider
        .expect_daily_series()
        .returning(|_, _| Ok(rising_series(60)));
    provider
        .expect_fundamentals()
        .returning(|_| Ok(blue_chip_fundamentals()));

    let engine = RankingEngine::new(provider, ScoringConfig::default()).with_concurrency(4);
    let report = engine
        .rank(&request(&["d", "a", "c", "b", "a"], TimeFrame::OneWeek))
        .await;

    assert_eq!(report.leaderboard.symbols(), vec!["D", "A", "C", "B"]);
    let ranks: Vec<Option<usize>> = report.leaderboard.entries().iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![Some(1), Some(2), Some(3), Some(4)]);
}

#[tokio::test]
async fn test_empty_request() {
    let provider = MockProvider::new();
    let engine = RankingEngine::new(provider, ScoringConfig::default());
    let report = engine.rank(&request(&[], TimeFrame::OneMonth)).await;

    assert!(report.leaderboard.is_empty());
    assert_eq!(report.leaderboard.status(), LeaderboardStatus::NoData);
}

//! Resolve → fetch → score → rank for a list of requested stocks.
//!
//! Every per-symbol failure is contained: it shows up as a data issue on that
//! symbol's row (or drops an unresolvable input) and the rest of the batch
//! carries on.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::indicators::{self, IndicatorParams};
use crate::analysis::ranking::{build_leaderboard, Leaderboard};
use crate::analysis::scoring::{compute_score, ScoringConfig};
use crate::api::{MarketDataProvider, OutputSize};
use crate::models::{DataField, DataIssue, IndicatorResult, ScoreRecord, TimeFrame};

/// What the caller wants ranked
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRequest {
    pub inputs: Vec<String>,
    pub frame: TimeFrame,
    /// Treat inputs as company names and look each one up
    pub resolve_names: bool,
    pub currency: String,
}

impl RankingRequest {
    pub fn new(inputs: Vec<String>, frame: TimeFrame) -> Self {
        Self {
            inputs,
            frame,
            resolve_names: false,
            currency: "USD".to_string(),
        }
    }
}

/// Leaderboard plus the context needed to display it
#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    pub leaderboard: Leaderboard,
    pub frame: TimeFrame,
    pub currency: String,
    /// Display price multiplier from USD; `None` when the rate was unavailable
    pub fx_rate: Option<f64>,
    pub unresolved: Vec<DataIssue>,
    pub generated_at: DateTime<Utc>,
}

impl RankingReport {
    /// Last close in the display currency
    pub fn display_price(&self, record: &ScoreRecord) -> Option<f64> {
        let rate = self.fx_rate?;
        record.last_close.map(|close| close * rate)
    }
}

/// Split comma separated user input, dropping blanks and repeats
pub fn parse_symbol_list(text: &str) -> Vec<String> {
    let mut inputs: Vec<String> = Vec::new();
    for raw in text.split(',') {
        let input = raw.trim();
        if input.is_empty() || inputs.iter().any(|seen| seen.eq_ignore_ascii_case(input)) {
            continue;
        }
        inputs.push(input.to_string());
    }
    inputs
}

pub struct RankingEngine<P> {
    provider: Arc<P>,
    scoring: ScoringConfig,
    indicator_params: IndicatorParams,
    concurrency: usize,
}

impl<P: MarketDataProvider> RankingEngine<P> {
    pub fn new(provider: P, scoring: ScoringConfig) -> Self {
        Self::with_shared_provider(Arc::new(provider), scoring)
    }

    pub fn with_shared_provider(provider: Arc<P>, scoring: ScoringConfig) -> Self {
        Self {
            provider,
            scoring,
            indicator_params: IndicatorParams::default(),
            concurrency: 1,
        }
    }

    /// Symbols fetched at once; input order is preserved either way
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_indicator_params(mut self, params: IndicatorParams) -> Self {
        self.indicator_params = params;
        self
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Rank every requested input. Never fails as a whole.
    pub async fn rank(&self, request: &RankingRequest) -> RankingReport {
        info!(
            "🚀 Ranking {} inputs over {} ({} fetch slots)",
            request.inputs.len(),
            request.frame,
            self.concurrency
        );

        let (symbols, unresolved) = self.resolve_inputs(request).await;

        let frame = request.frame;
        let records: Vec<ScoreRecord> = stream::iter(symbols)
            .map(|symbol| async move { self.score_symbol(&symbol, frame).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let fx_rate = self.display_rate(&request.currency).await;
        let leaderboard = build_leaderboard(records);

        info!(
            "✅ Ranked {} of {} symbols ({} unresolved)",
            leaderboard.scored_count(),
            leaderboard.len(),
            unresolved.len()
        );

        RankingReport {
            leaderboard,
            frame: request.frame,
            currency: request.currency.clone(),
            fx_rate,
            unresolved,
            generated_at: Utc::now(),
        }
    }

    async fn resolve_inputs(&self, request: &RankingRequest) -> (Vec<String>, Vec<DataIssue>) {
        let mut symbols: Vec<String> = Vec::new();
        let mut unresolved = Vec::new();

        for input in &request.inputs {
            let resolved = if request.resolve_names {
                self.resolve_name(input).await
            } else {
                Some(input.trim().to_uppercase())
            };

            match resolved {
                Some(symbol) if !symbol.is_empty() => {
                    if !symbols.contains(&symbol) {
                        symbols.push(symbol);
                    }
                }
                _ => {
                    warn!("⚠️  Could not resolve '{}' to a ticker symbol", input);
                    unresolved.push(DataIssue::SymbolUnresolved { input: input.clone() });
                }
            }
        }

        (symbols, unresolved)
    }

    async fn resolve_name(&self, input: &str) -> Option<String> {
        match self.provider.search_symbol(input).await {
            Ok(found) => found.map(|s| s.to_uppercase()),
            Err(e) => {
                warn!("Symbol search for '{}' failed: {}", input, e);
                None
            }
        }
    }

    async fn display_rate(&self, currency: &str) -> Option<f64> {
        if currency.eq_ignore_ascii_case("USD") {
            return Some(1.0);
        }
        match self.provider.exchange_rate("USD", currency).await {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!("Exchange rate USD→{} unavailable: {}", currency, e);
                None
            }
        }
    }

    /// Fetch and score a single symbol
    pub async fn score_symbol(&self, symbol: &str, frame: TimeFrame) -> ScoreRecord {
        let size = if frame.needs_full_history() {
            OutputSize::Full
        } else {
            OutputSize::Compact
        };

        let series = match self.provider.daily_series(symbol, size).await {
            Ok(series) if !series.is_empty() => Some(series),
            Ok(_) => {
                warn!("{}: provider returned an empty price history", symbol);
                None
            }
            Err(e) => {
                warn!("{}: price history unavailable: {}", symbol, e);
                None
            }
        };

        let fundamentals = match self.provider.fundamentals(symbol).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("{}: fundamentals unavailable: {}", symbol, e);
                None
            }
        };

        let Some(series) = series else {
            if fundamentals.is_none() {
                return ScoreRecord::unavailable(
                    symbol,
                    vec![
                        DataIssue::MissingData { field: DataField::Fundamentals },
                        DataIssue::MissingData { field: DataField::PriceHistory },
                    ],
                );
            }
            // indicators fall back to their defaults, the time window stays empty
            let mut record = compute_score(
                symbol,
                fundamentals.as_ref(),
                Some(&IndicatorResult::default()),
                None,
                &self.scoring,
            );
            record
                .issues
                .insert(0, DataIssue::MissingData { field: DataField::PriceHistory });
            return record;
        };

        let report = indicators::evaluate(&series, &self.indicator_params);
        let window = series.window(frame);
        let mut record = compute_score(
            symbol,
            fundamentals.as_ref(),
            Some(&report.result),
            Some(&window),
            &self.scoring,
        );
        record.issues.extend(report.issues);
        record
    }
}

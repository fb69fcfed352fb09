//! Composite Elo-style rating built from fundamentals, indicators and price change.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::models::{DataField, DataIssue, FundamentalSnapshot, IndicatorResult, PriceSeries, ScoreRecord};

/// Centre of every sub-score
pub const BASE_RATING: f64 = 1000.0;

/// Final score used when fundamentals or technicals are entirely unavailable
pub const SENTINEL_RATING: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FundamentalWeights {
    pub pe_ratio: f64,
    pub roe_percent: f64,
    pub eps: f64,
    pub market_cap_billions: f64,
}

impl FundamentalWeights {
    /// Lower P/E is better; ROE, EPS and size add to the rating
    pub fn canonical() -> Self {
        Self {
            pe_ratio: -3.0,
            roe_percent: 5.0,
            eps: 2.0,
            market_cap_billions: 0.5,
        }
    }

    /// The heavier weight set used by the first ranking page
    pub fn legacy() -> Self {
        Self {
            pe_ratio: -5.0,
            roe_percent: 10.0,
            eps: 10.0,
            market_cap_billions: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TechnicalWeights {
    pub rsi: f64,
    pub macd: f64,
    pub sma_deviation: f64,
}

impl Default for TechnicalWeights {
    fn default() -> Self {
        Self {
            rsi: 1.0,
            macd: 5.0,
            sma_deviation: 0.2,
        }
    }
}

/// Named fundamental weight sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightPreset {
    #[default]
    Canonical,
    Legacy,
}

impl WeightPreset {
    pub fn weights(&self) -> FundamentalWeights {
        match self {
            WeightPreset::Canonical => FundamentalWeights::canonical(),
            WeightPreset::Legacy => FundamentalWeights::legacy(),
        }
    }
}

impl fmt::Display for WeightPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightPreset::Canonical => f.write_str("canonical"),
            WeightPreset::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for WeightPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "canonical" => Ok(WeightPreset::Canonical),
            "legacy" => Ok(WeightPreset::Legacy),
            other => Err(format!("unknown weight preset '{}' (expected canonical or legacy)", other)),
        }
    }
}

/// Tunable parameters of the rating formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringConfig {
    pub base: f64,
    pub fundamental: FundamentalWeights,
    pub technical: TechnicalWeights,
    /// Rating points per percent of price change
    pub time_multiplier: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::with_preset(WeightPreset::Canonical)
    }
}

impl ScoringConfig {
    pub fn with_preset(preset: WeightPreset) -> Self {
        Self {
            base: BASE_RATING,
            fundamental: preset.weights(),
            technical: TechnicalWeights::default(),
            time_multiplier: 10.0,
        }
    }
}

/// Round half-to-even to two decimal places
pub fn round_score(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

pub fn fundamental_score(fundamentals: &FundamentalSnapshot, config: &ScoringConfig) -> f64 {
    let w = &config.fundamental;
    config.base
        + w.pe_ratio * fundamentals.pe_ratio_or_zero()
        + w.roe_percent * fundamentals.roe_percent_or_zero()
        + w.eps * fundamentals.eps_or_zero()
        + w.market_cap_billions * fundamentals.market_cap_billions_or_zero()
}

pub fn technical_score(indicators: &IndicatorResult, config: &ScoringConfig) -> f64 {
    let w = &config.technical;
    config.base
        + w.rsi * (indicators.rsi - 50.0)
        + w.macd * indicators.macd
        + w.sma_deviation * indicators.sma_deviation
}

/// Percent change from first to last close; `None` below two points or on a zero start
pub fn percent_change(window: &PriceSeries) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }
    let first = window.first()?.close;
    let last = window.last()?.close;
    let change = (last - first) / first * 100.0;
    change.is_finite().then_some(change)
}

pub fn time_score(window: &PriceSeries, config: &ScoringConfig) -> Option<f64> {
    percent_change(window).map(|pct| config.base + config.time_multiplier * pct)
}

/// Mean of the available sub-scores.
///
/// Falls back to [`SENTINEL_RATING`] when fundamentals or technicals are missing.
pub fn final_score(fundamental: Option<f64>, technical: Option<f64>, time: Option<f64>) -> f64 {
    if fundamental.is_none() || technical.is_none() {
        return SENTINEL_RATING;
    }
    let available: Vec<f64> = [time, fundamental, technical].into_iter().flatten().collect();
    available.iter().sum::<f64>() / available.len() as f64
}

/// Score one symbol. Rounding happens here, once, on the emitted values.
pub fn compute_score(
    symbol: &str,
    fundamentals: Option<&FundamentalSnapshot>,
    indicators: Option<&IndicatorResult>,
    window: Option<&PriceSeries>,
    config: &ScoringConfig,
) -> ScoreRecord {
    let mut issues = Vec::new();

    let fundamental = fundamentals.map(|f| fundamental_score(f, config));
    if fundamental.is_none() {
        issues.push(DataIssue::MissingData { field: DataField::Fundamentals });
    }

    let technical = indicators.map(|i| technical_score(i, config));
    if technical.is_none() {
        issues.push(DataIssue::MissingData { field: DataField::PriceHistory });
    }

    let time = window.and_then(|w| time_score(w, config));
    if time.is_none() {
        issues.push(DataIssue::MissingData { field: DataField::TimeWindow });
    }

    let overall = final_score(fundamental, technical, time);

    ScoreRecord {
        symbol: symbol.to_string(),
        fundamental_score: fundamental.map(round_score),
        technical_score: technical.map(round_score),
        time_score: time.map(round_score),
        final_score: Some(round_score(overall)),
        last_close: window.and_then(|w| w.last()).map(|p| round_score(p.close)),
        issues,
    }
}

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::analysis::scoring::WeightPreset;

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Reasons a set of points cannot form a price series
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("price points are not in chronological order at {0}")]
    Unordered(NaiveDate),
    #[error("duplicate price point for {0}")]
    DuplicateDate(NaiveDate),
}

/// Chronologically ascending closing prices with unique dates.
///
/// The points are private so a series cannot be reordered once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points that are already in ascending date order
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for pair in points.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(SeriesError::DuplicateDate(pair[1].date));
            }
            if pair[0].date > pair[1].date {
                return Err(SeriesError::Unordered(pair[1].date));
            }
        }
        Ok(Self { points })
    }

    /// Build a series from provider rows in any order (oldest first after sorting)
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        points.sort_by_key(|p| p.date);
        Self::new(points)
    }

    /// Consecutive calendar days starting at `start`
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + Duration::days(i as i64), close))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Points within `frame` calendar days of the latest observation (inclusive)
    pub fn window(&self, frame: TimeFrame) -> PriceSeries {
        let Some(last) = self.last() else {
            return PriceSeries::default();
        };
        let cutoff = last.date - Duration::days(frame.days());
        let points = self
            .points
            .iter()
            .filter(|p| p.date >= cutoff)
            .copied()
            .collect();
        PriceSeries { points }
    }
}

/// Fundamental fields reported by the provider. A missing field counts as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub pe_ratio: Option<f64>,
    pub roe_percent: Option<f64>,
    pub eps: Option<f64>,
    pub market_cap_billions: Option<f64>,
}

impl FundamentalSnapshot {
    pub fn new(pe_ratio: f64, roe_percent: f64, eps: f64, market_cap_billions: f64) -> Self {
        Self {
            pe_ratio: Some(pe_ratio),
            roe_percent: Some(roe_percent),
            eps: Some(eps),
            market_cap_billions: Some(market_cap_billions),
        }
    }

    pub fn pe_ratio_or_zero(&self) -> f64 {
        self.pe_ratio.unwrap_or(0.0)
    }

    pub fn roe_percent_or_zero(&self) -> f64 {
        self.roe_percent.unwrap_or(0.0)
    }

    pub fn eps_or_zero(&self) -> f64 {
        self.eps.unwrap_or(0.0)
    }

    pub fn market_cap_billions_or_zero(&self) -> f64 {
        self.market_cap_billions.unwrap_or(0.0)
    }

    /// True when the provider returned none of the four fields
    pub fn is_empty(&self) -> bool {
        self.pe_ratio.is_none()
            && self.roe_percent.is_none()
            && self.eps.is_none()
            && self.market_cap_billions.is_none()
    }
}

/// Technical indicator values at the last observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub rsi: f64,
    pub macd: f64,
    pub sma_deviation: f64,
}

impl Default for IndicatorResult {
    fn default() -> Self {
        Self {
            rsi: 50.0,
            macd: 0.0,
            sma_deviation: 0.0,
        }
    }
}

/// Per-symbol scoring output. Every field is derived from the inputs alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub symbol: String,
    pub fundamental_score: Option<f64>,
    pub technical_score: Option<f64>,
    pub time_score: Option<f64>,
    pub final_score: Option<f64>,
    pub last_close: Option<f64>,
    pub issues: Vec<DataIssue>,
}

impl ScoreRecord {
    /// A row for a symbol with no usable data at all
    pub fn unavailable(symbol: &str, issues: Vec<DataIssue>) -> Self {
        Self {
            symbol: symbol.to_string(),
            fundamental_score: None,
            technical_score: None,
            time_score: None,
            final_score: None,
            last_close: None,
            issues,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.final_score.is_some()
    }
}

/// Input that a data issue refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataField {
    Fundamentals,
    PriceHistory,
    TimeWindow,
}

impl fmt::Display for DataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataField::Fundamentals => "fundamentals",
            DataField::PriceHistory => "price history",
            DataField::TimeWindow => "time window",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Rsi,
    Macd,
    Sma,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Indicator::Rsi => "RSI",
            Indicator::Macd => "MACD",
            Indicator::Sma => "SMA",
        };
        f.write_str(name)
    }
}

/// Named data problems and the fallback each one triggers.
///
/// - `MissingData`: indicators use their defaults, `time_score` becomes null.
/// - `InsufficientHistory`: the indicator default is used.
/// - `SymbolUnresolved`: the input is left out of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIssue {
    #[error("missing {field} data")]
    MissingData { field: DataField },
    #[error("{indicator} needs {required} points, series has {actual}")]
    InsufficientHistory {
        indicator: Indicator,
        required: usize,
        actual: usize,
    },
    #[error("could not resolve '{input}' to a ticker symbol")]
    SymbolUnresolved { input: String },
}

/// Look-back window for the price change component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 5] = [
        TimeFrame::OneWeek,
        TimeFrame::OneMonth,
        TimeFrame::ThreeMonths,
        TimeFrame::SixMonths,
        TimeFrame::OneYear,
    ];

    /// Calendar days covered by the window
    pub fn days(&self) -> i64 {
        match self {
            TimeFrame::OneWeek => 7,
            TimeFrame::OneMonth => 30,
            TimeFrame::ThreeMonths => 91,
            TimeFrame::SixMonths => 182,
            TimeFrame::OneYear => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeFrame::OneWeek => "1W",
            TimeFrame::OneMonth => "1M",
            TimeFrame::ThreeMonths => "3M",
            TimeFrame::SixMonths => "6M",
            TimeFrame::OneYear => "1Y",
        }
    }

    /// Compact history (100 trading days) covers windows up to three months
    pub fn needs_full_history(&self) -> bool {
        self.days() > TimeFrame::ThreeMonths.days()
    }

    pub fn next(&self) -> TimeFrame {
        let index = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        TimeFrame::OneMonth
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1w" | "week" => Ok(TimeFrame::OneWeek),
            "1m" | "month" => Ok(TimeFrame::OneMonth),
            "3m" => Ok(TimeFrame::ThreeMonths),
            "6m" => Ok(TimeFrame::SixMonths),
            "1y" | "year" => Ok(TimeFrame::OneYear),
            other => Err(format!("unknown time frame '{}' (expected 1w, 1m, 3m, 6m or 1y)", other)),
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub alpha_vantage_api_key: String,
    pub alpha_vantage_base_url: String,
    pub rate_limit_per_minute: u32,
    pub fetch_concurrency: usize,
    pub weight_preset: WeightPreset,
    pub display_currency: String,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, map in tests)
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ALPHAVANTAGE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("ALPHAVANTAGE_API_KEY environment variable required"))?;

        let weight_preset = match lookup("ELO_WEIGHT_PRESET") {
            Some(value) => value.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            None => WeightPreset::default(),
        };

        Ok(Config {
            alpha_vantage_api_key: api_key,
            alpha_vantage_base_url: lookup("ALPHAVANTAGE_BASE_URL")
                .unwrap_or_else(|| "https://www.alphavantage.co/query".to_string()),
            rate_limit_per_minute: lookup("RATE_LIMIT_PER_MINUTE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            fetch_concurrency: lookup("FETCH_CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(1),
            weight_preset,
            display_currency: lookup("DISPLAY_CURRENCY")
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "USD".to_string()),
            http_timeout_secs: lookup("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }
}

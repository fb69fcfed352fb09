//! Technical indicators over a daily close series.
//!
//! The raw functions return `Result` so every fallback has a name;
//! [`evaluate`] turns each error into the indicator's neutral default.

use thiserror::Error;
use tracing::debug;

use crate::models::{DataIssue, Indicator, IndicatorResult, PriceSeries};

pub const NEUTRAL_RSI: f64 = 50.0;
pub const DEFAULT_MACD: f64 = 0.0;
pub const DEFAULT_SMA_DEVIATION: f64 = 0.0;

/// Lookback windows for the three indicators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub sma_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            sma_window: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IndicatorError {
    #[error("needs {required} points, series has {actual}")]
    InsufficientHistory { required: usize, actual: usize },
    #[error("average loss is zero over the lookback window")]
    ZeroLossMean,
    #[error("computation produced a non-finite value")]
    NonFinite,
}

/// Indicator values plus the issues that forced a default
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorReport {
    pub result: IndicatorResult,
    pub issues: Vec<DataIssue>,
}

fn finite(value: f64) -> Result<f64, IndicatorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(IndicatorError::NonFinite)
    }
}

fn require(closes: &[f64], required: usize) -> Result<(), IndicatorError> {
    if closes.len() < required {
        return Err(IndicatorError::InsufficientHistory {
            required,
            actual: closes.len(),
        });
    }
    Ok(())
}

/// Relative Strength Index using simple means of the last `period` gains and losses.
pub fn rsi(closes: &[f64], period: usize) -> Result<f64, IndicatorError> {
    let required = period.max(1) + 1;
    require(closes, required)?;

    let tail = &closes[closes.len() - required..];
    if tail.iter().any(|c| !c.is_finite()) {
        return Err(IndicatorError::NonFinite);
    }

    let (gains, losses) = tail.windows(2).fold((0.0, 0.0), |(gain, loss), w| {
        let delta = w[1] - w[0];
        (gain + delta.max(0.0), loss + (-delta).max(0.0))
    });
    let span = (required - 1) as f64;
    let mean_gain = finite(gains / span)?;
    let mean_loss = finite(losses / span)?;

    if mean_loss == 0.0 {
        return Err(IndicatorError::ZeroLossMean);
    }

    let rs = mean_gain / mean_loss;
    finite(100.0 - 100.0 / (1.0 + rs))
}

/// Final value of an exponential moving average seeded with the first value.
///
/// Smoothing factor `2 / (span + 1)`, no bias adjustment.
pub fn ema(values: &[f64], span: usize) -> Option<f64> {
    let (&seed, rest) = values.split_first()?;
    let alpha = 2.0 / (span as f64 + 1.0);
    Some(rest.iter().fold(seed, |prev, &v| alpha * v + (1.0 - alpha) * prev))
}

/// Fast EMA minus slow EMA at the last observation
pub fn macd(closes: &[f64], fast: usize, slow: usize) -> Result<f64, IndicatorError> {
    require(closes, slow.max(fast).max(1))?;
    if closes.iter().any(|c| !c.is_finite()) {
        return Err(IndicatorError::NonFinite);
    }

    let fast_ema = ema(closes, fast).ok_or(IndicatorError::NonFinite)?;
    let slow_ema = ema(closes, slow).ok_or(IndicatorError::NonFinite)?;
    finite(fast_ema - slow_ema)
}

/// Last close minus the simple moving average of the last `window` closes
pub fn sma_deviation(closes: &[f64], window: usize) -> Result<f64, IndicatorError> {
    let window = window.max(1);
    require(closes, window)?;

    let tail = &closes[closes.len() - window..];
    let sma = finite(tail.iter().sum::<f64>() / window as f64)?;
    let last = tail[window - 1];
    finite(last - sma)
}

fn resolve(
    indicator: Indicator,
    outcome: Result<f64, IndicatorError>,
    default: f64,
    issues: &mut Vec<DataIssue>,
) -> f64 {
    match outcome {
        Ok(value) => value,
        Err(IndicatorError::InsufficientHistory { required, actual }) => {
            debug!("{} falls back to {}: needs {} points, has {}", indicator, default, required, actual);
            issues.push(DataIssue::InsufficientHistory {
                indicator,
                required,
                actual,
            });
            default
        }
        Err(e) => {
            debug!("{} falls back to {}: {}", indicator, default, e);
            default
        }
    }
}

/// Compute all indicators with explicit windows, recording why any default was used
pub fn evaluate(series: &PriceSeries, params: &IndicatorParams) -> IndicatorReport {
    let closes = series.closes();
    let mut issues = Vec::new();

    let rsi_value = resolve(Indicator::Rsi, rsi(&closes, params.rsi_period), NEUTRAL_RSI, &mut issues);
    let macd_value = resolve(
        Indicator::Macd,
        macd(&closes, params.macd_fast, params.macd_slow),
        DEFAULT_MACD,
        &mut issues,
    );
    let sma_value = resolve(
        Indicator::Sma,
        sma_deviation(&closes, params.sma_window),
        DEFAULT_SMA_DEVIATION,
        &mut issues,
    );

    IndicatorReport {
        result: IndicatorResult {
            rsi: rsi_value,
            macd: macd_value,
            sma_deviation: sma_value,
        },
        issues,
    }
}

/// RSI(14), MACD(12, 26) and SMA-50 deviation with documented defaults
pub fn compute_indicators(series: &PriceSeries) -> IndicatorResult {
    evaluate(series, &IndicatorParams::default()).result
}

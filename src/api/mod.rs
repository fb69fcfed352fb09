use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::{FundamentalSnapshot, PriceSeries, SeriesError};

pub mod alpha_vantage_client;
pub use alpha_vantage_client::AlphaVantageClient;

/// Spaces API requests evenly across a minute
pub struct ApiRateLimiter {
    delay: Option<Duration>,
    last_request: Mutex<Option<Instant>>,
}

impl ApiRateLimiter {
    /// `0` requests per minute disables limiting
    pub fn new(requests_per_minute: u32) -> Self {
        let delay = if requests_per_minute > 0 {
            Some(Duration::from_millis(60_000 / requests_per_minute as u64))
        } else {
            None
        };

        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Wait until the next request slot is free
    pub async fn wait(&self) {
        let Some(delay) = self.delay else {
            return;
        };

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + delay;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// History length to request from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSize {
    Compact, // 100 days
    Full,    // 20+ years
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Transport and payload failures from a market data provider
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),
    #[error("rate limit reached: {0}")]
    RateLimited(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("no data for {0}")]
    NotFound(String),
    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    pub fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

impl From<SeriesError> for FetchError {
    fn from(e: SeriesError) -> Self {
        FetchError::parse("price series", e)
    }
}

/// Source of prices, fundamentals and symbol lookups
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn daily_series(&self, symbol: &str, size: OutputSize) -> Result<PriceSeries, FetchError>;

    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, FetchError>;

    /// Best ticker match for free text, `None` when nothing matches
    async fn search_symbol(&self, query: &str) -> Result<Option<String>, FetchError>;

    /// Units of `to` per unit of `from`
    async fn exchange_rate(&self, from: &str, to: &str) -> Result<f64, FetchError>;
}

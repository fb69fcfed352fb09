use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{ApiRateLimiter, FetchError, MarketDataProvider, OutputSize};
use crate::models::{Config, FundamentalSnapshot, PricePoint, PriceSeries};

/// Alpha Vantage company overview (only the fields the rating uses)
#[derive(Debug, Deserialize)]
pub struct OverviewResponse {
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    pub return_on_equity_ttm: Option<String>,
    #[serde(rename = "EPS")]
    pub eps: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_capitalization: Option<String>,
}

/// Alpha Vantage daily data structures
#[derive(Debug, Deserialize)]
pub struct AlphaVantageDailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: HashMap<String, DailyPriceData>,
}

#[derive(Debug, Deserialize)]
pub struct DailyPriceData {
    #[serde(rename = "4. close")]
    pub close: String,
}

#[derive(Debug, Deserialize)]
pub struct SymbolSearchResponse {
    #[serde(rename = "bestMatches", default)]
    pub best_matches: Vec<SymbolMatch>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    pub symbol: String,
    #[serde(rename = "2. name")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    pub rate: ExchangeRateData,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRateData {
    #[serde(rename = "5. Exchange Rate")]
    pub exchange_rate: String,
}

/// Numeric Alpha Vantage field; "None", "-" and blanks mean not reported
fn parse_number(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw == "None" || raw == "-" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Alpha Vantage reports throttling and bad requests inside a 200 body
fn check_api_messages(body: &Value) -> Result<(), FetchError> {
    if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
        return Err(FetchError::Api(message.to_string()));
    }
    for key in ["Note", "Information"] {
        if let Some(message) = body.get(key).and_then(Value::as_str) {
            return Err(FetchError::RateLimited(message.to_string()));
        }
    }
    Ok(())
}

/// OVERVIEW body to fundamentals. ROE arrives as a fraction, market cap in dollars.
pub fn parse_overview(symbol: &str, body: Value) -> Result<FundamentalSnapshot, FetchError> {
    let overview: OverviewResponse =
        serde_json::from_value(body).map_err(|e| FetchError::parse("company overview", e))?;

    if overview.symbol.is_none() {
        return Err(FetchError::NotFound(symbol.to_string()));
    }

    Ok(FundamentalSnapshot {
        pe_ratio: parse_number(overview.pe_ratio.as_deref()),
        roe_percent: parse_number(overview.return_on_equity_ttm.as_deref()).map(|roe| roe * 100.0),
        eps: parse_number(overview.eps.as_deref()),
        market_cap_billions: parse_number(overview.market_capitalization.as_deref()).map(|cap| cap / 1e9),
    })
}

/// TIME_SERIES_DAILY body to an ascending close series
pub fn parse_daily_series(symbol: &str, body: Value) -> Result<PriceSeries, FetchError> {
    if body.get("Time Series (Daily)").is_none() {
        return Err(FetchError::NotFound(symbol.to_string()));
    }
    let daily: AlphaVantageDailyResponse =
        serde_json::from_value(body).map_err(|e| FetchError::parse("daily time series", e))?;

    let mut points = Vec::with_capacity(daily.time_series.len());
    for (date_str, price_data) in &daily.time_series {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| FetchError::parse(format!("date '{}'", date_str), e))?;
        let close = price_data
            .close
            .trim()
            .parse::<f64>()
            .map_err(|e| FetchError::parse(format!("close price '{}'", price_data.close), e))?;
        points.push(PricePoint::new(date, close));
    }

    Ok(PriceSeries::from_unsorted(points)?)
}

/// Top SYMBOL_SEARCH match, if any
pub fn parse_symbol_search(body: Value) -> Result<Option<SymbolMatch>, FetchError> {
    let search: SymbolSearchResponse =
        serde_json::from_value(body).map_err(|e| FetchError::parse("symbol search", e))?;
    Ok(search.best_matches.into_iter().next())
}

pub fn parse_exchange_rate(body: Value) -> Result<f64, FetchError> {
    let response: ExchangeRateResponse =
        serde_json::from_value(body).map_err(|e| FetchError::parse("exchange rate", e))?;
    parse_number(Some(response.rate.exchange_rate.as_str()))
        .filter(|rate| *rate > 0.0)
        .ok_or_else(|| FetchError::parse("exchange rate", format!("'{}' is not a positive number", response.rate.exchange_rate)))
}

/// Alpha Vantage API client
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: ApiRateLimiter,
}

impl AlphaVantageClient {
    /// Create a client from configuration; the API key is held for the client's lifetime
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent("stock-elo/0.1")
            .build()?;

        Ok(Self {
            client,
            api_key: config.alpha_vantage_api_key.clone(),
            base_url: config.alpha_vantage_base_url.clone(),
            rate_limiter: ApiRateLimiter::new(config.rate_limit_per_minute),
        })
    }

    fn query_url(&self, function: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
        pairs.push(("function", function));
        pairs.extend_from_slice(params);
        pairs.push(("apikey", self.api_key.as_str()));
        Ok(Url::parse_with_params(&self.base_url, &pairs)?)
    }

    async fn get_json(&self, function: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = self.query_url(function, params)?;
        self.rate_limiter.wait().await;

        // never log `url`, it carries the API key
        debug!("Fetching {} from Alpha Vantage: {:?}", function, params);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        check_api_messages(&body)?;
        Ok(body)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for AlphaVantageClient {
    async fn daily_series(&self, symbol: &str, size: OutputSize) -> Result<PriceSeries, FetchError> {
        let body = self
            .get_json("TIME_SERIES_DAILY", &[("symbol", symbol), ("outputsize", size.as_str())])
            .await?;
        let series = parse_daily_series(symbol, body)?;
        info!("📈 {}: {} daily closes", symbol, series.len());
        Ok(series)
    }

    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, FetchError> {
        let body = self.get_json("OVERVIEW", &[("symbol", symbol)]).await?;
        let snapshot = parse_overview(symbol, body)?;
        info!("📋 {}: fundamentals loaded", symbol);
        Ok(snapshot)
    }

    async fn search_symbol(&self, query: &str) -> Result<Option<String>, FetchError> {
        let body = self.get_json("SYMBOL_SEARCH", &[("keywords", query)]).await?;
        let best = parse_symbol_search(body)?;
        if let Some(found) = &best {
            info!(
                "🔍 '{}' resolved to {} ({})",
                query,
                found.symbol,
                found.name.as_deref().unwrap_or("unknown name")
            );
        }
        Ok(best.map(|m| m.symbol))
    }

    async fn exchange_rate(&self, from: &str, to: &str) -> Result<f64, FetchError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(1.0);
        }
        let body = self
            .get_json("CURRENCY_EXCHANGE_RATE", &[("from_currency", from), ("to_currency", to)])
            .await?;
        parse_exchange_rate(body)
    }
}

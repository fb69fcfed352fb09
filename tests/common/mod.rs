//! Common test utilities and helpers

use async_trait::async_trait;
use mockall::mock;

use stock_elo::api::{FetchError, MarketDataProvider, OutputSize};
use stock_elo::models::{FundamentalSnapshot, PriceSeries};

mock! {
    pub Provider {}

    #[async_trait]
    impl MarketDataProvider for Provider {
        async fn daily_series(&self, symbol: &str, size: OutputSize) -> Result<PriceSeries, FetchError>;
        async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot, FetchError>;
        async fn search_symbol(&self, query: &str) -> Result<Option<String>, FetchError>;
        async fn exchange_rate(&self, from: &str, to: &str) -> Result<f64, FetchError>;
    }
}

/// Price series and fundamentals used across tests
pub mod fixtures {
    use chrono::NaiveDate;
    use stock_elo::models::{FundamentalSnapshot, PriceSeries};

    pub fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    /// Closes 100, 101, 102, ... on consecutive days
    pub fn rising_series(len: usize) -> PriceSeries {
        let closes: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
        PriceSeries::from_closes(start_date(), &closes)
    }

    /// Closes falling by one per day from 200
    pub fn falling_series(len: usize) -> PriceSeries {
        let closes: Vec<f64> = (0..len).map(|i| 200.0 - i as f64).collect();
        PriceSeries::from_closes(start_date(), &closes)
    }

    /// Deterministic up/down walk with a slight upward drift
    pub fn choppy_closes(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let wave = ((i * 7) % 11) as f64 - 5.0;
                100.0 + i as f64 * 0.25 + wave
            })
            .collect()
    }

    pub fn blue_chip_fundamentals() -> FundamentalSnapshot {
        FundamentalSnapshot::new(15.0, 20.0, 5.0, 50.0)
    }
}

/// Logging utilities for tests
pub mod logging {
    use tracing::{debug, info};

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}

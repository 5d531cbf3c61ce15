use async_trait::async_trait;

use crate::{Candle, Result};

/// Read-only access to market data.
///
/// `BinanceMarketData` implements this against the public REST API;
/// `PaperMarket` implements it with scripted data for tests.
///
/// Implementations retry transient failures internally and must be safe to
/// call concurrently from the scanner and the trade monitor.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch the most recent `limit` candles for `pair`, oldest first.
    /// The last candle may still be forming.
    async fn fetch_candles(&self, pair: &str, timeframe: &str, limit: usize)
        -> Result<Vec<Candle>>;

    /// Latest traded price, or `None` when it could not be obtained.
    async fn last_price(&self, pair: &str) -> Option<f64>;
}

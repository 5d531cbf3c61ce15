use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use common::{Candle, Error, MarketData, Result};

/// Scripted market data source.
#[derive(Default)]
pub struct PaperMarket {
    /// Candle series per pair, returned as-is (truncated to `limit`).
    candles: RwLock<HashMap<String, Vec<Candle>>>,
    /// Latest price per pair, updated via `set_price`.
    prices: RwLock<HashMap<String, f64>>,
    /// Pairs whose candle fetches fail.
    failing: RwLock<HashSet<String>>,
}

impl PaperMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_candles(&self, pair: &str, candles: Vec<Candle>) {
        self.candles.write().await.insert(pair.to_string(), candles);
    }

    pub async fn set_price(&self, pair: &str, price: f64) {
        self.prices.write().await.insert(pair.to_string(), price);
    }

    pub async fn clear_price(&self, pair: &str) {
        self.prices.write().await.remove(pair);
    }

    /// Make every candle fetch for `pair` fail as if retries were exhausted.
    pub async fn fail_candles(&self, pair: &str) {
        self.failing.write().await.insert(pair.to_string());
    }
}

#[async_trait]
impl MarketData for PaperMarket {
    async fn fetch_candles(&self, pair: &str, timeframe: &str, limit: usize) -> Result<Vec<Candle>> {
        if self.failing.read().await.contains(pair) {
            return Err(Error::FetchExhausted {
                what: format!("candles {pair} {timeframe}"),
                attempts: 3,
                last_error: "scripted failure".into(),
            });
        }
        let candles = self.candles.read().await.get(pair).cloned().unwrap_or_default();
        let start = candles.len().saturating_sub(limit);
        debug!(pair, timeframe, count = candles.len() - start, "Paper candles served");
        Ok(candles[start..].to_vec())
    }

    async fn last_price(&self, pair: &str) -> Option<f64> {
        self.prices.read().await.get(pair).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle(close: f64) -> Candle {
        Candle {
            open_time: Utc::now(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[tokio::test]
    async fn serves_most_recent_candles_up_to_limit() {
        let market = PaperMarket::new();
        market
            .set_candles("BTC/USDT", (0..10).map(|i| candle(i as f64)).collect())
            .await;

        let got = market.fetch_candles("BTC/USDT", "15m", 3).await.unwrap();
        let closes: Vec<f64> = got.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![7.0, 8.0, 9.0]);
    }

    #[tokio::test]
    async fn unknown_pair_has_no_candles_and_no_price() {
        let market = PaperMarket::new();
        assert!(market.fetch_candles("X/USDT", "15m", 5).await.unwrap().is_empty());
        assert!(market.last_price("X/USDT").await.is_none());
    }

    #[tokio::test]
    async fn scripted_failure_is_a_fetch_error() {
        let market = PaperMarket::new();
        market.fail_candles("ETH/USDT").await;
        let err = market.fetch_candles("ETH/USDT", "15m", 5).await.unwrap_err();
        assert!(matches!(err, Error::FetchExhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn price_can_be_set_and_cleared() {
        let market = PaperMarket::new();
        market.set_price("SOL/USDT", 150.0).await;
        assert_eq!(market.last_price("SOL/USDT").await, Some(150.0));
        market.clear_price("SOL/USDT").await;
        assert_eq!(market.last_price("SOL/USDT").await, None);
    }
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use common::{Candle, Error, MarketData, Result};

use crate::retry::{retry, RetryPolicy};

const BASE_URL: &str = "https://api.binance.com";

/// Binance rejects kline requests above this limit.
const MAX_KLINES: usize = 1000;

/// Public (unsigned) Binance REST endpoints used for candles and prices.
pub struct BinanceMarketData {
    http: Client,
    base_url: String,
    candle_retry: RetryPolicy,
    price_retry: RetryPolicy,
}

impl BinanceMarketData {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            candle_retry: RetryPolicy::CANDLES,
            price_retry: RetryPolicy::PRICE,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, candles: RetryPolicy, price: RetryPolicy) -> Self {
        self.candle_retry = candles;
        self.price_retry = price;
        self
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    async fn klines_once(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let body = self
            .get(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        parse_klines(&body)
    }

    async fn ticker_once(&self, symbol: &str) -> Result<f64> {
        let body = self
            .get("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await?;
        let ticker: PriceTicker = serde_json::from_str(&body)?;
        ticker
            .price
            .parse::<f64>()
            .map_err(|e| Error::Exchange(format!("bad ticker price '{}': {e}", ticker.price)))
    }
}

#[async_trait]
impl MarketData for BinanceMarketData {
    async fn fetch_candles(&self, pair: &str, timeframe: &str, limit: usize) -> Result<Vec<Candle>> {
        let symbol = symbol_for(pair);
        let limit = limit.clamp(1, MAX_KLINES);
        let what = format!("klines {symbol} {timeframe}");

        let candles = retry(&self.candle_retry, &what, || {
            self.klines_once(&symbol, timeframe, limit)
        })
        .await?;

        debug!(pair, timeframe, count = candles.len(), "Fetched candles");
        Ok(candles)
    }

    async fn last_price(&self, pair: &str) -> Option<f64> {
        let symbol = symbol_for(pair);
        let what = format!("ticker {symbol}");

        match retry(&self.price_retry, &what, || self.ticker_once(&symbol)).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(pair, error = %e, "Price unavailable");
                None
            }
        }
    }
}

/// Exchange symbol for a pair written as `BASE/QUOTE`, e.g. `BTC/USDT` → `BTCUSDT`.
pub fn symbol_for(pair: &str) -> String {
    pair.chars()
        .filter(|c| *c != '/')
        .collect::<String>()
        .to_uppercase()
}

// ─── Kline JSON parsing ───────────────────────────────────────────────────────

/// Parse the `/api/v3/klines` payload: an array of rows
/// `[openTime, "open", "high", "low", "close", "volume", closeTime, …]`.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    rows.iter()
        .map(|row| {
            if row.len() < 6 {
                return Err(Error::Exchange(format!(
                    "kline row has {} fields, expected at least 6",
                    row.len()
                )));
            }
            let open_ms = row[0]
                .as_i64()
                .ok_or_else(|| Error::Exchange(format!("bad kline open time: {}", row[0])))?;
            Ok(Candle {
                open_time: millis_to_utc(open_ms)?,
                open: number(&row[1])?,
                high: number(&row[2])?,
                low: number(&row[3])?,
                close: number(&row[4])?,
                volume: number(&row[5])?,
            })
        })
        .collect()
}

/// Binance sends prices as strings; accept plain numbers too.
fn number(v: &Value) -> Result<f64> {
    match v {
        Value::String(s) => s
            .parse()
            .map_err(|e| Error::Exchange(format!("bad kline number '{s}': {e}"))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Exchange(format!("bad kline number {n}"))),
        other => Err(Error::Exchange(format!("bad kline field {other}"))),
    }
}

fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| Error::Exchange(format!("kline timestamp out of range: {ms}")))
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PriceTicker {
    price: String,
}

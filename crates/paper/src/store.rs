use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use common::{Direction, Error, Exit, Result, Trade, TradeStatus, TradeStore};

/// Trade store kept entirely in memory.
///
/// Ids start at 1 and increase, like the SQLite table. Failures can be
/// injected to exercise the callers' error isolation.
#[derive(Default)]
pub struct MemoryTradeStore {
    trades: RwLock<Vec<Trade>>,
    fail_inserts: AtomicBool,
    fail_listing: AtomicBool,
    fail_close_ids: RwLock<HashSet<i64>>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a trade directly, bypassing `insert_open`. The id is assigned.
    pub async fn seed(&self, mut trade: Trade) -> i64 {
        let mut trades = self.trades.write().await;
        trade.id = trades.len() as i64 + 1;
        let id = trade.id;
        trades.push(trade);
        id
    }

    pub async fn get(&self, id: i64) -> Option<Trade> {
        self.trades.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn all(&self) -> Vec<Trade> {
        self.trades.read().await.clone()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub async fn fail_close_for(&self, id: i64) {
        self.fail_close_ids.write().await.insert(id);
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn insert_open(
        &self,
        pair: &str,
        direction: Direction,
        entry: f64,
        sl: f64,
        tp: f64,
    ) -> Result<i64> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(Error::Other("scripted insert failure".into()));
        }
        let trade = Trade {
            id: 0,
            pair: pair.to_string(),
            direction,
            entry,
            sl,
            tp,
            status: TradeStatus::Open,
            pnl: 0.0,
            created_at: Utc::now(),
            closed_at: None,
        };
        Ok(self.seed(trade).await)
    }

    async fn close_by_id(&self, id: i64, exit: Exit, pnl: f64) -> Result<bool> {
        if self.fail_close_ids.read().await.contains(&id) {
            return Err(Error::Other(format!("scripted close failure for trade {id}")));
        }
        let mut trades = self.trades.write().await;
        match trades.iter_mut().find(|t| t.id == id && t.is_open()) {
            Some(trade) => {
                trade.status = exit.into();
                trade.pnl = pnl;
                trade.closed_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_open(&self) -> Result<Vec<Trade>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Error::Other("scripted listing failure".into()));
        }
        Ok(self
            .trades
            .read()
            .await
            .iter()
            .filter(|t| t.is_open())
            .cloned()
            .collect())
    }

    async fn list_today(&self) -> Result<Vec<Trade>> {
        let today = Utc::now().date_naive();
        let mut trades: Vec<Trade> = self
            .trades
            .read()
            .await
            .iter()
            .filter(|t| t.created_at.date_naive() == today)
            .cloned()
            .collect();
        trades.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(trades)
    }
}

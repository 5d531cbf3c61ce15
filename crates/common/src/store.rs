use async_trait::async_trait;

use crate::{Direction, Exit, Result, Trade};

/// Durable record of hypothetical trades.
///
/// Every method is a single atomic operation; no transaction spans calls.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Record a new OPEN trade and return its id.
    async fn insert_open(
        &self,
        pair: &str,
        direction: Direction,
        entry: f64,
        sl: f64,
        tp: f64,
    ) -> Result<i64>;

    /// Close an OPEN trade. Returns `false` when the trade was not OPEN
    /// (already closed, or unknown), in which case nothing changes.
    async fn close_by_id(&self, id: i64, exit: Exit, pnl: f64) -> Result<bool>;

    async fn list_open(&self) -> Result<Vec<Trade>>;

    /// Trades created during the current UTC calendar day, newest first.
    async fn list_today(&self) -> Result<Vec<Trade>>;
}

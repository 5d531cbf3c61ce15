use async_trait::async_trait;

use crate::{Result, Signal, Trade, TradeStatus};

/// Outbound notification channel.
///
/// Delivery is best-effort: callers log a returned error and carry on.
/// A failed notification never undoes the store write it reports on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_signal(&self, signal: &Signal) -> Result<()>;

    async fn send_close(&self, trade: &Trade, status: TradeStatus, pnl: f64) -> Result<()>;
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use common::{Exit, MarketData, Notifier, Result, Trade, TradeStatus, TradeStore};

use crate::rules::evaluate_exit;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Counters for one polling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// OPEN trades priced and evaluated.
    pub checked: usize,
    /// Trades this pass moved to TP or SL.
    pub closed: usize,
    /// Trades skipped because no price was available.
    pub skipped: usize,
    /// Trades whose processing failed (logged, retried next pass).
    pub failed: usize,
}

/// Watches OPEN trades and closes them when the take-profit or stop-loss
/// level is reached.
///
/// The trade store is the only owner of trade state; the monitor works on
/// the transient copies returned by `list_open` for a single pass.
pub struct TradeMonitor {
    store: Arc<dyn TradeStore>,
    market: Arc<dyn MarketData>,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
}

impl TradeMonitor {
    pub fn new(
        store: Arc<dyn TradeStore>,
        market: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            market,
            notifier,
            poll_interval,
        }
    }

    /// Run the polling loop until `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.poll_interval, "Trade monitor started (TP/SL watcher)");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.poll_once().await;
            if report.closed > 0 || report.failed > 0 {
                info!(?report, "Monitor pass finished");
            } else {
                debug!(?report, "Monitor pass finished");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!("Shutdown channel dropped, trade monitor exiting");
                        break;
                    }
                }
            }
        }
        info!("Trade monitor stopped");
    }

    /// Evaluate every OPEN trade once.
    ///
    /// Failures are isolated per trade: one bad trade never stops the others
    /// from being checked in the same pass.
    pub async fn poll_once(&self) -> PollReport {
        let mut report = PollReport::default();

        let open = match self.store.list_open().await {
            Ok(trades) => trades,
            Err(e) => {
                error!(error = %e, "Failed to list open trades");
                return report;
            }
        };

        for trade in &open {
            let Some(price) = self.market.last_price(&trade.pair).await else {
                debug!(pair = %trade.pair, id = trade.id, "No price available, skipping trade this pass");
                report.skipped += 1;
                continue;
            };
            report.checked += 1;

            match self.process_trade(trade, price).await {
                Ok(true) => report.closed += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(pair = %trade.pair, id = trade.id, error = %e, "Failed to process open trade");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Apply the exit rules to one trade at `price`. Returns `true` when this
    /// call closed the trade.
    async fn process_trade(&self, trade: &Trade, price: f64) -> Result<bool> {
        let Some((exit, pnl)) = evaluate_exit(trade, price) else {
            return Ok(false);
        };

        if !self.store.close_by_id(trade.id, exit, pnl).await? {
            debug!(id = trade.id, "Trade already closed elsewhere, not notifying");
            return Ok(false);
        }

        let status = TradeStatus::from(exit);
        match exit {
            Exit::TakeProfit => {
                info!(pair = %trade.pair, id = trade.id, price, pnl, "Take-profit hit, trade closed")
            }
            Exit::StopLoss => {
                info!(pair = %trade.pair, id = trade.id, price, pnl, "Stop-loss hit, trade closed")
            }
        }

        // The close is already recorded; a failed notification does not undo it.
        if let Err(e) = self.notifier.send_close(trade, status, pnl).await {
            warn!(pair = %trade.pair, id = trade.id, error = %e, "Close notification failed");
        }
        Ok(true)
    }
}

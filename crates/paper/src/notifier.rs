use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use common::{Error, Notifier, Result, Signal, Trade, TradeStatus};

/// A close notification as it was handed to the notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedClose {
    pub trade_id: i64,
    pub pair: String,
    pub status: TradeStatus,
    pub pnl: f64,
}

/// Notifier that records every event instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    signals: Mutex<Vec<Signal>>,
    closes: Mutex<Vec<RecordedClose>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every send records the event and then reports failure.
    pub fn fail_sends(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub async fn signals(&self) -> Vec<Signal> {
        self.signals.lock().await.clone()
    }

    pub async fn closes(&self) -> Vec<RecordedClose> {
        self.closes.lock().await.clone()
    }

    fn outcome(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(Error::Notify("scripted delivery failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_signal(&self, signal: &Signal) -> Result<()> {
        debug!(pair = %signal.pair, direction = %signal.direction, "Recording signal");
        self.signals.lock().await.push(signal.clone());
        self.outcome()
    }

    async fn send_close(&self, trade: &Trade, status: TradeStatus, pnl: f64) -> Result<()> {
        debug!(pair = %trade.pair, %status, pnl, "Recording close");
        self.closes.lock().await.push(RecordedClose {
            trade_id: trade.id,
            pair: trade.pair.clone(),
            status,
            pnl,
        });
        self.outcome()
    }
}

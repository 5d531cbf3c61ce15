use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use common::{ActiveWindow, Error, MarketData, Notifier, Result, Signal, TradeStore};
use strategy::SignalDetector;

/// What asked for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTrigger {
    /// The scan scheduler's periodic tick.
    Scheduled,
    /// `/forcescan`: honors the active window.
    Manual,
    /// `/forcescan override`: ignores the active window.
    Override,
}

impl ScanTrigger {
    fn honors_window(self) -> bool {
        !matches!(self, ScanTrigger::Override)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every pair was visited; `signals` were emitted by this call.
    Completed { signals: usize },
    /// Outside the active window, nothing was fetched.
    Skipped,
    /// Another scan was already running.
    Busy,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub pairs: Vec<String>,
    pub timeframe: String,
    pub max_bars: usize,
}

/// Runs the signal detector over every configured pair.
///
/// A signal is announced first and then recorded as an OPEN trade. Each pair
/// is handled on its own: a fetch, notify or store failure is logged and the
/// scan moves on to the next pair.
pub struct Scanner {
    config: ScannerConfig,
    window: ActiveWindow,
    market: Arc<dyn MarketData>,
    detector: Arc<dyn SignalDetector>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn TradeStore>,
    scan_lock: Mutex<()>,
}

impl Scanner {
    pub fn new(
        config: ScannerConfig,
        window: ActiveWindow,
        market: Arc<dyn MarketData>,
        detector: Arc<dyn SignalDetector>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn TradeStore>,
    ) -> Self {
        Self {
            config,
            window,
            market,
            detector,
            notifier,
            store,
            scan_lock: Mutex::new(()),
        }
    }

    pub fn window(&self) -> &ActiveWindow {
        &self.window
    }

    pub async fn scan(&self, trigger: ScanTrigger) -> ScanOutcome {
        self.scan_at(trigger, Utc::now()).await
    }

    /// Like [`Scanner::scan`], with the window checked against `now`.
    pub async fn scan_at(&self, trigger: ScanTrigger, now: DateTime<Utc>) -> ScanOutcome {
        if trigger.honors_window() && !self.window.is_active_at(now) {
            info!(?trigger, window = %self.window, "Outside active window, scan skipped");
            return ScanOutcome::Skipped;
        }

        let _guard = match trigger {
            ScanTrigger::Scheduled => self.scan_lock.lock().await,
            ScanTrigger::Manual | ScanTrigger::Override => match self.scan_lock.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    info!(?trigger, "Scan already in progress");
                    return ScanOutcome::Busy;
                }
            },
        };

        info!(
            ?trigger,
            pairs = self.config.pairs.len(),
            detector = self.detector.name(),
            "Scan started"
        );

        let mut signals = 0;
        for pair in &self.config.pairs {
            match self.scan_pair(pair).await {
                Ok(Some(signal)) => {
                    self.announce_and_record(&signal).await;
                    signals += 1;
                }
                Ok(None) => debug!(pair = %pair, "No signal"),
                Err(e) => warn!(pair = %pair, error = %e, "Pair skipped"),
            }
        }

        info!(?trigger, signals, "Scan finished");
        ScanOutcome::Completed { signals }
    }

    async fn scan_pair(&self, pair: &str) -> Result<Option<Signal>> {
        let candles = self
            .market
            .fetch_candles(pair, &self.config.timeframe, self.config.max_bars)
            .await?;
        catch_unwind(AssertUnwindSafe(|| self.detector.detect(pair, &candles)))
            .map_err(|panic| Error::Detector(panic_message(panic.as_ref())))
    }

    async fn announce_and_record(&self, signal: &Signal) {
        info!(
            pair = %signal.pair,
            direction = %signal.direction,
            entry = signal.entry,
            sl = signal.stop_loss,
            tp = signal.take_profit,
            "Signal"
        );

        if let Err(e) = self.notifier.send_signal(signal).await {
            warn!(pair = %signal.pair, error = %e, "Signal notification failed");
        }

        match self
            .store
            .insert_open(
                &signal.pair,
                signal.direction,
                signal.entry,
                signal.stop_loss,
                signal.take_profit,
            )
            .await
        {
            Ok(id) => info!(id, pair = %signal.pair, "Trade opened"),
            Err(e) => error!(pair = %signal.pair, error = %e, "Failed to record trade"),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "detector panicked".to_string()
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::scanner::{ScanOutcome, ScanTrigger, Scanner};

/// How often a closed window is re-checked.
pub const IDLE_RECHECK: Duration = Duration::from_secs(30);

/// Drives scheduled scans: one scan per `interval` while the active window
/// is open, a short re-check while it is closed.
pub struct ScanScheduler {
    scanner: Arc<Scanner>,
    interval: Duration,
    idle_recheck: Duration,
}

impl ScanScheduler {
    pub fn new(scanner: Arc<Scanner>, interval: Duration) -> Self {
        Self {
            scanner,
            interval,
            idle_recheck: IDLE_RECHECK,
        }
    }

    pub fn with_idle_recheck(mut self, idle_recheck: Duration) -> Self {
        self.idle_recheck = idle_recheck;
        self
    }

    /// Pause before the next tick given the last outcome.
    fn pause_after(&self, outcome: ScanOutcome) -> Duration {
        match outcome {
            ScanOutcome::Skipped => self.idle_recheck.min(self.interval),
            ScanOutcome::Completed { .. } | ScanOutcome::Busy => self.interval,
        }
    }

    /// Run until `shutdown` flips to `true`. The first scan runs immediately.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval = ?self.interval,
            window = %self.scanner.window(),
            "Scan scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = self.scanner.scan(ScanTrigger::Scheduled).await;
            let pause = self.pause_after(outcome);
            debug!(?outcome, next_in = ?pause, "Scheduled tick done");

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!("Shutdown channel dropped, scan scheduler exiting");
                        break;
                    }
                }
            }
        }
        info!("Scan scheduler stopped");
    }
}

pub mod config;
pub mod detector;
pub mod indicators;

pub use config::StrategyParams;
pub use detector::BreakoutDetector;
pub use indicators::{IndicatorFrame, IndicatorRow};

use common::{Candle, Signal};

/// All signal detectors must satisfy this trait.
pub trait SignalDetector: Send + Sync {
    /// Human-readable name of this detector.
    fn name(&self) -> &str;

    /// Evaluate a candle series for `pair` (oldest first, last candle possibly
    /// still forming) and optionally emit an entry signal.
    ///
    /// Returns `None` when there is no signal or not enough history.
    fn detect(&self, pair: &str, candles: &[Candle]) -> Option<Signal>;
}

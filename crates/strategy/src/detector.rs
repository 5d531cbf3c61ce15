use tracing::debug;

use common::{Candle, Direction, Result, Signal};

use crate::config::StrategyParams;
use crate::indicators::IndicatorFrame;
use crate::SignalDetector;

pub const LONG_REASON: &str = "EMA trend + RSI + ATR breakout + vol";
pub const SHORT_REASON: &str = "EMA trend down + RSI + ATR breakdown + vol";

/// EMA-trend + RSI-momentum + ATR-breakout detector with a volume filter.
///
/// Decisions are taken on the last *closed* candle (second to last in the
/// series) against the candle before it. The newest candle may still be
/// forming and is ignored so a signal cannot repaint.
#[derive(Debug, Clone)]
pub struct BreakoutDetector {
    params: StrategyParams,
}

impl BreakoutDetector {
    /// Rejects parameters that `StrategyParams::validate` refuses, such as a
    /// zero indicator length.
    pub fn new(params: StrategyParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Apply the entry rules to an already computed frame.
    pub fn evaluate(&self, pair: &str, frame: &IndicatorFrame<'_>) -> Option<Signal> {
        let n = frame.len();
        if n < 3 {
            return None;
        }
        let last = frame.candle(n - 2)?;
        let prev = frame.candle(n - 3)?;
        let row = frame.row(n - 2)?;

        let (Some(ema_fast), Some(ema_slow), Some(rsi), Some(atr), Some(vol_sma)) =
            (row.ema_fast, row.ema_slow, row.rsi, row.atr, row.vol_sma)
        else {
            debug!(pair, "Indicators still warming up, no signal");
            return None;
        };

        let p = &self.params;
        let vol_ok = last.volume > vol_sma * p.vol_mult;
        let long_break = prev.high + p.atr_break_k * atr;
        let short_break = prev.low - p.atr_break_k * atr;

        let direction = if ema_fast > ema_slow
            && rsi >= p.rsi_long
            && last.close > long_break
            && vol_ok
        {
            Direction::Long
        } else if ema_fast < ema_slow
            && rsi <= p.rsi_short
            && last.close < short_break
            && vol_ok
        {
            Direction::Short
        } else {
            return None;
        };

        let entry = last.close;
        let (stop_loss, take_profit, reason) = match direction {
            Direction::Long => (entry - p.sl_mult * atr, entry + p.tp_mult * atr, LONG_REASON),
            Direction::Short => (entry + p.sl_mult * atr, entry - p.tp_mult * atr, SHORT_REASON),
        };

        debug!(pair, %direction, entry, atr, rsi, "Breakout conditions met");
        Some(Signal {
            pair: pair.to_string(),
            direction,
            entry,
            stop_loss,
            take_profit,
            confidence: p.confidence,
            reason: reason.to_string(),
        })
    }
}

impl Default for BreakoutDetector {
    fn default() -> Self {
        Self {
            params: StrategyParams::default(),
        }
    }
}

impl SignalDetector for BreakoutDetector {
    fn name(&self) -> &str {
        "breakout"
    }

    fn detect(&self, pair: &str, candles: &[Candle]) -> Option<Signal> {
        if candles.len() < 3 {
            return None;
        }
        let frame = IndicatorFrame::compute(candles, &self.params);
        self.evaluate(pair, &frame)
    }
}

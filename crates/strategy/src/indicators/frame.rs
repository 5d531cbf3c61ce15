use common::Candle;

use super::{atr, ema, rsi, volume_sma};
use crate::config::StrategyParams;

/// Indicator values derived for one candle. `None` marks a value that is
/// undefined at that index (warm-up, or a non-finite result).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorRow {
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub vol_sma: Option<f64>,
}

impl IndicatorRow {
    /// True when every indicator the detector needs is defined.
    pub fn is_complete(&self) -> bool {
        self.ema_fast.is_some()
            && self.ema_slow.is_some()
            && self.rsi.is_some()
            && self.atr.is_some()
            && self.vol_sma.is_some()
    }
}

/// A candle series with its per-candle indicators.
///
/// Row `i` depends only on `candles[..=i]`.
#[derive(Debug, Clone)]
pub struct IndicatorFrame<'a> {
    candles: &'a [Candle],
    rows: Vec<IndicatorRow>,
}

impl<'a> IndicatorFrame<'a> {
    pub fn compute(candles: &'a [Candle], params: &StrategyParams) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        let ema_fast = ema(&closes, params.ema_fast);
        let ema_slow = ema(&closes, params.ema_slow);
        let rsi = rsi(&closes, params.rsi_len);
        let atr = atr(candles, params.atr_len);
        let vol_sma = volume_sma(&volumes, params.vol_sma);

        let rows = (0..candles.len())
            .map(|i| IndicatorRow {
                ema_fast: finite(ema_fast[i]),
                ema_slow: finite(ema_slow[i]),
                rsi: finite(rsi[i]),
                atr: finite(atr[i]),
                vol_sma: vol_sma[i].and_then(finite),
            })
            .collect();

        Self { candles, rows }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candle(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn row(&self, index: usize) -> Option<&IndicatorRow> {
        self.rows.get(index)
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(n: usize) -> Vec<Candle> {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Candle {
                    open_time: t0 + Duration::minutes(15 * i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10.0 + i as f64,
                }
            })
            .collect()
    }

    #[test]
    fn volume_average_is_undefined_during_warm_up() {
        let candles = series(25);
        let frame = IndicatorFrame::compute(&candles, &StrategyParams::default());
        assert!(!frame.row(18).unwrap().is_complete());
        assert!(frame.row(19).unwrap().is_complete());
    }

    #[test]
    fn rows_never_look_ahead() {
        let candles = series(60);
        let params = StrategyParams::default();
        let full = IndicatorFrame::compute(&candles, &params);
        let prefix = IndicatorFrame::compute(&candles[..40], &params);
        for i in 0..40 {
            assert_eq!(full.row(i), prefix.row(i), "row {i} changed with later data");
        }
    }

    #[test]
    fn non_finite_input_marks_row_undefined() {
        let mut candles = series(30);
        candles[29].close = f64::NAN;
        let frame = IndicatorFrame::compute(&candles, &StrategyParams::default());
        let row = frame.row(29).unwrap();
        assert!(row.ema_fast.is_none());
        assert!(!row.is_complete());
    }
}

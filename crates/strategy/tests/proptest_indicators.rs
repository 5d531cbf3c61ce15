use chrono::{Duration, TimeZone, Utc};
use common::{Candle, Direction};
use proptest::prelude::*;
use strategy::indicators::{ema, rsi};
use strategy::{BreakoutDetector, IndicatorFrame, SignalDetector, StrategyParams};

fn build_candles(raw: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    raw.iter()
        .enumerate()
        .map(|(i, &(close, open_off, wick, volume))| {
            let open = close + open_off;
            Candle {
                open_time: t0 + Duration::minutes(15 * i as i64),
                open,
                high: close.max(open) + wick,
                low: close.min(open) - wick,
                close,
                volume,
            }
        })
        .collect()
}

fn candle_inputs() -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(
        (1.0f64..10_000.0, -50.0f64..50.0, 0.0f64..25.0, 0.0f64..1_000_000.0),
        0..200,
    )
}

proptest! {
    /// EMA never leaves the range spanned by its inputs.
    #[test]
    fn ema_is_bounded_by_input_range(
        series in prop::collection::vec(-1_000_000.0f64..1_000_000.0, 1..300),
        length in 1usize..100,
    ) {
        let lo = series.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let tol = 1e-6 * hi.abs().max(lo.abs()).max(1.0);
        for v in ema(&series, length) {
            prop_assert!(v.is_finite());
            prop_assert!(v >= lo - tol && v <= hi + tol, "{v} outside [{lo}, {hi}]");
        }
    }

    /// RSI is always within [0, 100] for finite input.
    #[test]
    fn rsi_stays_in_range(
        series in prop::collection::vec(-1_000_000.0f64..1_000_000.0, 1..300),
        length in 1usize..50,
    ) {
        let out = rsi(&series, length);
        prop_assert_eq!(out.len(), series.len());
        for v in out {
            prop_assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
        }
    }

    /// Any signal the detector emits is consistent with the rules that
    /// produced it, and brackets the entry on the correct sides.
    #[test]
    fn detector_signals_are_consistent(raw in candle_inputs()) {
        let candles = build_candles(&raw);
        let params = StrategyParams::default();
        let detector = BreakoutDetector::new(params.clone()).unwrap();

        if let Some(signal) = detector.detect("TEST/USDT", &candles) {
            let n = candles.len();
            let frame = IndicatorFrame::compute(&candles, &params);
            let row = frame.row(n - 2).unwrap();
            let (fast, slow, rsi) = (row.ema_fast.unwrap(), row.ema_slow.unwrap(), row.rsi.unwrap());

            prop_assert_eq!(signal.entry, candles[n - 2].close);
            match signal.direction {
                Direction::Long => {
                    prop_assert!(fast > slow && rsi >= params.rsi_long);
                    prop_assert!(signal.stop_loss < signal.entry);
                    prop_assert!(signal.take_profit > signal.entry);
                }
                Direction::Short => {
                    prop_assert!(fast < slow && rsi <= params.rsi_short);
                    prop_assert!(signal.stop_loss > signal.entry);
                    prop_assert!(signal.take_profit < signal.entry);
                }
            }
        }
    }
}

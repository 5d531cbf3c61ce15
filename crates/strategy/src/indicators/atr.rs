use common::Candle;

use super::ema::ema;

/// True range per candle. The first candle has no previous close, so its
/// range is simply `high − low`.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    candles
        .iter()
        .map(|c| {
            let range = c.high - c.low;
            let tr = match prev_close {
                None => range,
                Some(pc) => range.max((c.high - pc).abs()).max((c.low - pc).abs()),
            };
            prev_close = Some(c.close);
            tr
        })
        .collect()
}

/// Average True Range: span-based EMA of the true range.
pub fn atr(candles: &[Candle], length: usize) -> Vec<f64> {
    ema(&true_range(candles), length)
}

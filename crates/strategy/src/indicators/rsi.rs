use super::ema::smooth;

/// Denominator guard so a series with no down-moves yields RSI ≈ 100
/// instead of dividing by zero.
const EPSILON: f64 = 1e-9;

/// Neutral RSI used where no price change is available yet.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI (Relative Strength Index) with Wilder-style smoothing.
///
/// Up-moves and down-moves (as positive magnitudes) are smoothed separately
/// with α = 1/length, seeded at the first price change. Index 0 has no
/// change and is reported as 50, as is any non-finite result.
pub fn rsi(series: &[f64], length: usize) -> Vec<f64> {
    assert!(length >= 1, "RSI length must be >= 1");
    if series.is_empty() {
        return Vec::new();
    }

    let (ups, downs): (Vec<f64>, Vec<f64>) = series
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip();

    let alpha = 1.0 / length as f64;
    let avg_up = smooth(&ups, alpha);
    let avg_down = smooth(&downs, alpha);

    let mut out = Vec::with_capacity(series.len());
    out.push(NEUTRAL_RSI);
    out.extend(avg_up.iter().zip(&avg_down).map(|(&up, &down)| {
        let rs = up / (down + EPSILON);
        let value = 100.0 - 100.0 / (1.0 + rs);
        if value.is_finite() {
            value
        } else {
            NEUTRAL_RSI
        }
    }));
    out
}

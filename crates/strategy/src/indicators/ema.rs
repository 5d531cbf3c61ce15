/// Exponential moving average with span `length` (α = 2 / (length + 1)).
///
/// Recursive form seeded with the first value, no bias adjustment:
/// `ema[0] = x[0]`, `ema[i] = α·x[i] + (1 − α)·ema[i−1]`. Every output index
/// is defined; breakout thresholds depend on this exact smoothing.
pub fn ema(series: &[f64], length: usize) -> Vec<f64> {
    assert!(length >= 1, "EMA length must be >= 1");
    let alpha = 2.0 / (length as f64 + 1.0);
    smooth(series, alpha)
}

/// Recursive exponential smoothing with an explicit factor.
pub(crate) fn smooth(series: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;
    for &x in series {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

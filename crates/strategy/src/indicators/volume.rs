/// Trailing simple moving average over `window` values.
/// Undefined (`None`) until `window` values are available.
pub fn volume_sma(series: &[f64], window: usize) -> Vec<Option<f64>> {
    assert!(window >= 1, "volume SMA window must be >= 1");
    (0..series.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let slice = &series[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}

//! Small statistics helpers shared by the detector.

/// Linear-interpolated quantile with 1-based rank `q * (len - 1) + 1`.
///
/// Returns `None` for an empty slice.
pub fn quantile(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let len = sorted.len();
    let rank = q * (len - 1) as f64 + 1.0;
    if rank == 1.0 {
        Some(sorted[0])
    } else if rank == len as f64 {
        Some(sorted[len - 1])
    } else {
        let k = rank.floor() as usize;
        let d = rank - k as f64;
        Some(sorted[k - 1] + d * (sorted[k] - sorted[k - 1]))
    }
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance (divides by `len`); NaN for an empty slice.
pub fn variance(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|v| (v - m).powi(2)).sum::<f64>() / data.len() as f64
}

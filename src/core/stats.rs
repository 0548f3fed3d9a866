/// Median of a sample: sort ascending, middle element, averaging the two
/// middles for even lengths. An empty sample is 0, never NaN.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Arithmetic mean; 0 for an empty sample.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Division that yields 0 instead of NaN/Infinity on a zero denominator.
#[inline]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Months of supply: active inventory over the trailing-quarter monthly
/// absorption rate. The 90-day window is used instead of 30 days for
/// stability; 0 when nothing closed in the window.
pub fn months_of_supply(active_count: u64, closed_90d: u64) -> f64 {
    let monthly_absorption = closed_90d as f64 / 3.0;
    safe_div(active_count as f64, monthly_absorption)
}
